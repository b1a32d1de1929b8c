//! Process configuration types.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::{EnumerationOrder, ErrorKind};

/// Default copy chunk size (64 KiB).
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Configuration for a file-operation process.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ProcessOptions {
    /// Enumeration order of the path collection.
    #[builder(default)]
    #[serde(default)]
    pub order: EnumerationOrder,

    /// Replace files that already exist at the destination.
    #[builder(default = "false")]
    #[serde(default)]
    pub overwrite: bool,

    /// Carry modification times over to copied files.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub preserve_timestamps: bool,

    /// Restrict bulk retry/ignore to items under the anchor's directory.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub match_path_prefix: bool,

    /// Error kinds dismissed automatically instead of queued.
    #[builder(default)]
    #[serde(default)]
    pub auto_ignore: Vec<ErrorKind>,

    /// Copy chunk size in bytes.
    #[builder(default = "DEFAULT_BUFFER_SIZE")]
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Descend into symbolic links to directories.
    #[builder(default = "false")]
    #[serde(default)]
    pub follow_symlinks: bool,
}

fn default_true() -> bool {
    true
}

fn default_buffer_size() -> usize {
    DEFAULT_BUFFER_SIZE
}

impl ProcessOptionsBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(0) = self.buffer_size {
            return Err("Buffer size must be greater than zero".to_string());
        }
        Ok(())
    }
}

impl ProcessOptions {
    /// Create a new options builder.
    pub fn builder() -> ProcessOptionsBuilder {
        ProcessOptionsBuilder::default()
    }

    /// Whether failures of this kind are dismissed without queuing.
    pub fn is_auto_ignored(&self, kind: ErrorKind) -> bool {
        self.auto_ignore.contains(&kind)
    }
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            order: EnumerationOrder::default(),
            overwrite: false,
            preserve_timestamps: true,
            match_path_prefix: true,
            auto_ignore: Vec::new(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            follow_symlinks: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_builder() {
        let options = ProcessOptions::builder()
            .overwrite(true)
            .buffer_size(4096usize)
            .auto_ignore(vec![ErrorKind::AlreadyExists])
            .build()
            .unwrap();

        assert!(options.overwrite);
        assert_eq!(options.buffer_size, 4096);
        assert!(options.is_auto_ignored(ErrorKind::AlreadyExists));
        assert!(!options.is_auto_ignored(ErrorKind::DiskFull));
        assert!(options.preserve_timestamps);
    }

    #[test]
    fn test_builder_rejects_zero_buffer() {
        let result = ProcessOptions::builder().buffer_size(0usize).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_defaults_match_default() {
        let built = ProcessOptions::builder().build().unwrap();
        assert_eq!(built, ProcessOptions::default());
    }
}
