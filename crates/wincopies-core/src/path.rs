//! Enumerated path types.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Order in which a path collection is enumerated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnumerationOrder {
    /// Pre-order, in the order the file system returns entries.
    None,
    /// Files of a scan pass first, then its subdirectories.
    #[default]
    FilesThenDirectories,
}

/// A path produced by enumeration, ready to be processed.
///
/// Immutable once enumerated. Directories never carry a size: their bytes
/// are accounted for by the files enumerated beneath them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessPath {
    /// Rooted path used for I/O.
    pub path: PathBuf,
    /// Path relative to the collection base.
    pub relative: PathBuf,
    /// Whether this entry is a directory.
    pub is_directory: bool,
    /// Whether this entry is a symbolic link processed as the link itself.
    #[serde(default)]
    pub is_symlink: bool,
    /// File size in bytes, if known.
    pub size: Option<u64>,
}

impl ProcessPath {
    /// Create a file entry.
    pub fn file(path: impl Into<PathBuf>, relative: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            path: path.into(),
            relative: relative.into(),
            is_directory: false,
            is_symlink: false,
            size: Some(size),
        }
    }

    /// Create a directory entry.
    pub fn directory(path: impl Into<PathBuf>, relative: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            relative: relative.into(),
            is_directory: true,
            is_symlink: false,
            size: None,
        }
    }

    /// Create an entry whose metadata could not be read.
    pub fn unknown(path: impl Into<PathBuf>, relative: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            relative: relative.into(),
            is_directory: false,
            is_symlink: false,
            size: None,
        }
    }

    /// Create a symbolic link entry. The link is never traversed.
    pub fn symlink(path: impl Into<PathBuf>, relative: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            relative: relative.into(),
            is_directory: false,
            is_symlink: true,
            size: None,
        }
    }

    /// Bytes this entry contributes to queue and progress totals.
    ///
    /// Always zero for directories.
    pub fn accounted_size(&self) -> u64 {
        if self.is_directory {
            0
        } else {
            self.size.unwrap_or(0)
        }
    }

    /// Get the rooted path.
    pub fn as_path(&self) -> &Path {
        &self.path
    }

    /// Directory that bulk resolutions anchored on this entry apply to.
    pub fn anchor_dir(&self) -> &Path {
        if self.is_directory {
            &self.path
        } else {
            self.path.parent().unwrap_or(&self.path)
        }
    }
}

impl std::fmt::Display for ProcessPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path.display())
    }
}
