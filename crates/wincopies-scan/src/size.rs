//! Pre-flight size estimation.

use std::fs;
use std::path::{Path, PathBuf};

use jwalk::WalkDir;
use serde::{Deserialize, Serialize};

/// Item and byte counts under a set of roots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeEstimate {
    /// Number of files.
    pub files: u64,
    /// Number of directories, roots included.
    pub directories: u64,
    /// Total file bytes.
    pub bytes: u64,
    /// Entries that could not be read.
    pub skipped: u64,
}

impl SizeEstimate {
    /// Total number of items (files + directories).
    pub fn items(&self) -> u64 {
        self.files + self.directories
    }
}

/// Walk the roots in parallel and count what lies beneath.
pub(crate) fn estimate(roots: &[PathBuf], follow_symlinks: bool) -> SizeEstimate {
    let mut total = SizeEstimate::default();

    for root in roots {
        let metadata = if follow_symlinks {
            fs::metadata(root)
        } else {
            fs::symlink_metadata(root)
        };

        match metadata {
            Ok(m) if m.is_dir() => walk_directory(root, follow_symlinks, &mut total),
            // Links are processed as links, which carry no bytes.
            Ok(m) if m.file_type().is_symlink() => total.files += 1,
            Ok(m) => {
                total.files += 1;
                total.bytes += m.len();
            }
            Err(err) => {
                tracing::debug!(path = %root.display(), error = %err, "cannot size root");
                total.skipped += 1;
            }
        }
    }

    total
}

fn walk_directory(root: &Path, follow_symlinks: bool, total: &mut SizeEstimate) {
    let walker = WalkDir::new(root)
        .skip_hidden(false)
        .follow_links(follow_symlinks)
        .min_depth(0);

    for entry_result in walker {
        let entry = match entry_result {
            Ok(e) => e,
            Err(_) => {
                total.skipped += 1;
                continue;
            }
        };

        if entry.file_type().is_dir() {
            total.directories += 1;
            continue;
        }
        if entry.file_type().is_symlink() {
            total.files += 1;
            continue;
        }

        match entry.metadata() {
            Ok(metadata) => {
                total.files += 1;
                total.bytes += metadata.len();
            }
            Err(_) => total.skipped += 1,
        }
    }
}
