//! Directory identity tracking for symlink cycle detection.

use std::collections::HashSet;
use std::fs::Metadata;

/// Tracks visited directories by `(device, inode)`.
///
/// When symbolic links are followed, a link back to an ancestor would make
/// the walk revisit the same directory forever. Each directory is entered
/// at most once.
#[derive(Debug, Default)]
pub(crate) struct InodeTracker {
    seen: HashSet<(u64, u64)>,
}

impl InodeTracker {
    /// Track a directory. Returns `true` if this is the first visit.
    ///
    /// Platforms without inode numbers always report a first visit.
    pub fn track(&mut self, metadata: &Metadata) -> bool {
        match directory_key(metadata) {
            Some(key) => self.seen.insert(key),
            None => true,
        }
    }
}

#[cfg(unix)]
fn directory_key(metadata: &Metadata) -> Option<(u64, u64)> {
    use std::os::unix::fs::MetadataExt;
    Some((metadata.dev(), metadata.ino()))
}

#[cfg(not(unix))]
fn directory_key(_metadata: &Metadata) -> Option<(u64, u64)> {
    None // No stable inode numbers
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_track_same_directory_once() {
        let temp = tempfile::tempdir().unwrap();
        let mut tracker = InodeTracker::default();
        let metadata = std::fs::metadata(temp.path()).unwrap();

        assert!(tracker.track(&metadata));
        assert!(!tracker.track(&metadata));
    }

    #[test]
    fn test_distinct_directories() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::create_dir(temp.path().join("sub")).unwrap();
        let mut tracker = InodeTracker::default();

        assert!(tracker.track(&std::fs::metadata(temp.path()).unwrap()));
        assert!(tracker.track(&std::fs::metadata(temp.path().join("sub")).unwrap()));
    }
}
