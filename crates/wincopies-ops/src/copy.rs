//! Chunked copy action with per-item progress.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use wincopies_core::{ErrorKind, IoPhase, ProcessOptions, ProcessPath};
use wincopies_scan::PathCollection;

use crate::action::{ActionError, ProcessAction, ProcessKind};

/// Copies each item to the same relative location under a destination.
#[derive(Debug, Clone)]
pub struct CopyAction {
    destination: PathBuf,
    overwrite: bool,
    preserve_timestamps: bool,
    buffer_size: usize,
}

impl CopyAction {
    /// Create a copy action targeting `destination`.
    pub fn new(destination: impl Into<PathBuf>, options: &ProcessOptions) -> Self {
        Self {
            destination: destination.into(),
            overwrite: options.overwrite,
            preserve_timestamps: options.preserve_timestamps,
            buffer_size: options.buffer_size.max(1),
        }
    }

    /// The destination directory.
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Where an item lands.
    pub fn target_of(&self, item: &ProcessPath) -> PathBuf {
        self.destination.join(&item.relative)
    }

    fn copy_file(
        &self,
        source: &Path,
        target: &Path,
        report: &mut dyn FnMut(u8),
    ) -> Result<(), ActionError> {
        if !self.overwrite && fs::symlink_metadata(target).is_ok() {
            return Err(ActionError::new(
                ErrorKind::AlreadyExists,
                format!("{} already exists", target.display()),
            ));
        }

        let mut reader =
            File::open(source).map_err(ActionError::io_with(IoPhase::Read, "Failed to open"))?;
        let metadata = reader
            .metadata()
            .map_err(ActionError::io_with(IoPhase::Read, "Failed to read metadata"))?;
        let mut writer =
            File::create(target).map_err(ActionError::io_with(IoPhase::Write, "Failed to create"))?;

        let result = self.copy_contents(&mut reader, &mut writer, metadata.len(), report);
        let result = result.and_then(|()| {
            writer
                .set_permissions(metadata.permissions())
                .map_err(ActionError::io_with(IoPhase::Write, "Failed to set permissions"))?;
            if self.preserve_timestamps {
                if let Ok(modified) = metadata.modified() {
                    writer
                        .set_modified(modified)
                        .map_err(ActionError::io_with(IoPhase::Write, "Failed to set times"))?;
                }
            }
            Ok(())
        });

        if result.is_err() {
            // Partial targets would turn a retry into AlreadyExists.
            drop(writer);
            let _ = fs::remove_file(target);
        }
        result
    }

    /// Recreate a symbolic link pointing where the source link points.
    fn copy_symlink(&self, source: &Path, target: &Path) -> Result<(), ActionError> {
        if fs::symlink_metadata(target).is_ok() {
            if !self.overwrite {
                return Err(ActionError::new(
                    ErrorKind::AlreadyExists,
                    format!("{} already exists", target.display()),
                ));
            }
            fs::remove_file(target)
                .map_err(ActionError::io_with(IoPhase::Write, "Failed to replace"))?;
        }

        let link_target = fs::read_link(source)
            .map_err(ActionError::io_with(IoPhase::Read, "Failed to read link"))?;
        create_symlink(&link_target, target, source)
            .map_err(ActionError::io_with(IoPhase::Write, "Failed to create link"))
    }

    fn copy_contents(
        &self,
        reader: &mut File,
        writer: &mut File,
        total: u64,
        report: &mut dyn FnMut(u8),
    ) -> Result<(), ActionError> {
        let mut buffer = vec![0u8; self.buffer_size];
        let mut copied = 0u64;
        let mut last_reported = 0u8;

        loop {
            let read = reader
                .read(&mut buffer)
                .map_err(ActionError::io_with(IoPhase::Read, "Failed to read"))?;
            if read == 0 {
                break;
            }
            writer
                .write_all(&buffer[..read])
                .map_err(ActionError::io_with(IoPhase::Write, "Failed to write"))?;

            copied += read as u64;
            let percentage = if total > 0 {
                (copied.min(total) * 100 / total) as u8
            } else {
                100
            };
            if percentage != last_reported {
                last_reported = percentage;
                report(percentage);
            }
        }

        writer
            .flush()
            .map_err(ActionError::io_with(IoPhase::Write, "Failed to flush"))?;
        if last_reported != 100 {
            report(100);
        }
        Ok(())
    }
}

impl ProcessAction for CopyAction {
    fn kind(&self) -> ProcessKind {
        ProcessKind::Copy
    }

    fn prepare(&self, _collection: &PathCollection) -> Result<(), ActionError> {
        fs::create_dir_all(&self.destination).map_err(|e| {
            ActionError::new(
                ErrorKind::classify(&e, IoPhase::Write),
                format!("Failed to create destination {}: {e}", self.destination.display()),
            )
        })
    }

    fn act(&self, item: &ProcessPath, report: &mut dyn FnMut(u8)) -> Result<(), ActionError> {
        let target = self.target_of(item);

        if item.is_symlink {
            self.copy_symlink(&item.path, &target)?;
            report(100);
            return Ok(());
        }

        if item.is_directory {
            fs::create_dir_all(&target)
                .map_err(ActionError::io_with(IoPhase::Write, "Failed to create directory"))?;
            report(100);
            return Ok(());
        }

        self.copy_file(&item.path, &target, report)
    }
}

#[cfg(unix)]
fn create_symlink(link_target: &Path, link: &Path, _source: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(link_target, link)
}

#[cfg(windows)]
fn create_symlink(link_target: &Path, link: &Path, source: &Path) -> io::Result<()> {
    // Windows links are typed after what they point at.
    if fs::metadata(source).is_ok_and(|m| m.is_dir()) {
        std::os::windows::fs::symlink_dir(link_target, link)
    } else {
        std::os::windows::fs::symlink_file(link_target, link)
    }
}

#[cfg(not(any(unix, windows)))]
fn create_symlink(_link_target: &Path, link: &Path, _source: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        format!("symbolic links are not supported: {}", link.display()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> ProcessOptions {
        ProcessOptions::builder().buffer_size(4usize).build().unwrap()
    }

    #[test]
    fn test_copy_file_reports_progress() {
        let temp = tempfile::tempdir().unwrap();
        let source = temp.path().join("a.txt");
        fs::write(&source, b"0123456789").unwrap();

        let action = CopyAction::new(temp.path().join("out"), &options());
        action.prepare(&PathCollection::new(temp.path())).unwrap();

        let mut reports = Vec::new();
        let item = ProcessPath::file(&source, "a.txt", 10);
        action.act(&item, &mut |p| reports.push(p)).unwrap();

        assert_eq!(fs::read(temp.path().join("out/a.txt")).unwrap(), b"0123456789");
        assert_eq!(reports, vec![40, 80, 100]);
    }

    #[test]
    fn test_existing_target_without_overwrite() {
        let temp = tempfile::tempdir().unwrap();
        let source = temp.path().join("a.txt");
        fs::write(&source, b"new").unwrap();
        fs::create_dir(temp.path().join("out")).unwrap();
        fs::write(temp.path().join("out/a.txt"), b"old").unwrap();

        let action = CopyAction::new(temp.path().join("out"), &options());
        let item = ProcessPath::file(&source, "a.txt", 3);
        let err = action.act(&item, &mut |_| {}).unwrap_err();

        assert_eq!(err.kind, ErrorKind::AlreadyExists);
        assert_eq!(fs::read(temp.path().join("out/a.txt")).unwrap(), b"old");
    }

    #[test]
    fn test_overwrite_replaces_target() {
        let temp = tempfile::tempdir().unwrap();
        let source = temp.path().join("a.txt");
        fs::write(&source, b"new").unwrap();
        fs::create_dir(temp.path().join("out")).unwrap();
        fs::write(temp.path().join("out/a.txt"), b"older").unwrap();

        let options = ProcessOptions::builder().overwrite(true).build().unwrap();
        let action = CopyAction::new(temp.path().join("out"), &options);
        let item = ProcessPath::file(&source, "a.txt", 3);
        action.act(&item, &mut |_| {}).unwrap();

        assert_eq!(fs::read(temp.path().join("out/a.txt")).unwrap(), b"new");
    }

    #[test]
    fn test_missing_source_is_not_found() {
        let temp = tempfile::tempdir().unwrap();
        let action = CopyAction::new(temp.path().join("out"), &options());
        action.prepare(&PathCollection::new(temp.path())).unwrap();

        let item = ProcessPath::unknown(temp.path().join("gone"), "gone");
        let err = action.act(&item, &mut |_| {}).unwrap_err();

        assert_eq!(err.kind, ErrorKind::NotFound);
        assert!(!temp.path().join("out/gone").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_is_recreated_not_followed() {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir(temp.path().join("real")).unwrap();
        let link = temp.path().join("link");
        std::os::unix::fs::symlink("real", &link).unwrap();

        let action = CopyAction::new(temp.path().join("out"), &options());
        action.prepare(&PathCollection::new(temp.path())).unwrap();

        let mut reports = Vec::new();
        let item = ProcessPath::symlink(&link, "link");
        action.act(&item, &mut |p| reports.push(p)).unwrap();

        let copied = temp.path().join("out/link");
        assert!(fs::symlink_metadata(&copied).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_link(&copied).unwrap(), Path::new("real"));
        assert_eq!(reports, vec![100]);

        let err = action.act(&item, &mut |_| {}).unwrap_err();
        assert_eq!(err.kind, ErrorKind::AlreadyExists);
    }
}
