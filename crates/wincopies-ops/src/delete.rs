//! Permanent deletion and recycle-bin actions.

use std::fs;

use wincopies_core::{ErrorKind, IoPhase, ProcessPath};

use crate::action::{ActionError, ProcessAction, ProcessKind};

/// Permanently removes each item.
///
/// Directories are removed with `remove_dir`, so they must already be empty;
/// delete processes queue a directory's contents ahead of it.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeleteAction;

impl ProcessAction for DeleteAction {
    fn kind(&self) -> ProcessKind {
        ProcessKind::Delete
    }

    fn act(&self, item: &ProcessPath, report: &mut dyn FnMut(u8)) -> Result<(), ActionError> {
        if item.is_symlink {
            remove_symlink(&item.path)
                .map_err(ActionError::io_with(IoPhase::Write, "Failed to remove link"))?;
        } else if item.is_directory {
            fs::remove_dir(&item.path)
                .map_err(ActionError::io_with(IoPhase::Write, "Failed to remove directory"))?;
        } else {
            fs::remove_file(&item.path)
                .map_err(ActionError::io_with(IoPhase::Write, "Failed to remove file"))?;
        }
        report(100);
        Ok(())
    }
}

/// Remove the link itself, never what it points at.
#[cfg(windows)]
fn remove_symlink(path: &std::path::Path) -> std::io::Result<()> {
    // Directory links are removed like directories.
    fs::remove_file(path).or_else(|_| fs::remove_dir(path))
}

/// Remove the link itself, never what it points at.
#[cfg(not(windows))]
fn remove_symlink(path: &std::path::Path) -> std::io::Result<()> {
    fs::remove_file(path)
}

/// Moves each selected item to the platform trash.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecycleAction;

impl ProcessAction for RecycleAction {
    fn kind(&self) -> ProcessKind {
        ProcessKind::Recycle
    }

    fn act(&self, item: &ProcessPath, report: &mut dyn FnMut(u8)) -> Result<(), ActionError> {
        fs::symlink_metadata(&item.path)
            .map_err(ActionError::io_with(IoPhase::Read, "Cannot recycle"))?;

        trash::delete(&item.path).map_err(|e| {
            ActionError::new(ErrorKind::Unknown, format!("Failed to move to trash: {e}"))
        })?;
        report(100);
        Ok(())
    }
}
