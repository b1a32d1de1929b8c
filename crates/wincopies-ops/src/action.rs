//! Per-item actions performed by a process.

use std::io;

use serde::{Deserialize, Serialize};
use strum::Display;
use thiserror::Error;
use wincopies_core::{ErrorKind, IoPhase, ProcessPath};
use wincopies_scan::PathCollection;

/// The kind of file operation a process performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum ProcessKind {
    Copy,
    Delete,
    Recycle,
}

impl ProcessKind {
    /// Whether the selection is expanded into its contents.
    pub fn is_recursive(&self) -> bool {
        matches!(self, Self::Copy | Self::Delete)
    }

    /// Whether items are queued in reverse enumeration order.
    ///
    /// Deletion must remove a directory's contents before the directory.
    pub fn reverses_order(&self) -> bool {
        matches!(self, Self::Delete)
    }

    /// Past-tense verb for summaries.
    pub fn past_tense(&self) -> &'static str {
        match self {
            Self::Copy => "Copied",
            Self::Delete => "Deleted",
            Self::Recycle => "Recycled",
        }
    }
}

/// A failure of one action on one item.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ActionError {
    /// Classified failure.
    pub kind: ErrorKind,
    /// Human-readable message.
    pub message: String,
}

impl ActionError {
    /// Create a new action error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Classify an I/O error raised during the given phase.
    pub fn from_io(error: &io::Error, phase: IoPhase) -> Self {
        Self::new(ErrorKind::classify(error, phase), error.to_string())
    }

    /// Build a mapper for `map_err` with a message prefix.
    pub(crate) fn io_with(
        phase: IoPhase,
        context: &'static str,
    ) -> impl Fn(io::Error) -> ActionError {
        move |e| Self::new(ErrorKind::classify(&e, phase), format!("{context}: {e}"))
    }
}

/// An action applied to each item of a process.
///
/// Implementations run on the worker thread and must not panic on I/O
/// failures: every failure is reported as an [`ActionError`] and queued.
pub trait ProcessAction: Send + Sync {
    /// The kind of operation.
    fn kind(&self) -> ProcessKind;

    /// One-time setup before the first item is processed.
    fn prepare(&self, _collection: &PathCollection) -> Result<(), ActionError> {
        Ok(())
    }

    /// Process one item, reporting its percentage through `report`.
    fn act(&self, item: &ProcessPath, report: &mut dyn FnMut(u8)) -> Result<(), ActionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_traversal() {
        assert!(ProcessKind::Copy.is_recursive());
        assert!(ProcessKind::Delete.is_recursive());
        assert!(!ProcessKind::Recycle.is_recursive());
        assert!(ProcessKind::Delete.reverses_order());
        assert!(!ProcessKind::Copy.reverses_order());
    }

    #[test]
    fn test_action_error_from_io() {
        let err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let action_error = ActionError::from_io(&err, IoPhase::Write);
        assert_eq!(action_error.kind, ErrorKind::WriteProtection);
        assert_eq!(action_error.to_string(), "write-protection: denied");
    }
}
