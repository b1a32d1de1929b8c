//! Error queue items.

use serde::{Deserialize, Serialize};

use crate::{ErrorKind, ProcessPath};

/// Operator decision recorded on an error item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingAction {
    /// No decision yet.
    #[default]
    None,
    /// Process the item again.
    Retry,
    /// Drop the item.
    Ignore,
    /// Drop the item and every queued item failing the same way.
    IgnoreAll,
}

/// A path that failed, with the classified failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessErrorItem {
    /// The path that failed.
    pub path: ProcessPath,
    /// Classified failure.
    pub kind: ErrorKind,
    /// Human-readable error message.
    pub message: String,
    /// Decision to apply when the process resumes.
    pub pending_action: PendingAction,
}

impl ProcessErrorItem {
    /// Create a new error item with no pending decision.
    pub fn new(path: ProcessPath, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            path,
            kind,
            message: message.into(),
            pending_action: PendingAction::None,
        }
    }
}

impl std::fmt::Display for ProcessErrorItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} ({})", self.path, self.kind.description(), self.message)
    }
}
