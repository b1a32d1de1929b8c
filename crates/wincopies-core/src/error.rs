//! Error types for process operations.

use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use thiserror::Error;

use crate::ProcessStatus;

/// Contract violations raised directly to the caller.
///
/// Per-item I/O failures never surface as a `ProcessError`; they are queued
/// as [`ProcessErrorItem`](crate::ProcessErrorItem)s instead.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The operation is not valid in the current status.
    #[error("Cannot {operation} a process that is {status}")]
    InvalidState {
        operation: &'static str,
        status: ProcessStatus,
    },

    /// The path collection has no base path.
    #[error("Path collection is empty")]
    EmptySource,

    /// Sources do not share one parent directory.
    #[error("Source does not share the common parent directory: {path}")]
    MixedParents { path: PathBuf },

    /// Copy destination lies inside one of its sources.
    #[error("Cannot copy {origin} into itself ({destination})")]
    DestinationInsideSource {
        origin: PathBuf,
        destination: PathBuf,
    },

    /// Retry/ignore was requested with an empty error queue.
    #[error("No errors to resolve")]
    NothingToResolve,

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The worker thread could not be spawned.
    #[error("Failed to spawn worker thread: {0}")]
    WorkerSpawn(#[source] io::Error),

    /// The worker thread panicked.
    #[error("Worker thread panicked")]
    WorkerPanicked,
}

impl ProcessError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }

    /// Create an invalid state error.
    pub fn invalid_state(operation: &'static str, status: ProcessStatus) -> Self {
        Self::InvalidState { operation, status }
    }
}

/// Which side of an I/O action failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoPhase {
    /// Reading the source.
    Read,
    /// Writing or removing the target.
    Write,
}

/// Classification of a per-item processing failure.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ErrorKind {
    /// Unclassified failure.
    #[default]
    Unknown,
    /// The source could not be read.
    ReadProtection,
    /// The target could not be written or removed.
    WriteProtection,
    /// A path exceeded the platform limit.
    PathTooLong,
    /// The target volume is full.
    DiskFull,
    /// The path does not exist.
    NotFound,
    /// The target already exists.
    AlreadyExists,
    /// The action was interrupted at the user's request.
    CancelledByUser,
}

#[cfg(target_os = "linux")]
mod os {
    pub const DISK_FULL: &[i32] = &[28, 122];
    pub const PATH_TOO_LONG: &[i32] = &[36];
}

#[cfg(all(unix, not(target_os = "linux")))]
mod os {
    pub const DISK_FULL: &[i32] = &[28, 69];
    pub const PATH_TOO_LONG: &[i32] = &[63];
}

#[cfg(windows)]
mod os {
    pub const DISK_FULL: &[i32] = &[39, 112];
    pub const PATH_TOO_LONG: &[i32] = &[206];
}

#[cfg(not(any(unix, windows)))]
mod os {
    pub const DISK_FULL: &[i32] = &[];
    pub const PATH_TOO_LONG: &[i32] = &[];
}

impl ErrorKind {
    /// Classify an I/O error raised during the given phase.
    pub fn classify(error: &io::Error, phase: IoPhase) -> Self {
        if let Some(code) = error.raw_os_error() {
            if os::DISK_FULL.contains(&code) {
                return Self::DiskFull;
            }
            if os::PATH_TOO_LONG.contains(&code) {
                return Self::PathTooLong;
            }
        }

        match error.kind() {
            io::ErrorKind::PermissionDenied | io::ErrorKind::ReadOnlyFilesystem => match phase {
                IoPhase::Read => Self::ReadProtection,
                IoPhase::Write => Self::WriteProtection,
            },
            io::ErrorKind::StorageFull => Self::DiskFull,
            io::ErrorKind::NotFound => Self::NotFound,
            io::ErrorKind::AlreadyExists => Self::AlreadyExists,
            io::ErrorKind::Interrupted => Self::CancelledByUser,
            _ => Self::Unknown,
        }
    }

    /// Human-readable description.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Unknown => "Unknown error",
            Self::ReadProtection => "Source is read-protected",
            Self::WriteProtection => "Target is write-protected",
            Self::PathTooLong => "Path is too long",
            Self::DiskFull => "Not enough space on the target disk",
            Self::NotFound => "Path not found",
            Self::AlreadyExists => "Target already exists",
            Self::CancelledByUser => "Cancelled by user",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_error_io() {
        let err = ProcessError::io(
            "/test/path",
            io::Error::new(io::ErrorKind::NotFound, "missing"),
        );
        assert!(matches!(err, ProcessError::NotFound { .. }));
    }

    #[test]
    fn test_classify_by_phase() {
        let denied = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        assert_eq!(
            ErrorKind::classify(&denied, IoPhase::Read),
            ErrorKind::ReadProtection
        );
        assert_eq!(
            ErrorKind::classify(&denied, IoPhase::Write),
            ErrorKind::WriteProtection
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_classify_raw_os_codes() {
        let full = io::Error::from_raw_os_error(28);
        assert_eq!(ErrorKind::classify(&full, IoPhase::Write), ErrorKind::DiskFull);
    }

    #[test]
    fn test_error_kind_parse() {
        let kind: ErrorKind = "read-protection".parse().unwrap();
        assert_eq!(kind, ErrorKind::ReadProtection);
        assert_eq!(ErrorKind::DiskFull.to_string(), "disk-full");
    }
}
