//! Core types for wincopies.
//!
//! This crate provides the data model shared by the scanner and the process
//! engine: enumerated paths, error classification, error queue items and
//! process configuration.

mod config;
mod error;
mod item;
mod path;
mod status;

pub use config::{ProcessOptions, ProcessOptionsBuilder, DEFAULT_BUFFER_SIZE};
pub use error::{ErrorKind, IoPhase, ProcessError};
pub use item::{PendingAction, ProcessErrorItem};
pub use path::{EnumerationOrder, ProcessPath};
pub use status::ProcessStatus;
