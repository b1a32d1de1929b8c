//! Path collection and enumeration for wincopies.
//!
//! This crate turns a user selection (a base directory plus the entries
//! selected in it) into the lazy stream of [`ProcessPath`]s a process works
//! through.
//!
//! # Overview
//!
//! - **Single-pass enumeration** via [`PathEnumerator`], with files of a scan
//!   pass yielded before its subdirectories in
//!   [`EnumerationOrder::FilesThenDirectories`] mode
//! - **Best-effort traversal**: unreadable entries are skipped and reported
//!   as [`ScanWarning`]s instead of aborting
//! - **Size estimation** via a parallel jwalk traversal
//!
//! # Example
//!
//! ```rust,no_run
//! use wincopies_scan::{EnumerationOrder, PathCollection};
//!
//! let collection = PathCollection::from_sources(["/data/photos", "/data/notes.txt"]).unwrap();
//!
//! for path in collection.enumerate(EnumerationOrder::FilesThenDirectories, true) {
//!     println!("{} ({:?} bytes)", path.relative.display(), path.size);
//! }
//! ```

mod collection;
mod enumerator;
mod inode;
mod size;
mod warning;

pub use collection::PathCollection;
pub use enumerator::PathEnumerator;
pub use size::SizeEstimate;
pub use warning::{ScanWarning, WarningKind};

// Re-export core types for convenience
pub use wincopies_core::{EnumerationOrder, ProcessError, ProcessPath};
