//! Process engine for wincopies.
//!
//! This crate provides cancelable, pausable, resumable file processes (copy,
//! delete, recycle) over a path collection, with a queue of failed items the
//! caller can retry or ignore, and progress reporting via a broadcast channel.

mod action;
mod copy;
mod delete;
mod event;
mod process;
mod progress;
mod queue;
mod worker;

pub use action::{ActionError, ProcessAction, ProcessKind};
pub use copy::CopyAction;
pub use delete::{DeleteAction, RecycleAction};
pub use event::ProcessEvent;
pub use process::Process;
pub use progress::ProcessProgress;
pub use queue::{DrainMatching, ErrorAnchor, Iter, ProcessQueue, QueueItem};
pub use worker::WORKER_THREAD_NAME;

/// Capacity of the process event channel. Slow subscribers lag behind.
pub const PROCESS_EVENT_CAPACITY: usize = 1024;
