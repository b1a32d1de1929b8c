//! Events published to process subscribers.

use serde::{Deserialize, Serialize};
use wincopies_core::{ProcessErrorItem, ProcessStatus};

use crate::progress::ProcessProgress;

/// An event published by a process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ProcessEvent {
    /// The path collection has been enumerated into the queue.
    Loaded {
        item_count: usize,
        total_size: u64,
        skipped: usize,
    },
    /// Progress snapshot.
    Progress(ProcessProgress),
    /// An item failed and was queued for a decision.
    ItemFailed(ProcessErrorItem),
    /// The process changed status.
    StatusChanged(ProcessStatus),
}
