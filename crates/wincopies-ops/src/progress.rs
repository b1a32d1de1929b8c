//! Progress aggregation for processes.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use wincopies_core::ProcessPath;

/// Aggregated progress of a process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessProgress {
    /// Bytes discovered across all items.
    pub initial_total_size: u64,
    /// Number of items discovered.
    pub initial_item_count: usize,
    /// Bytes not yet processed, failed items included.
    pub actual_remaining_size: u64,
    /// Items not yet processed, failed items included.
    pub remaining_item_count: usize,
    /// Bytes processed (or dismissed).
    pub processed_size: u64,
    /// Items processed successfully.
    pub processed_item_count: usize,
    /// Items dismissed by an ignore decision.
    pub ignored_item_count: usize,
    /// The item being processed.
    pub current_path: Option<PathBuf>,
    /// Progress of the current item (0-100).
    pub current_path_percentage: u8,
    /// Time spent running.
    pub elapsed: Duration,
}

impl ProcessProgress {
    /// Create an empty progress record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for a newly discovered item.
    pub fn discover(&mut self, path: &ProcessPath) {
        self.initial_item_count += 1;
        self.remaining_item_count += 1;
        self.discover_size(path.accounted_size());
    }

    /// Account for bytes learnt after the item was discovered.
    pub fn discover_size(&mut self, bytes: u64) {
        self.initial_total_size += bytes;
        self.actual_remaining_size += bytes;
    }

    /// Make `path` the current item.
    pub fn begin_item(&mut self, path: &Path) {
        self.current_path = Some(path.to_path_buf());
        self.current_path_percentage = 0;
    }

    /// Update the current item's percentage, clamped to 100.
    pub fn set_current_percentage(&mut self, percentage: u8) {
        self.current_path_percentage = percentage.min(100);
    }

    /// Clear the current item.
    pub fn end_item(&mut self) {
        self.current_path = None;
        self.current_path_percentage = 0;
    }

    /// Move a successfully processed item out of the remaining totals.
    pub fn complete_item(&mut self, path: &ProcessPath) {
        self.retire(path);
        self.processed_item_count += 1;
    }

    /// Move an ignored item out of the remaining totals.
    pub fn dismiss_item(&mut self, path: &ProcessPath) {
        self.retire(path);
        self.ignored_item_count += 1;
    }

    fn retire(&mut self, path: &ProcessPath) {
        let bytes = path.accounted_size();
        self.actual_remaining_size = self.actual_remaining_size.saturating_sub(bytes);
        self.remaining_item_count = self.remaining_item_count.saturating_sub(1);
        self.processed_size += bytes;
    }

    /// Overall percentage (0-100).
    ///
    /// Computed from bytes when any were discovered, from item counts
    /// otherwise.
    pub fn percentage(&self) -> u8 {
        let (total, remaining) = if self.initial_total_size > 0 {
            (self.initial_total_size, self.actual_remaining_size)
        } else {
            (
                self.initial_item_count as u64,
                self.remaining_item_count as u64,
            )
        };

        if total == 0 {
            return 0;
        }

        let done = total.saturating_sub(remaining) as u128;
        (done * 100 / total as u128).min(100) as u8
    }

    /// Whether every discovered item has been retired.
    pub fn is_finished(&self) -> bool {
        self.initial_item_count > 0 && self.remaining_item_count == 0
    }

    /// Throughput in bytes per second.
    pub fn bytes_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.processed_size as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }
}

/// Progress record with run-time accounting across pauses.
#[derive(Debug, Default)]
pub(crate) struct ProgressTracker {
    progress: ProcessProgress,
    running_since: Option<Instant>,
    accumulated: Duration,
}

impl ProgressTracker {
    /// Start counting run time.
    pub fn resume(&mut self) {
        if self.running_since.is_none() {
            self.running_since = Some(Instant::now());
        }
    }

    /// Stop counting run time.
    pub fn suspend(&mut self) {
        if let Some(since) = self.running_since.take() {
            self.accumulated += since.elapsed();
        }
        self.progress.end_item();
    }

    pub fn get(&self) -> &ProcessProgress {
        &self.progress
    }

    pub fn get_mut(&mut self) -> &mut ProcessProgress {
        &mut self.progress
    }

    pub fn snapshot(&self) -> ProcessProgress {
        let mut snapshot = self.progress.clone();
        snapshot.elapsed = self.accumulated
            + self
                .running_since
                .map(|since| since.elapsed())
                .unwrap_or_default();
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, size: u64) -> ProcessPath {
        ProcessPath::file(format!("/src/{name}"), name, size)
    }

    #[test]
    fn test_percentage_by_bytes() {
        let mut progress = ProcessProgress::new();
        let items = [file("a", 10), file("b", 20), file("c", 30)];
        for item in &items {
            progress.discover(item);
        }
        assert_eq!(progress.percentage(), 0);

        progress.complete_item(&items[0]);
        progress.complete_item(&items[2]);
        assert_eq!(progress.actual_remaining_size, 20);
        assert_eq!(progress.percentage(), 66);

        progress.dismiss_item(&items[1]);
        assert_eq!(progress.percentage(), 100);
        assert!(progress.is_finished());
        assert_eq!(progress.processed_item_count, 2);
        assert_eq!(progress.ignored_item_count, 1);
    }

    #[test]
    fn test_percentage_by_count_without_bytes() {
        let mut progress = ProcessProgress::new();
        let dirs = [
            ProcessPath::directory("/src/a", "a"),
            ProcessPath::directory("/src/b", "b"),
        ];
        for dir in &dirs {
            progress.discover(dir);
        }
        progress.complete_item(&dirs[0]);
        assert_eq!(progress.percentage(), 50);
    }

    #[test]
    fn test_empty_progress_is_zero() {
        assert_eq!(ProcessProgress::new().percentage(), 0);
        assert!(!ProcessProgress::new().is_finished());
    }

    #[test]
    fn test_current_item_resets() {
        let mut progress = ProcessProgress::new();
        progress.begin_item(Path::new("/src/a"));
        progress.set_current_percentage(250);
        assert_eq!(progress.current_path_percentage, 100);

        progress.begin_item(Path::new("/src/b"));
        assert_eq!(progress.current_path_percentage, 0);
        assert_eq!(progress.current_path.as_deref(), Some(Path::new("/src/b")));
    }

    #[test]
    fn test_tracker_accumulates_run_time() {
        let mut tracker = ProgressTracker::default();
        assert_eq!(tracker.snapshot().elapsed, Duration::ZERO);

        tracker.resume();
        std::thread::sleep(Duration::from_millis(5));
        tracker.suspend();
        let first = tracker.snapshot().elapsed;
        assert!(first >= Duration::from_millis(5));

        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(tracker.snapshot().elapsed, first);
    }
}
