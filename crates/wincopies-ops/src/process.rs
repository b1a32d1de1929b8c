//! The process state machine.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

use tokio::sync::broadcast;
use wincopies_core::{
    PendingAction, ProcessError, ProcessErrorItem, ProcessOptions, ProcessPath, ProcessStatus,
};
use wincopies_scan::{PathCollection, ScanWarning};

use crate::action::{ProcessAction, ProcessKind};
use crate::copy::CopyAction;
use crate::delete::{DeleteAction, RecycleAction};
use crate::event::ProcessEvent;
use crate::progress::{ProcessProgress, ProgressTracker};
use crate::queue::{ErrorAnchor, ProcessQueue};
use crate::{worker, PROCESS_EVENT_CAPACITY};

/// Mutable process state, guarded by [`Shared::lock`].
#[derive(Default)]
pub(crate) struct ProcessState {
    pub paths: ProcessQueue<ProcessPath>,
    pub errors: ProcessQueue<ProcessErrorItem>,
    pub tracker: ProgressTracker,
    pub loaded: bool,
    pub warnings: Vec<ScanWarning>,
}

impl ProcessState {
    /// Status to settle on once the worker is not running.
    fn settled_status(&self) -> ProcessStatus {
        if !self.paths.is_empty() {
            ProcessStatus::Paused
        } else if self.errors.is_empty() {
            ProcessStatus::Completed
        } else {
            ProcessStatus::Erred
        }
    }

    fn dismiss(&mut self, item: &ProcessErrorItem) {
        self.tracker.get_mut().dismiss_item(&item.path);
    }

    /// Put failed items back at the head of the work queue, in order.
    fn requeue(&mut self, items: Vec<ProcessPath>) {
        for path in items.into_iter().rev() {
            self.paths.enqueue_front(path);
        }
    }

    /// Pop the head error item and, when `whole_class`, its anchor class.
    fn take_errors(&mut self, whole_class: bool, match_path_prefix: bool) -> Vec<ProcessErrorItem> {
        let Some(head) = self.errors.dequeue() else {
            return Vec::new();
        };

        if !whole_class {
            return vec![head];
        }

        let anchor = ErrorAnchor::from_item(&head, match_path_prefix);
        let mut items = vec![head];
        items.extend(self.errors.drain_anchor(&anchor));
        items
    }

    fn retry(&mut self, whole_class: bool, match_path_prefix: bool) -> usize {
        let items = self.take_errors(whole_class, match_path_prefix);
        let count = items.len();
        self.requeue(items.into_iter().map(|item| item.path).collect());
        count
    }

    fn ignore(&mut self, whole_class: bool, match_path_prefix: bool) -> usize {
        let items = self.take_errors(whole_class, match_path_prefix);
        for item in &items {
            self.dismiss(item);
        }
        items.len()
    }

    /// Consume the decisions recorded on error items.
    pub(crate) fn apply_pending_actions(&mut self, match_path_prefix: bool) -> usize {
        let decided: Vec<_> = self
            .errors
            .drain_matching(|item| item.pending_action != PendingAction::None)
            .collect();
        let count = decided.len();
        let mut retried = Vec::new();

        for item in decided {
            match item.pending_action {
                PendingAction::Retry => retried.push(item.path),
                PendingAction::Ignore => self.dismiss(&item),
                PendingAction::IgnoreAll => {
                    let anchor = ErrorAnchor::from_item(&item, match_path_prefix);
                    self.dismiss(&item);
                    for other in self.errors.drain_anchor(&anchor) {
                        self.tracker.get_mut().dismiss_item(&other.path);
                    }
                }
                PendingAction::None => self.errors.enqueue(item),
            }
        }

        self.requeue(retried);
        count
    }
}

/// State shared between a [`Process`] handle and its worker thread.
pub(crate) struct Shared {
    pub collection: PathCollection,
    pub options: ProcessOptions,
    pub action: Arc<dyn ProcessAction>,
    status: AtomicU8,
    pause_requested: AtomicBool,
    cancel_requested: AtomicBool,
    state: Mutex<ProcessState>,
    events: broadcast::Sender<ProcessEvent>,
}

impl Shared {
    pub fn lock(&self) -> MutexGuard<'_, ProcessState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn status(&self) -> ProcessStatus {
        ProcessStatus::from_repr(self.status.load(Ordering::SeqCst)).unwrap_or_default()
    }

    /// Change status. Callers hold the state lock, passed in as proof.
    pub fn transition(&self, _state: &mut ProcessState, status: ProcessStatus) {
        let previous = self.status();
        self.status.store(status as u8, Ordering::SeqCst);
        if previous != status {
            tracing::info!(kind = %self.action.kind(), from = %previous, to = %status, "process status changed");
            self.emit(ProcessEvent::StatusChanged(status));
        }
    }

    pub fn pause_requested(&self) -> bool {
        self.pause_requested.load(Ordering::SeqCst)
    }

    pub fn cancel_requested(&self) -> bool {
        self.cancel_requested.load(Ordering::SeqCst)
    }

    pub fn clear_pause_request(&self) {
        self.pause_requested.store(false, Ordering::SeqCst);
    }

    pub fn emit(&self, event: ProcessEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    pub fn emit_progress(&self, state: &ProcessState) {
        self.emit(ProcessEvent::Progress(state.tracker.snapshot()));
    }
}

/// A cancelable, pausable, resumable file operation.
///
/// A process owns a path collection, the queue of paths left to process
/// (`Paths`) and the queue of failed paths awaiting a decision
/// (`ErrorPaths`). Work happens on one dedicated worker thread per run;
/// pause and cancel requests are honored between items only.
///
/// # Example
///
/// ```rust,no_run
/// use wincopies_core::ProcessOptions;
/// use wincopies_ops::Process;
/// use wincopies_scan::PathCollection;
///
/// let collection = PathCollection::from_sources(["/data/photos"]).unwrap();
/// let process = Process::copy(collection, "/backup", ProcessOptions::default()).unwrap();
/// process.start().unwrap();
/// let status = process.join().unwrap();
/// println!("{status}: {}%", process.progress_percentage());
/// ```
pub struct Process {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Process {
    /// Create a process applying `action` to `collection`.
    pub fn new(
        collection: PathCollection,
        action: Arc<dyn ProcessAction>,
        options: ProcessOptions,
    ) -> Result<Self, ProcessError> {
        if options.buffer_size == 0 {
            return Err(ProcessError::InvalidConfig {
                message: "Buffer size must be greater than zero".to_string(),
            });
        }
        fs::metadata(collection.base()).map_err(|e| ProcessError::io(collection.base(), e))?;

        let (events, _) = broadcast::channel(PROCESS_EVENT_CAPACITY);
        let shared = Shared {
            collection,
            options,
            action,
            status: AtomicU8::new(ProcessStatus::NotStarted as u8),
            pause_requested: AtomicBool::new(false),
            cancel_requested: AtomicBool::new(false),
            state: Mutex::new(ProcessState::default()),
            events,
        };

        Ok(Self {
            shared: Arc::new(shared),
            worker: Mutex::new(None),
        })
    }

    /// Create a process copying `collection` into `destination`.
    pub fn copy(
        collection: PathCollection,
        destination: impl Into<PathBuf>,
        options: ProcessOptions,
    ) -> Result<Self, ProcessError> {
        let destination = destination.into();
        ensure_outside_sources(&collection, &destination)?;
        let action = CopyAction::new(destination, &options);
        Self::new(collection, Arc::new(action), options)
    }

    /// Create a process permanently deleting `collection`.
    pub fn delete(collection: PathCollection, options: ProcessOptions) -> Result<Self, ProcessError> {
        Self::new(collection, Arc::new(DeleteAction), options)
    }

    /// Create a process moving `collection` to the trash.
    pub fn recycle(collection: PathCollection, options: ProcessOptions) -> Result<Self, ProcessError> {
        Self::new(collection, Arc::new(RecycleAction), options)
    }

    /// Start or resume processing.
    ///
    /// Valid only from `NotStarted` or `Paused`. Decisions recorded with
    /// [`set_pending_action`](Self::set_pending_action) are applied first.
    pub fn start(&self) -> Result<(), ProcessError> {
        let mut worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner);

        let status = self.status();
        if !status.can_start() {
            return Err(ProcessError::invalid_state("start", status));
        }

        // The previous run has settled its status; wait for it to exit.
        if let Some(previous) = worker.take() {
            let _ = previous.join();
        }

        let previous_status = {
            let mut state = self.shared.lock();
            let status = self.status();
            if !status.can_start() {
                return Err(ProcessError::invalid_state("start", status));
            }

            self.shared.pause_requested.store(false, Ordering::SeqCst);
            self.shared.cancel_requested.store(false, Ordering::SeqCst);

            let applied = state.apply_pending_actions(self.shared.options.match_path_prefix);
            if applied > 0 {
                tracing::info!(applied, "applied pending decisions");
            }

            self.shared.transition(&mut state, ProcessStatus::Running);
            status
        };

        match worker::spawn(Arc::clone(&self.shared)) {
            Ok(handle) => {
                *worker = Some(handle);
                Ok(())
            }
            Err(err) => {
                let mut state = self.shared.lock();
                self.shared.transition(&mut state, previous_status);
                Err(err)
            }
        }
    }

    /// Request a pause at the next item boundary.
    pub fn pause(&self) -> Result<(), ProcessError> {
        let status = self.status();
        if status != ProcessStatus::Running {
            return Err(ProcessError::invalid_state("pause", status));
        }

        self.shared.pause_requested.store(true, Ordering::SeqCst);
        tracing::info!("pause requested");
        Ok(())
    }

    /// Cancel the process.
    ///
    /// While running, cancellation happens at the next item boundary and the
    /// remaining items are left untouched. Otherwise it is immediate.
    pub fn cancel(&self) -> Result<(), ProcessError> {
        let mut state = self.shared.lock();
        match self.status() {
            ProcessStatus::Running => {
                self.shared.cancel_requested.store(true, Ordering::SeqCst);
                tracing::info!("cancel requested");
                Ok(())
            }
            ProcessStatus::NotStarted | ProcessStatus::Paused | ProcessStatus::Erred => {
                state.tracker.suspend();
                self.shared.transition(&mut state, ProcessStatus::Cancelled);
                Ok(())
            }
            status => Err(ProcessError::invalid_state("cancel", status)),
        }
    }

    /// Retry the first failed item, ahead of the remaining paths.
    pub fn retry_first(&self) -> Result<usize, ProcessError> {
        self.resolve("retry", |state, prefix| state.retry(false, prefix))
    }

    /// Retry the first failed item and every item failing the same way.
    pub fn retry(&self) -> Result<usize, ProcessError> {
        self.resolve("retry", |state, prefix| state.retry(true, prefix))
    }

    /// Ignore the first failed item.
    pub fn ignore_first(&self) -> Result<usize, ProcessError> {
        self.resolve("ignore", |state, prefix| state.ignore(false, prefix))
    }

    /// Ignore the first failed item and every item failing the same way.
    pub fn ignore(&self) -> Result<usize, ProcessError> {
        self.resolve("ignore", |state, prefix| state.ignore(true, prefix))
    }

    /// Apply the decisions recorded on error items without resuming.
    pub fn apply_pending_actions(&self) -> Result<usize, ProcessError> {
        self.resolve("resolve", ProcessState::apply_pending_actions)
    }

    /// Record a decision on the failed item for `path`.
    ///
    /// Returns whether such an item is queued. Decisions are consumed by
    /// [`start`](Self::start) or [`apply_pending_actions`](Self::apply_pending_actions).
    pub fn set_pending_action(
        &self,
        path: impl AsRef<Path>,
        action: PendingAction,
    ) -> Result<bool, ProcessError> {
        let mut state = self.shared.lock();
        let status = self.status();
        if status.is_terminal() {
            return Err(ProcessError::invalid_state("decide on", status));
        }
        Ok(state.errors.set_pending_action(path.as_ref(), action))
    }

    fn resolve(
        &self,
        operation: &'static str,
        resolution: impl FnOnce(&mut ProcessState, bool) -> usize,
    ) -> Result<usize, ProcessError> {
        let mut state = self.shared.lock();
        let status = self.status();
        if !status.can_resolve() {
            return Err(ProcessError::invalid_state(operation, status));
        }
        if state.errors.is_empty() {
            return Err(ProcessError::NothingToResolve);
        }

        let resolved = resolution(&mut state, self.shared.options.match_path_prefix);
        tracing::info!(operation, resolved, "resolved failed items");

        if status == ProcessStatus::Erred {
            let settled = state.settled_status();
            self.shared.transition(&mut state, settled);
        }
        self.shared.emit_progress(&state);
        Ok(resolved)
    }

    /// Block until the current run returns, then report the status.
    pub fn join(&self) -> Result<ProcessStatus, ProcessError> {
        let handle = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(handle) = handle {
            if handle.join().is_err() {
                let mut state = self.shared.lock();
                state.tracker.suspend();
                self.shared.transition(&mut state, ProcessStatus::Erred);
                return Err(ProcessError::WorkerPanicked);
            }
        }

        Ok(self.status())
    }

    /// Subscribe to process events.
    pub fn subscribe(&self) -> broadcast::Receiver<ProcessEvent> {
        self.shared.events.subscribe()
    }

    /// The base directory of the path collection.
    pub fn source_path(&self) -> &Path {
        self.shared.collection.base()
    }

    /// The path collection.
    pub fn collection(&self) -> &PathCollection {
        &self.shared.collection
    }

    /// The kind of operation.
    pub fn kind(&self) -> ProcessKind {
        self.shared.action.kind()
    }

    /// The process options.
    pub fn options(&self) -> &ProcessOptions {
        &self.shared.options
    }

    /// Current status.
    pub fn status(&self) -> ProcessStatus {
        self.shared.status()
    }

    /// Whether the worker has stopped on a pause request.
    pub fn is_paused(&self) -> bool {
        self.status() == ProcessStatus::Paused
    }

    /// Whether a pause is requested but not yet honored.
    pub fn is_pause_requested(&self) -> bool {
        self.shared.pause_requested()
    }

    /// Whether a cancellation is requested but not yet honored.
    pub fn is_cancel_requested(&self) -> bool {
        self.shared.cancel_requested()
    }

    /// Progress snapshot.
    pub fn progress(&self) -> ProcessProgress {
        self.shared.lock().tracker.snapshot()
    }

    /// Bytes discovered when the collection was loaded.
    pub fn initial_total_size(&self) -> u64 {
        self.shared.lock().tracker.get().initial_total_size
    }

    /// Items discovered when the collection was loaded.
    pub fn initial_item_count(&self) -> usize {
        self.shared.lock().tracker.get().initial_item_count
    }

    /// Bytes not yet processed, failed items included.
    pub fn actual_remaining_size(&self) -> u64 {
        self.shared.lock().tracker.get().actual_remaining_size
    }

    /// The item being processed.
    pub fn current_path(&self) -> Option<PathBuf> {
        self.shared.lock().tracker.get().current_path.clone()
    }

    /// Progress of the current item (0-100).
    pub fn current_path_progress_percentage(&self) -> u8 {
        self.shared.lock().tracker.get().current_path_percentage
    }

    /// Overall progress (0-100).
    pub fn progress_percentage(&self) -> u8 {
        if self.status() == ProcessStatus::Completed {
            return 100;
        }
        self.shared.lock().tracker.get().percentage()
    }

    /// Paths left to process, head first.
    pub fn paths(&self) -> Vec<ProcessPath> {
        self.shared.lock().paths.to_vec()
    }

    /// Number of paths left to process.
    pub fn paths_len(&self) -> usize {
        self.shared.lock().paths.len()
    }

    /// Bytes of the paths left to process.
    pub fn paths_total_size(&self) -> u64 {
        self.shared.lock().paths.total_size()
    }

    /// Failed items awaiting a decision, head first.
    pub fn error_paths(&self) -> Vec<ProcessErrorItem> {
        self.shared.lock().errors.to_vec()
    }

    /// Number of failed items awaiting a decision.
    pub fn error_count(&self) -> usize {
        self.shared.lock().errors.len()
    }

    /// Entries skipped while enumerating the collection.
    pub fn warnings(&self) -> Vec<ScanWarning> {
        self.shared.lock().warnings.clone()
    }
}

impl Drop for Process {
    fn drop(&mut self) {
        if self.status() == ProcessStatus::Running {
            self.shared.cancel_requested.store(true, Ordering::SeqCst);
        }

        let worker = self.worker.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = worker.take() {
            let _ = handle.join();
        }
    }
}

impl std::fmt::Debug for Process {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Process")
            .field("kind", &self.kind())
            .field("source_path", &self.source_path())
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

/// Reject a copy whose destination lies inside one of its sources.
fn ensure_outside_sources(
    collection: &PathCollection,
    destination: &Path,
) -> Result<(), ProcessError> {
    let destination_resolved = resolve(destination);

    for root in collection.roots() {
        if !root.is_dir() {
            continue;
        }
        if destination_resolved.starts_with(resolve(&root)) {
            return Err(ProcessError::DestinationInsideSource {
                origin: root,
                destination: destination.to_path_buf(),
            });
        }
    }
    Ok(())
}

fn resolve(path: &Path) -> PathBuf {
    fs::canonicalize(path)
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
