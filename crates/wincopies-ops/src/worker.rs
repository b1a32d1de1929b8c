//! The worker thread driving a process run.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use wincopies_core::{ProcessError, ProcessErrorItem, ProcessPath, ProcessStatus};

use crate::event::ProcessEvent;
use crate::process::Shared;

/// Name given to worker threads.
pub const WORKER_THREAD_NAME: &str = "wincopies-process";

/// Spawn a worker for one run of the process.
pub(crate) fn spawn(shared: Arc<Shared>) -> Result<JoinHandle<()>, ProcessError> {
    thread::Builder::new()
        .name(WORKER_THREAD_NAME.to_string())
        .spawn(move || run(&shared))
        .map_err(ProcessError::WorkerSpawn)
}

/// Process queued items until the queue drains or a request is honored.
fn run(shared: &Shared) {
    let loaded = {
        let mut state = shared.lock();
        state.tracker.resume();
        state.loaded
    };

    if !loaded && !load(shared) {
        return;
    }

    loop {
        if shared.cancel_requested() {
            finish(shared, ProcessStatus::Cancelled);
            return;
        }
        if shared.pause_requested() {
            shared.clear_pause_request();
            finish(shared, ProcessStatus::Paused);
            return;
        }

        let item = {
            let mut state = shared.lock();
            let Some(item) = state.paths.dequeue() else {
                break;
            };
            state.tracker.get_mut().begin_item(&item.path);
            shared.emit_progress(&state);
            item
        };

        tracing::debug!(path = %item, "processing item");
        let result = shared.action.act(&item, &mut |percentage| {
            let mut state = shared.lock();
            state.tracker.get_mut().set_current_percentage(percentage);
            shared.emit_progress(&state);
        });

        let mut state = shared.lock();
        match result {
            Ok(()) => state.tracker.get_mut().complete_item(&item),
            Err(err) if shared.options.is_auto_ignored(err.kind) => {
                tracing::info!(path = %item, kind = %err.kind, "ignoring failure by policy");
                state.tracker.get_mut().dismiss_item(&item);
            }
            Err(err) => {
                tracing::warn!(path = %item, kind = %err.kind, error = %err.message, "item failed");
                let failed = ProcessErrorItem::new(item, err.kind, err.message);
                shared.emit(ProcessEvent::ItemFailed(failed.clone()));
                state.errors.enqueue(failed);
            }
        }
        shared.emit_progress(&state);
    }

    let status = if shared.lock().errors.is_empty() {
        ProcessStatus::Completed
    } else {
        ProcessStatus::Erred
    };
    finish(shared, status);
}

/// Enumerate the collection into the queue. Returns whether to go on.
fn load(shared: &Shared) -> bool {
    let kind = shared.action.kind();
    let prepared = shared.action.prepare(&shared.collection);

    let mut enumerator = shared.collection.enumerate_with(
        shared.options.order,
        kind.is_recursive(),
        shared.options.follow_symlinks,
    );
    let mut items = Vec::new();
    for item in enumerator.by_ref() {
        if shared.cancel_requested() {
            finish(shared, ProcessStatus::Cancelled);
            return false;
        }
        items.push(item);
    }
    let warnings = enumerator.take_warnings();
    for warning in &warnings {
        tracing::warn!(%warning, "skipped during enumeration");
    }

    let mut state = shared.lock();
    for item in &items {
        state.tracker.get_mut().discover(item);
    }
    if kind.reverses_order() {
        for item in items {
            state.paths.enqueue_front(item);
        }
    } else {
        state.paths.extend(items);
    }

    let prepared = match prepared {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(kind = %err.kind, error = %err.message, "failed to prepare process");
            // Retrying this item re-runs the action on the base itself.
            let failed = ProcessErrorItem::new(
                ProcessPath::directory(shared.collection.base(), ""),
                err.kind,
                err.message,
            );
            state.tracker.get_mut().discover(&failed.path);
            shared.emit(ProcessEvent::ItemFailed(failed.clone()));
            state.errors.enqueue(failed);
            false
        }
    };

    state.loaded = true;
    let progress = state.tracker.get();
    tracing::info!(
        %kind,
        items = progress.initial_item_count,
        bytes = progress.initial_total_size,
        skipped = warnings.len(),
        "loaded path collection"
    );
    shared.emit(ProcessEvent::Loaded {
        item_count: progress.initial_item_count,
        total_size: progress.initial_total_size,
        skipped: warnings.len(),
    });
    state.warnings = warnings;
    drop(state);

    if !prepared {
        finish(shared, ProcessStatus::Erred);
    }
    prepared
}

fn finish(shared: &Shared, status: ProcessStatus) {
    let mut state = shared.lock();
    state.tracker.suspend();
    shared.transition(&mut state, status);
    shared.emit_progress(&state);
}
