//! Shared ordered task queue
//!
//! The [`TaskQueue`] holds the tasks of the current synchronization pass
//! in execution order. The coordinator fills it from builder output, the
//! executor drains it one task at a time, and the caller can drop an
//! album's pending tasks before the run starts.
//!
//! Ordering is the queue's one hard guarantee: tasks are executed in
//! enqueue order, which is what lets an album-creation task publish its
//! id before the uploads that depend on it are claimed.

use std::collections::HashSet;

use picsync_core::domain::{AlbumId, AlbumTitle, SyncTask, TaskId};
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug, Default)]
struct QueueState {
    tasks: Vec<SyncTask>,
    /// The task currently being executed, if any. Protected from
    /// [`TaskQueue::remove_album`] so deselection never yanks the
    /// bookkeeping out from under a live transfer.
    in_flight: Option<TaskId>,
}

/// Ordered task list shared between coordinator and executor.
#[derive(Debug, Default)]
pub struct TaskQueue {
    state: Mutex<QueueState>,
}

impl TaskQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append tasks, preserving their order.
    pub async fn enqueue_all(&self, tasks: Vec<SyncTask>) {
        if tasks.is_empty() {
            return;
        }
        let mut state = self.state.lock().await;
        debug!(added = tasks.len(), "enqueueing tasks");
        state.tasks.extend(tasks);
    }

    /// Claim the first task that is not done and not in `skip`.
    ///
    /// The claimed task is marked in-flight and returned as a clone; the
    /// executor reports the outcome through [`TaskQueue::finish`]. `skip`
    /// carries the ids already attempted in the current run, so a failed
    /// task is not retried until the next pass.
    pub async fn claim_next(&self, skip: &HashSet<TaskId>) -> Option<SyncTask> {
        let mut state = self.state.lock().await;
        let task = state
            .tasks
            .iter()
            .find(|t| !t.is_done() && !skip.contains(&t.id()))?
            .clone();
        state.in_flight = Some(task.id());
        Some(task)
    }

    /// Record the outcome of a claimed task and release the in-flight slot.
    pub async fn finish(&self, id: TaskId, success: bool) {
        let mut state = self.state.lock().await;
        if state.in_flight == Some(id) {
            state.in_flight = None;
        }
        if success {
            if let Some(task) = state.tasks.iter_mut().find(|t| t.id() == id) {
                task.mark_done();
            }
        }
    }

    /// Publish an album id into every pending upload of that album that
    /// lacks one. Returns the number of tasks updated.
    pub async fn fill_album_id(&self, title: &AlbumTitle, id: &AlbumId) -> usize {
        let mut state = self.state.lock().await;
        let filled = state
            .tasks
            .iter_mut()
            .map(|t| t.fill_album_id(title, id))
            .filter(|&changed| changed)
            .count();
        if filled > 0 {
            debug!(album = %title, album_id = %id, filled, "album id published to pending uploads");
        }
        filled
    }

    /// Remove the pending tasks of one album.
    ///
    /// Done tasks and the in-flight task are unaffected. Returns the
    /// number of tasks removed.
    pub async fn remove_album(&self, title: &AlbumTitle) -> usize {
        let mut state = self.state.lock().await;
        let in_flight = state.in_flight;
        let before = state.tasks.len();
        state
            .tasks
            .retain(|t| t.is_done() || Some(t.id()) == in_flight || t.album_title() != title);
        let removed = before - state.tasks.len();
        if removed > 0 {
            debug!(album = %title, removed, "pending tasks removed");
        }
        removed
    }

    /// Remove every task that has not completed, the in-flight one
    /// included. Used by cancellation, where the in-flight task is being
    /// aborted anyway. Returns the number of tasks removed.
    pub async fn clear_pending(&self) -> usize {
        let mut state = self.state.lock().await;
        let before = state.tasks.len();
        state.tasks.retain(SyncTask::is_done);
        before - state.tasks.len()
    }

    /// Drop all tasks. Called when a synchronization pass is over.
    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        state.tasks.clear();
    }

    /// `(done, total)` counters over the current queue contents.
    pub async fn counts(&self) -> (usize, usize) {
        let state = self.state.lock().await;
        let done = state.tasks.iter().filter(|t| t.is_done()).count();
        (done, state.tasks.len())
    }

    /// Number of tasks not yet completed.
    pub async fn pending_count(&self) -> usize {
        let state = self.state.lock().await;
        state.tasks.iter().filter(|t| !t.is_done()).count()
    }

    /// Total number of tasks, done or not.
    pub async fn len(&self) -> usize {
        self.state.lock().await.tasks.len()
    }

    /// True when the queue holds no tasks at all.
    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.tasks.is_empty()
    }

    /// Cloned view of the queue contents, in order.
    pub async fn snapshot(&self) -> Vec<SyncTask> {
        self.state.lock().await.tasks.clone()
    }
}

// ============================================================================
// Tests
// ============================================================================
