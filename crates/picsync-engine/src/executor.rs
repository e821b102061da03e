//! Sequential task executor
//!
//! The [`TaskExecutor`] drains the shared [`TaskQueue`] one task at a
//! time, in enqueue order, on whatever task calls [`TaskExecutor::run`].
//! Sequential execution is what makes the album-creation dependency
//! trivial: a `CreateAlbum` finishes and publishes its album id into the
//! queue strictly before any dependent `Upload` is claimed.
//!
//! ## Failure isolation
//!
//! One task's failure never aborts the batch. Each failed task is
//! recorded as a [`TaskFailure`] in the [`ExecutionReport`] and the loop
//! moves on; the failed task stays not-done in the queue but is not
//! retried within the same run.
//!
//! ## Cancellation
//!
//! Every task execution registers a fresh `CancellationToken` in a
//! registry keyed by task id, and deregisters it when the task settles.
//! [`TaskExecutor::cancel`] stops further dequeueing, drains the registry
//! invoking each registered token exactly once, and clears the pending
//! queue. The interrupted task surfaces as [`TaskError::Cancelled`] in
//! the report, distinct from a transfer failure.
//!
//! ## Progress
//!
//! After every settled task the executor publishes `done / total` on a
//! `tokio::sync::watch` channel; observers subscribe instead of reading
//! shared counters.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use picsync_core::domain::{AlbumTitle, SyncTask, TaskError, TaskId, TaskKind};
use picsync_core::ports::{IAlbumService, ILocalStore};
use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::queue::TaskQueue;

// ============================================================================
// Progress
// ============================================================================

/// Completion counters published after every settled task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    /// Tasks completed successfully.
    pub done: usize,
    /// Tasks in the batch, completed or not.
    pub total: usize,
}

// ============================================================================
// ExecutionReport
// ============================================================================

/// One task's failure, as recorded in the report.
#[derive(Debug, Clone)]
pub struct TaskFailure {
    /// Id of the failed task.
    pub task_id: TaskId,
    /// Album the task belonged to.
    pub album_title: AlbumTitle,
    /// Human-readable task description (from [`SyncTask::describe`]).
    pub description: String,
    /// Which of the four failure kinds occurred.
    pub error: TaskError,
}

/// Summary of a completed (or interrupted) task run.
#[derive(Debug, Clone)]
pub struct ExecutionReport {
    /// Number of tasks pending when the run started.
    pub total: usize,
    /// Number of tasks that completed successfully.
    pub succeeded: usize,
    /// Per-task failures, cancellations included, in execution order.
    pub failures: Vec<TaskFailure>,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run returned.
    pub finished_at: DateTime<Utc>,
}

impl ExecutionReport {
    /// Number of tasks that failed for a reason other than cancellation.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failures
            .iter()
            .filter(|f| f.error != TaskError::Cancelled)
            .count()
    }

    /// Number of tasks interrupted by cancellation.
    #[must_use]
    pub fn cancelled(&self) -> usize {
        self.failures
            .iter()
            .filter(|f| f.error == TaskError::Cancelled)
            .count()
    }

    /// True when every task succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// True when the run was interrupted by [`TaskExecutor::cancel`].
    #[must_use]
    pub fn was_cancelled(&self) -> bool {
        self.failures
            .iter()
            .any(|f| f.error == TaskError::Cancelled)
    }

    /// Wall-clock duration of the run in milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> u64 {
        (self.finished_at - self.started_at)
            .num_milliseconds()
            .max(0) as u64
    }
}

// ============================================================================
// Cancellation registry
// ============================================================================

/// In-flight cancellation handles, keyed by task id.
///
/// Registration returns an RAII guard so a handle is always deregistered
/// when its task settles, whichever way it settles. Draining removes each
/// entry before invoking it, so every handle is invoked at most once even
/// under concurrent cancel calls.
#[derive(Debug, Default)]
struct CancelRegistry {
    handles: DashMap<TaskId, CancellationToken>,
}

impl CancelRegistry {
    fn register(&self, id: TaskId, token: CancellationToken) -> RegistrationGuard<'_> {
        self.handles.insert(id, token);
        RegistrationGuard { registry: self, id }
    }

    /// Remove and invoke every registered handle. Returns how many were
    /// invoked.
    fn cancel_all(&self) -> usize {
        let ids: Vec<TaskId> = self.handles.iter().map(|entry| *entry.key()).collect();
        let mut invoked = 0;
        for id in ids {
            if let Some((_, token)) = self.handles.remove(&id) {
                token.cancel();
                invoked += 1;
            }
        }
        invoked
    }

    fn len(&self) -> usize {
        self.handles.len()
    }
}

struct RegistrationGuard<'a> {
    registry: &'a CancelRegistry,
    id: TaskId,
}

impl Drop for RegistrationGuard<'_> {
    fn drop(&mut self) {
        self.registry.handles.remove(&self.id);
    }
}

// ============================================================================
// TaskExecutor
// ============================================================================

/// Sequential runner for the shared task queue.
///
/// ## Dependencies
///
/// - `albums`: remote album operations (create, upload, download, attach)
/// - `store`: local writes for downloaded photos
/// - `queue`: the shared ordered task list
///
/// One run at a time; the coordinator's phase machine enforces this.
pub struct TaskExecutor {
    albums: Arc<dyn IAlbumService>,
    store: Arc<dyn ILocalStore>,
    queue: Arc<TaskQueue>,
    registry: CancelRegistry,
    /// Stop token of the current (or most recent) run. Replaced with a
    /// fresh token at every run start so an old cancel cannot poison the
    /// next run.
    run_stop: Mutex<CancellationToken>,
    progress_tx: watch::Sender<Progress>,
}

impl TaskExecutor {
    /// Create an executor over the given ports and queue.
    pub fn new(
        albums: Arc<dyn IAlbumService>,
        store: Arc<dyn ILocalStore>,
        queue: Arc<TaskQueue>,
    ) -> Self {
        let (progress_tx, _) = watch::channel(Progress::default());
        Self {
            albums,
            store,
            queue,
            registry: CancelRegistry::default(),
            run_stop: Mutex::new(CancellationToken::new()),
            progress_tx,
        }
    }

    /// Subscribe to `done / total` progress updates.
    #[must_use]
    pub fn progress(&self) -> watch::Receiver<Progress> {
        self.progress_tx.subscribe()
    }

    /// Number of currently registered in-flight cancellation handles.
    ///
    /// Zero except while a task is executing; always zero after
    /// [`TaskExecutor::cancel`] returns.
    #[must_use]
    pub fn in_flight_handles(&self) -> usize {
        self.registry.len()
    }

    // ========================================================================
    // run()
    // ========================================================================

    /// Execute all pending tasks sequentially, in enqueue order.
    ///
    /// Returns when the queue has no claimable task left or the run is
    /// cancelled. Failures are recorded per task; the batch continues
    /// past them.
    #[tracing::instrument(skip(self))]
    pub async fn run(&self) -> ExecutionReport {
        let started_at = Utc::now();

        let stop = CancellationToken::new();
        *self.run_stop.lock().await = stop.clone();

        let (done_before, queue_len) = self.queue.counts().await;
        let total = queue_len - done_before;
        info!(total, "starting task run");

        let mut attempted: HashSet<TaskId> = HashSet::new();
        let mut succeeded = 0usize;
        let mut failures: Vec<TaskFailure> = Vec::new();

        loop {
            if stop.is_cancelled() {
                break;
            }
            let Some(task) = self.queue.claim_next(&attempted).await else {
                break;
            };
            attempted.insert(task.id());

            let token = CancellationToken::new();
            let guard = self.registry.register(task.id(), token.clone());
            debug!(task = %task.describe(), "task started");

            // Dropping the task future aborts its in-flight service call.
            let outcome = tokio::select! {
                res = self.execute(&task) => res,
                () = token.cancelled() => Err(TaskError::Cancelled),
                () = stop.cancelled() => Err(TaskError::Cancelled),
            };
            drop(guard);

            match outcome {
                Ok(()) => {
                    self.queue.finish(task.id(), true).await;
                    succeeded += 1;
                    info!(task = %task.describe(), "task completed");
                }
                Err(error) => {
                    self.queue.finish(task.id(), false).await;
                    let cancelled = error == TaskError::Cancelled;
                    if cancelled {
                        info!(task = %task.describe(), "task cancelled");
                    } else {
                        warn!(task = %task.describe(), error = %error, "task failed");
                    }
                    failures.push(TaskFailure {
                        task_id: task.id(),
                        album_title: task.album_title().clone(),
                        description: task.describe(),
                        error,
                    });
                    if cancelled {
                        self.publish_progress(done_before + succeeded, queue_len);
                        break;
                    }
                }
            }
            self.publish_progress(done_before + succeeded, queue_len);
        }

        let report = ExecutionReport {
            total,
            succeeded,
            failures,
            started_at,
            finished_at: Utc::now(),
        };
        info!(
            total = report.total,
            succeeded = report.succeeded,
            failed = report.failed(),
            cancelled = report.cancelled(),
            duration_ms = report.duration_ms(),
            "task run finished"
        );
        report
    }

    // ========================================================================
    // cancel()
    // ========================================================================

    /// Cancel the current run.
    ///
    /// Stops further dequeueing, invokes every registered in-flight
    /// handle exactly once, and clears the pending queue. Safe to call
    /// when no run is active; safe to call more than once.
    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self) {
        info!("cancellation requested");
        self.run_stop.lock().await.cancel();
        let invoked = self.registry.cancel_all();
        let cleared = self.queue.clear_pending().await;
        info!(handles = invoked, cleared, "cancellation complete");
    }

    // ========================================================================
    // Task bodies
    // ========================================================================

    /// Execute one task against the ports.
    async fn execute(&self, task: &SyncTask) -> Result<(), TaskError> {
        match task.kind() {
            TaskKind::CreateAlbum { seed_file } => {
                let album_id = self
                    .albums
                    .create_album(task.album_title(), seed_file)
                    .await
                    .map_err(transfer_error)?;
                // Publish the new id into same-album uploads before any of
                // them can be claimed.
                let filled = self
                    .queue
                    .fill_album_id(task.album_title(), &album_id)
                    .await;
                debug!(album = %task.album_title(), album_id = %album_id, filled, "album created");
                Ok(())
            }
            TaskKind::Upload { file, album_id } => {
                let Some(album_id) = album_id else {
                    return Err(TaskError::Validation(format!(
                        "no album id for upload of {}; album creation did not complete",
                        file.display()
                    )));
                };
                let photo_id = self.albums.upload_photo(file).await.map_err(transfer_error)?;
                self.albums
                    .add_photo_to_album(album_id, &photo_id)
                    .await
                    .map_err(transfer_error)?;
                Ok(())
            }
            TaskKind::Download {
                photo_id,
                target_dir,
            } => {
                let photo = self
                    .albums
                    .download_photo(photo_id)
                    .await
                    .map_err(transfer_error)?;
                let target = target_dir.join(&photo.file_name);
                self.store
                    .write_file(&target, &photo.data)
                    .await
                    .map_err(|err| TaskError::FileSystem(format!("{err:#}")))?;
                Ok(())
            }
        }
    }

    fn publish_progress(&self, done: usize, total: usize) {
        // send_replace never fails; it updates even with no receivers.
        self.progress_tx.send_replace(Progress { done, total });
    }
}

fn transfer_error(err: anyhow::Error) -> TaskError {
    TaskError::Transfer(format!("{err:#}"))
}

// ============================================================================
// Tests
// ============================================================================
