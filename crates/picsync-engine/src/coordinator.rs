//! Sync pass orchestration
//!
//! The [`SyncCoordinator`] drives one full synchronization cycle:
//! reconcile, let the caller pick albums, build and enqueue their tasks,
//! execute, then reconcile again so the caller sees fresh state. It owns
//! the queue and executor and is the only component that moves the pass
//! through its phases:
//!
//! ```text
//! Idle -> Reconciling -> AwaitingSelection -> Executing -> Idle
//! ```
//!
//! Phase changes are published on a `tokio::sync::watch` channel, like
//! progress; callers subscribe instead of polling. Operations invoked in
//! the wrong phase fail with an invalid-transition error instead of
//! corrupting an in-flight run.
//!
//! [`SyncCoordinator::stop`] is the abort path: cancel whatever is
//! running, then force a fresh reconciliation so the stored summaries
//! reflect what actually happened before the pass was interrupted.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use picsync_core::domain::{AlbumTitle, DiffSummary, DomainError, RemoteAlbum, SyncTask};
use picsync_core::ports::{IAlbumService, ILocalStore};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use crate::builder::TaskBuilder;
use crate::executor::{ExecutionReport, Progress, TaskExecutor};
use crate::queue::TaskQueue;
use crate::reconcile::{ReconcileReport, Reconciler};

// ============================================================================
// Phase
// ============================================================================

/// Where the coordinator currently is in the sync cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing in progress; summaries may be stale.
    Idle,
    /// A reconciliation pass is running.
    Reconciling,
    /// Summaries are fresh; waiting for the caller to select albums.
    AwaitingSelection,
    /// The task queue is being executed.
    Executing,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Reconciling => "reconciling",
            Phase::AwaitingSelection => "awaiting-selection",
            Phase::Executing => "executing",
        };
        write!(f, "{name}")
    }
}

// ============================================================================
// SyncCoordinator
// ============================================================================

/// Reconciliation snapshot kept between `reconcile` and `select`.
#[derive(Debug, Default)]
struct SelectionState {
    remote_albums: Vec<RemoteAlbum>,
    summaries: Vec<DiffSummary>,
}

/// Orchestrates reconcile / select / run cycles over a shared queue.
///
/// All methods take `&self`; share the coordinator behind an `Arc` to
/// call [`stop`](SyncCoordinator::stop) from another task while
/// [`run`](SyncCoordinator::run) is being awaited.
pub struct SyncCoordinator {
    reconciler: Reconciler,
    builder: TaskBuilder,
    executor: TaskExecutor,
    queue: Arc<TaskQueue>,
    root: PathBuf,
    state: Mutex<SelectionState>,
    phase_tx: watch::Sender<Phase>,
}

impl SyncCoordinator {
    /// Create a coordinator syncing `root` against the given service.
    pub fn new(
        albums: Arc<dyn IAlbumService>,
        store: Arc<dyn ILocalStore>,
        root: PathBuf,
    ) -> Self {
        let queue = Arc::new(TaskQueue::new());
        let executor = TaskExecutor::new(albums.clone(), store.clone(), queue.clone());
        let (phase_tx, _) = watch::channel(Phase::Idle);
        Self {
            reconciler: Reconciler::new(albums.clone(), store.clone()),
            builder: TaskBuilder::new(albums, store),
            executor,
            queue,
            root,
            state: Mutex::new(SelectionState::default()),
            phase_tx,
        }
    }

    // ========================================================================
    // Observation
    // ========================================================================

    /// Subscribe to phase changes.
    #[must_use]
    pub fn phase(&self) -> watch::Receiver<Phase> {
        self.phase_tx.subscribe()
    }

    /// The phase right now.
    #[must_use]
    pub fn current_phase(&self) -> Phase {
        *self.phase_tx.borrow()
    }

    /// Subscribe to `done / total` execution progress.
    #[must_use]
    pub fn progress(&self) -> watch::Receiver<Progress> {
        self.executor.progress()
    }

    /// The summaries from the most recent reconciliation pass.
    pub async fn summaries(&self) -> Vec<DiffSummary> {
        self.state.lock().await.summaries.clone()
    }

    /// Snapshot of the queue, in execution order.
    pub async fn planned_tasks(&self) -> Vec<SyncTask> {
        self.queue.snapshot().await
    }

    // ========================================================================
    // reconcile()
    // ========================================================================

    /// Run a reconciliation pass and move to `AwaitingSelection`.
    ///
    /// # Errors
    /// Fails when called while executing, or when either side's root
    /// listing cannot be read (the phase falls back to `Idle` then).
    #[tracing::instrument(skip(self))]
    pub async fn reconcile(&self) -> anyhow::Result<ReconcileReport> {
        self.transition(&[Phase::Idle, Phase::AwaitingSelection], Phase::Reconciling)?;
        match self.reconciler.reconcile(&self.root).await {
            Ok(report) => {
                let mut state = self.state.lock().await;
                state.remote_albums = report.remote_albums.clone();
                state.summaries = report.summaries.clone();
                drop(state);
                self.set_phase(Phase::AwaitingSelection);
                Ok(report)
            }
            Err(err) => {
                self.set_phase(Phase::Idle);
                Err(err)
            }
        }
    }

    // ========================================================================
    // select() / deselect()
    // ========================================================================

    /// Build and enqueue the tasks for the given albums.
    ///
    /// All-or-nothing: nothing is enqueued if any album fails to build.
    /// The phase stays `AwaitingSelection`; call as often as needed
    /// before [`run`](SyncCoordinator::run).
    ///
    /// # Returns
    /// The number of tasks enqueued by this call.
    ///
    /// # Errors
    /// Fails when not awaiting selection, when a title was not part of
    /// the last reconciliation, or when task building fails.
    #[tracing::instrument(skip(self, titles))]
    pub async fn select(&self, titles: &[AlbumTitle]) -> anyhow::Result<usize> {
        self.require_phase(Phase::AwaitingSelection)?;

        let state = self.state.lock().await;
        let mut batch = Vec::new();
        for title in titles {
            if !state.summaries.iter().any(|s| &s.title == title) {
                return Err(DomainError::UnknownAlbum(title.to_string()).into());
            }
            let remote = state
                .remote_albums
                .iter()
                .find(|album| album.title == title.as_str());
            let tasks = self
                .builder
                .build(&self.root, title, remote)
                .await
                .with_context(|| format!("building tasks for album \"{title}\""))?;
            batch.extend(tasks);
        }
        drop(state);

        let count = batch.len();
        self.queue.enqueue_all(batch).await;
        info!(albums = titles.len(), tasks = count, "selection enqueued");
        Ok(count)
    }

    /// Remove an album's pending tasks from the queue.
    ///
    /// Tasks already done, and the task currently executing, stay.
    ///
    /// # Returns
    /// The number of tasks removed.
    #[tracing::instrument(skip(self), fields(album = %title))]
    pub async fn deselect(&self, title: &AlbumTitle) -> usize {
        let removed = self.queue.remove_album(title).await;
        info!(album = %title, removed, "album deselected");
        removed
    }

    // ========================================================================
    // run() / cancel() / stop()
    // ========================================================================

    /// Execute the queued tasks, then refresh the summaries.
    ///
    /// Returns the execution report once the queue is drained or the run
    /// is cancelled. The queue is cleared and a fresh reconciliation pass
    /// refreshes the stored summaries before the phase returns to `Idle`;
    /// a refresh failure is logged, not propagated, since the report of
    /// the finished run is the more important result.
    ///
    /// # Errors
    /// Fails when not awaiting selection.
    #[tracing::instrument(skip(self))]
    pub async fn run(&self) -> anyhow::Result<ExecutionReport> {
        self.transition(&[Phase::AwaitingSelection], Phase::Executing)?;

        let report = self.executor.run().await;

        self.queue.clear().await;
        self.refresh_state().await;
        self.set_phase(Phase::Idle);
        Ok(report)
    }

    /// Cancel the running batch without waiting for it.
    ///
    /// The concurrent [`run`](SyncCoordinator::run) call observes the
    /// cancellation, finishes its report, and refreshes state itself.
    /// Safe to call in any phase.
    pub async fn cancel(&self) {
        self.executor.cancel().await;
    }

    /// Abort the pass and force a fresh reconciliation.
    ///
    /// Cancels whatever is running, wipes the queue, reconciles, and
    /// lands in `Idle` whatever phase the coordinator was in.
    ///
    /// # Errors
    /// Fails when the forced reconciliation pass cannot read either
    /// side's root listing; the phase still lands in `Idle`.
    #[tracing::instrument(skip(self))]
    pub async fn stop(&self) -> anyhow::Result<ReconcileReport> {
        info!("stop requested");
        self.executor.cancel().await;
        self.queue.clear().await;

        self.set_phase(Phase::Reconciling);
        match self.reconciler.reconcile(&self.root).await {
            Ok(report) => {
                let mut state = self.state.lock().await;
                state.remote_albums = report.remote_albums.clone();
                state.summaries = report.summaries.clone();
                drop(state);
                self.set_phase(Phase::Idle);
                Ok(report)
            }
            Err(err) => {
                *self.state.lock().await = SelectionState::default();
                self.set_phase(Phase::Idle);
                Err(err.context("re-reconciling after stop"))
            }
        }
    }

    // ========================================================================
    // Phase plumbing
    // ========================================================================

    /// Atomically move to `to` if the current phase is one of `allowed`.
    fn transition(&self, allowed: &[Phase], to: Phase) -> Result<(), DomainError> {
        let mut observed = Phase::Idle;
        let mut changed = false;
        self.phase_tx.send_if_modified(|phase| {
            observed = *phase;
            if allowed.contains(phase) {
                *phase = to;
                changed = true;
                true
            } else {
                false
            }
        });
        if changed {
            debug!(from = %observed, to = %to, "phase transition");
            Ok(())
        } else {
            Err(DomainError::InvalidState {
                from: observed.to_string(),
                to: to.to_string(),
            })
        }
    }

    fn require_phase(&self, expected: Phase) -> Result<(), DomainError> {
        let current = self.current_phase();
        if current == expected {
            Ok(())
        } else {
            Err(DomainError::InvalidState {
                from: current.to_string(),
                to: expected.to_string(),
            })
        }
    }

    fn set_phase(&self, to: Phase) {
        self.phase_tx.send_replace(to);
    }

    /// Re-reconcile after a run so the stored summaries are fresh.
    async fn refresh_state(&self) {
        match self.reconciler.reconcile(&self.root).await {
            Ok(report) => {
                let mut state = self.state.lock().await;
                state.remote_albums = report.remote_albums;
                state.summaries = report.summaries;
            }
            Err(err) => {
                warn!(error = format!("{err:#}"), "post-run reconciliation failed; selection state cleared");
                *self.state.lock().await = SelectionState::default();
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
