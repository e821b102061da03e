//! picsync engine - album reconciliation and task execution
//!
//! Provides:
//! - Snapshot reconciliation of a local picture tree against remote albums
//! - Task building with the create-album-before-upload dependency
//! - A sequential task executor with per-task failure isolation,
//!   cooperative cancellation, and watch-channel progress
//! - The coordinator state machine driving a full synchronization pass
//!
//! ## Modules
//!
//! - [`reconcile`] - per-album diff computation (pure snapshot read)
//! - [`builder`] - turns a selected album into an ordered task list
//! - [`queue`] - shared ordered task queue
//! - [`executor`] - sequential runner, cancellation registry, progress
//! - [`coordinator`] - `Idle -> Reconciling -> AwaitingSelection -> Executing` cycle
//! - [`filesystem`] - local store adapter over `tokio::fs`

pub mod builder;
pub mod coordinator;
pub mod executor;
pub mod filesystem;
pub mod queue;
pub mod reconcile;

pub use builder::TaskBuilder;
pub use coordinator::{Phase, SyncCoordinator};
pub use executor::{ExecutionReport, Progress, TaskExecutor, TaskFailure};
pub use filesystem::LocalStoreAdapter;
pub use queue::TaskQueue;
pub use reconcile::{ReconcileReport, Reconciler};
