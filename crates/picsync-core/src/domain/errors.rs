//! Domain error types
//!
//! Two error families live here:
//! - [`DomainError`] - construction and state-machine violations, raised by
//!   validated newtypes and the coordinator.
//! - [`TaskError`] - the observable failure kinds of a single sync task.
//!   These are stored in execution reports, so they are cheap to clone and
//!   comparable in tests.

use thiserror::Error;

/// Errors raised by domain type construction and state transitions
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// An album title failed validation (empty, path separators, dot names)
    #[error("Invalid album title: {0}")]
    InvalidTitle(String),

    /// An identifier failed validation
    #[error("Invalid identifier: {0}")]
    InvalidId(String),

    /// A coordinator operation was requested in the wrong phase
    #[error("Invalid state transition from {from} to {to}")]
    InvalidState {
        /// The phase the coordinator was in
        from: String,
        /// The phase or operation that was requested
        to: String,
    },

    /// A selection referenced an album title no summary knows about
    #[error("Unknown album: {0}")]
    UnknownAlbum(String),
}

/// The failure kinds a single sync task can surface
///
/// Every task attempt ends in success or exactly one of these. The
/// executor records them per task in the execution report instead of
/// aborting the batch.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// The task could not run at all (e.g. an upload with no resolvable
    /// album id after its CreateAlbum failed)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The remote service rejected or interrupted the transfer
    #[error("Transfer failed: {0}")]
    Transfer(String),

    /// A local read or write failed
    #[error("Filesystem error: {0}")]
    FileSystem(String),

    /// The task was interrupted by a cancellation request
    #[error("Cancelled")]
    Cancelled,
}

impl TaskError {
    /// Short stable tag for structured output (JSON reports, logs)
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Transfer(_) => "transfer",
            Self::FileSystem(_) => "filesystem",
            Self::Cancelled => "cancelled",
        }
    }
}
