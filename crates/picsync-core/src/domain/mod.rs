//! Domain entities and business logic
//!
//! This module contains the core domain types for picsync:
//! - Newtypes for type-safe identifiers and validated album titles
//! - Remote album and photo entities as reported by the hosting service
//! - Local directory entries with the image-extension filter
//! - Per-album diff summaries
//! - Synchronization tasks and their ordering rules
//! - Domain-specific error types

pub mod album;
pub mod diff;
pub mod errors;
pub mod newtypes;
pub mod task;

// Re-export commonly used types
pub use album::{ImageKind, LocalEntry, RemoteAlbum, RemotePhoto};
pub use diff::DiffSummary;
pub use errors::{DomainError, TaskError};
pub use newtypes::{AlbumId, AlbumTitle, PhotoId, TaskId};
pub use task::{SyncTask, TaskKind};
