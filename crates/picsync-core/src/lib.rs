//! picsync Core - Domain logic and business rules
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `RemoteAlbum`, `LocalEntry`, `DiffSummary`, `SyncTask`
//! - **Validated newtypes** - `AlbumTitle`, `AlbumId`, `PhotoId`, `TaskId`
//! - **Port definitions** - Traits for adapters: `IAlbumService`, `ILocalStore`
//! - **Configuration** - YAML configuration with validation
//!
//! # Architecture
//!
//! This crate follows the hexagonal (ports & adapters) architecture pattern.
//! The domain module contains pure business logic with no external dependencies.
//! Ports define trait interfaces that adapter crates implement. The engine
//! crate orchestrates domain entities through the port interfaces.

pub mod config;
pub mod domain;
pub mod ports;
