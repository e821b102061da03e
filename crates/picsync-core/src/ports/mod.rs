//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the domain core
//! depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IAlbumService`] - Remote album operations (Flickr today, any
//!   photoset-style service tomorrow)
//! - [`ILocalStore`] - Local directory listing and file writing

pub mod album_service;
pub mod local_store;

pub use album_service::{DownloadedPhoto, IAlbumService};
pub use local_store::ILocalStore;
