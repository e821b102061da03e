//! Remote album service port (driven/secondary port)
//!
//! This module defines the interface to the photo-hosting service:
//! listing albums and their photos, creating albums, and transferring
//! photo content in both directions.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because transport errors are adapter-specific;
//!   the executor classifies them into task failure kinds at the call
//!   site.
//! - `create_album` takes a seed file because the service refuses to
//!   create empty albums: the adapter uploads the seed and creates the
//!   album with it as the primary photo, returning the new album id.
//! - `download_photo` resolves the destination file name (photo title
//!   plus original format) so callers only choose the directory.
//! - Transfers are interrupted by dropping the returned future; the
//!   executor races each call against a cancellation token.

use std::path::Path;

use crate::domain::album::{RemoteAlbum, RemotePhoto};
use crate::domain::newtypes::{AlbumId, AlbumTitle, PhotoId};

/// A downloaded photo: resolved file name plus content
#[derive(Debug, Clone)]
pub struct DownloadedPhoto {
    /// File name to write under the target directory, e.g. `sunset.jpg`
    pub file_name: String,
    /// Photo content
    pub data: Vec<u8>,
}

/// Port trait for the remote album service
///
/// Implementations live in adapter crates; the engine consumes this as
/// `Arc<dyn IAlbumService + Send + Sync>`.
#[async_trait::async_trait]
pub trait IAlbumService: Send + Sync {
    /// List all albums of the authenticated account
    async fn list_albums(&self) -> anyhow::Result<Vec<RemoteAlbum>>;

    /// List the photos of one album
    ///
    /// # Arguments
    /// * `album` - The service-assigned album id
    async fn list_photos(&self, album: &AlbumId) -> anyhow::Result<Vec<RemotePhoto>>;

    /// Create an album seeded with one local file
    ///
    /// Uploads `seed_file` and creates the album with it as the primary
    /// photo.
    ///
    /// # Returns
    /// The id of the newly created album
    async fn create_album(&self, title: &AlbumTitle, seed_file: &Path) -> anyhow::Result<AlbumId>;

    /// Upload one local file as a new photo
    ///
    /// The photo is not attached to any album; callers follow up with
    /// [`add_photo_to_album`](IAlbumService::add_photo_to_album).
    ///
    /// # Returns
    /// The id of the uploaded photo
    async fn upload_photo(&self, file: &Path) -> anyhow::Result<PhotoId>;

    /// Download one photo's content
    ///
    /// # Returns
    /// The content plus the file name it should be stored under
    async fn download_photo(&self, photo: &PhotoId) -> anyhow::Result<DownloadedPhoto>;

    /// Attach an already-uploaded photo to an album
    async fn add_photo_to_album(&self, album: &AlbumId, photo: &PhotoId) -> anyhow::Result<()>;
}
