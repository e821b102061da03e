//! FlickrAlbumService - IAlbumService implementation for the Flickr API
//!
//! Wraps the [`FlickrClient`] and delegates to the albums and transfer
//! modules to fulfil the [`IAlbumService`] port contract.
//!
//! ## Design Notes
//!
//! - All `FlickrClient` methods take `&self`, so no interior locking is
//!   needed; the adapter is shared as `Arc<dyn IAlbumService>`.
//! - `create_album` uploads the seed file first because Flickr refuses
//!   to create an empty photoset; the seed becomes the primary photo.
//! - Credential acquisition is out of scope here: the adapter signs
//!   with the already-authorized credentials it was constructed with.

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;

use picsync_core::domain::{AlbumId, AlbumTitle, PhotoId, RemoteAlbum, RemotePhoto};
use picsync_core::ports::{DownloadedPhoto, IAlbumService};

use crate::albums;
use crate::auth::FlickrCredentials;
use crate::client::FlickrClient;
use crate::transfer;

/// Flickr-backed implementation of the album service port
pub struct FlickrAlbumService {
    client: FlickrClient,
}

impl FlickrAlbumService {
    /// Creates a service against the production Flickr endpoints
    pub fn new(credentials: FlickrCredentials) -> Self {
        Self {
            client: FlickrClient::new(credentials),
        }
    }

    /// Creates a service around an existing client (useful for testing
    /// against replacement endpoints)
    pub fn with_client(client: FlickrClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl IAlbumService for FlickrAlbumService {
    async fn list_albums(&self) -> Result<Vec<RemoteAlbum>> {
        albums::list_albums(&self.client).await
    }

    async fn list_photos(&self, album: &AlbumId) -> Result<Vec<RemotePhoto>> {
        albums::list_photos(&self.client, album).await
    }

    async fn create_album(&self, title: &AlbumTitle, seed_file: &Path) -> Result<AlbumId> {
        let primary = transfer::upload_photo(&self.client, seed_file).await?;
        albums::create_album(&self.client, title, &primary).await
    }

    async fn upload_photo(&self, file: &Path) -> Result<PhotoId> {
        transfer::upload_photo(&self.client, file).await
    }

    async fn download_photo(&self, photo: &PhotoId) -> Result<DownloadedPhoto> {
        transfer::download_photo(&self.client, photo).await
    }

    async fn add_photo_to_album(&self, album: &AlbumId, photo: &PhotoId) -> Result<()> {
        albums::add_photo(&self.client, album, photo).await
    }
}
