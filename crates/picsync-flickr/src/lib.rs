//! picsync Flickr - Flickr REST API adapter
//!
//! Provides the remote side of a picsync synchronization:
//! - OAuth 1.0a request signing (HMAC-SHA1) for the REST and upload
//!   endpoints
//! - Photoset listing, creation, and photo attachment
//! - Photo upload (multipart) and download
//!
//! ## Modules
//!
//! - [`auth`] - Access credentials and their keyring storage
//! - [`client`] - Signed HTTP client for the Flickr endpoints
//! - [`albums`] - Photoset operations (list, create, attach)
//! - [`transfer`] - Photo upload and download
//! - [`provider`] - The `IAlbumService` port implementation

pub mod albums;
pub mod auth;
pub mod client;
pub mod provider;
pub mod transfer;

use thiserror::Error;

/// Errors that can occur when communicating with the Flickr API
#[derive(Debug, Error)]
pub enum FlickrError {
    /// The API processed the request and rejected it (`stat: "fail"`)
    #[error("Flickr API error {code}: {message}")]
    Api {
        /// Flickr error code, e.g. 1 "Photoset not found"
        code: u64,
        /// Human-readable message from the API
        message: String,
    },

    /// A network-level error occurred
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The API response could not be parsed or was malformed
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl FlickrError {
    /// True when the failure means the stored credentials are no good
    /// (invalid token, not logged in, invalid API key) and the user
    /// should re-authorize rather than retry.
    #[must_use]
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Api { code: 98 | 99 | 100, .. })
    }
}
