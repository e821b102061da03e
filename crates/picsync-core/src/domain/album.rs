//! Album and photo entities
//!
//! Remote entities carry exactly what the hosting service reports; their
//! raw titles stay plain strings and are only promoted to [`AlbumTitle`]
//! when they have to name a directory or a task. Local entries apply the
//! image-extension filter at construction time.
//!
//! [`AlbumTitle`]: super::newtypes::AlbumTitle

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::newtypes::{AlbumId, PhotoId};

/// A remote album (photoset) as listed by the hosting service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteAlbum {
    /// Service-assigned identifier
    pub id: AlbumId,
    /// Raw album title; matching against local directories is exact and
    /// case-sensitive
    pub title: String,
    /// Number of photos the service reports for this album
    pub photo_count: u64,
}

/// A remote photo within an album
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePhoto {
    /// Service-assigned identifier
    pub id: PhotoId,
    /// Photo title; matched against local base names exactly
    pub title: String,
}

// ============================================================================
// Image-extension filter
// ============================================================================

/// The image kinds that participate in synchronization
///
/// The filter is deliberately literal: `png`, `jpg`, and `gif`, compared
/// case-insensitively. `jpeg` and every other extension are not sync
/// material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    Png,
    Jpg,
    Gif,
}

impl ImageKind {
    /// Parse a file extension (without the dot) into an image kind
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" => Some(Self::Jpg),
            "gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// Canonical lowercase extension
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpg => "jpg",
            Self::Gif => "gif",
        }
    }
}

/// A local image file inside an album directory
///
/// The base name (file stem) is the photo's identity for matching against
/// remote photo titles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalEntry {
    /// Full path to the file
    pub path: PathBuf,
    /// File stem, matched exactly against remote photo titles
    pub base_name: String,
    /// Which image kind the extension resolved to
    pub kind: ImageKind,
}

impl LocalEntry {
    /// Build a LocalEntry from a path, applying the image filter
    ///
    /// Returns `None` for paths without a stem or extension, with an
    /// extension outside the filter, or with non-UTF-8 name components.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        let kind = ImageKind::from_extension(ext)?;
        let base_name = path.file_stem()?.to_str()?.to_string();

        Some(Self {
            path: path.to_path_buf(),
            base_name,
            kind,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
