//! Local picture store port (driven/secondary port)
//!
//! This module defines the interface for the local side of a sync: the
//! directory-per-album tree under the configured root.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because filesystem errors are adapter-specific.
//! - Listings are sorted by name so "the first file" of an album is a
//!   stable, deterministic notion (it seeds album creation).
//! - `list_image_files` applies the image-extension filter; everything
//!   else in the directory is invisible to the sync.

use std::path::Path;

use crate::domain::album::LocalEntry;

/// Port trait for local picture storage
#[async_trait::async_trait]
pub trait ILocalStore: Send + Sync {
    /// List the first-level directory names under `root`, sorted by name
    ///
    /// Non-directory entries are skipped. Directory names that are not
    /// valid UTF-8 are skipped as well; they cannot match any remote
    /// title.
    async fn list_directories(&self, root: &Path) -> anyhow::Result<Vec<String>>;

    /// List the image files directly inside `dir`, sorted by file name
    ///
    /// Applies the image-extension filter (`png`/`jpg`/`gif`,
    /// case-insensitive). Subdirectories are not descended into.
    async fn list_image_files(&self, dir: &Path) -> anyhow::Result<Vec<LocalEntry>>;

    /// Create a directory and all parents as needed (`mkdir -p`)
    async fn ensure_directory(&self, path: &Path) -> anyhow::Result<()>;

    /// Write data to a file, replacing any existing content
    ///
    /// Writes atomically (temp file + rename) and creates parent
    /// directories as needed.
    async fn write_file(&self, path: &Path, data: &[u8]) -> anyhow::Result<()>;
}
