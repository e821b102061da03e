//! Local store adapter (secondary/driven adapter)
//!
//! Implements [`ILocalStore`] using `tokio::fs` for async file operations.
//!
//! ## Design Decisions
//!
//! - **Atomic writes**: Uses write-to-temp + rename so a crash mid-download
//!   never leaves a half-written photo that would shadow the remote copy on
//!   the next reconciliation.
//! - **Sorted listings**: Directory and file listings are sorted by name;
//!   the first file of a sorted listing is the seed photo for album
//!   creation, so the order must be stable across runs.
//! - **Image filter at the boundary**: [`LocalEntry::from_path`] applies
//!   the png/jpg/gif extension filter; everything else never reaches the
//!   reconciliation logic.

use std::path::Path;

use picsync_core::domain::LocalEntry;
use picsync_core::ports::ILocalStore;
use tracing::{debug, instrument};

// ============================================================================
// LocalStoreAdapter struct
// ============================================================================

/// Adapter that bridges the [`ILocalStore`] port to the real filesystem.
///
/// This is a zero-sized struct because all operations derive their context
/// from the path arguments. Configuration (e.g. the sync root) lives at a
/// higher layer.
#[derive(Debug, Clone, Default)]
pub struct LocalStoreAdapter;

impl LocalStoreAdapter {
    /// Create a new `LocalStoreAdapter`.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

// ============================================================================
// ILocalStore implementation
// ============================================================================

#[async_trait::async_trait]
impl ILocalStore for LocalStoreAdapter {
    // list_directories - first-level album directories, sorted by name
    #[instrument(skip(self), fields(root = %root.display()))]
    async fn list_directories(&self, root: &Path) -> anyhow::Result<Vec<String>> {
        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(root).await?;

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            match entry.file_name().to_str() {
                Some(name) => names.push(name.to_string()),
                None => {
                    debug!(entry = ?entry.file_name(), "skipping non-UTF-8 directory name");
                }
            }
        }

        names.sort();
        debug!(count = names.len(), "directories listed");
        Ok(names)
    }

    // list_image_files - extension-filtered entries, sorted by file name
    #[instrument(skip(self), fields(dir = %dir.display()))]
    async fn list_image_files(&self, dir: &Path) -> anyhow::Result<Vec<LocalEntry>> {
        let mut files = Vec::new();
        let mut entries = tokio::fs::read_dir(dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(local) = LocalEntry::from_path(&entry.path()) {
                files.push(local);
            }
        }

        // Same-directory paths order like their file names.
        files.sort_by(|a, b| a.path.cmp(&b.path));
        debug!(count = files.len(), "image files listed");
        Ok(files)
    }

    // ensure_directory - mkdir -p semantics
    #[instrument(skip(self), fields(path = %path.display()))]
    async fn ensure_directory(&self, path: &Path) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(path).await?;
        debug!("directory ensured");
        Ok(())
    }

    // write_file - atomic write via temp + rename
    #[instrument(skip(self, data), fields(path = %path.display(), bytes = data.len()))]
    async fn write_file(&self, path: &Path, data: &[u8]) -> anyhow::Result<()> {
        // Ensure parent directory exists.
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Write to a temporary file in the same directory so rename is atomic
        // (same filesystem).
        let tmp_path = {
            let mut p = path.as_os_str().to_owned();
            p.push(".tmp");
            std::path::PathBuf::from(p)
        };

        debug!(?tmp_path, "writing to temporary file");
        tokio::fs::write(&tmp_path, data).await?;

        debug!("renaming temporary file to target");
        tokio::fs::rename(&tmp_path, path).await?;

        debug!("write complete");
        Ok(())
    }
}

// ============================================================================
// Unit tests
// ============================================================================
