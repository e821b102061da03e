//! Album reconciliation
//!
//! The [`Reconciler`] compares the directory-per-album tree under the sync
//! root against the remote album list and produces one [`DiffSummary`] per
//! album: how many photos would be uploaded and how many downloaded if the
//! album were selected. Reconciliation is a pure snapshot read; it mutates
//! nothing on either side, and counts are recomputed from scratch on every
//! pass rather than updated incrementally.
//!
//! Matching is by name: a local directory belongs to the remote album with
//! the exact same title, case-sensitively. Extensions are invisible to the
//! match; a photo's identity is its file name without extension.
//!
//! One unreadable album must not blank out the whole pass: per-album
//! failures are collected as strings in the report and the remaining
//! albums are still diffed. Only a failure to list the root sides (the
//! remote album list, the local directory list) aborts the pass.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use picsync_core::domain::{AlbumTitle, DiffSummary, LocalEntry, RemoteAlbum, RemotePhoto};
use picsync_core::ports::{IAlbumService, ILocalStore};
use tracing::{debug, info, warn};

// ============================================================================
// ReconcileReport
// ============================================================================

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone)]
pub struct ReconcileReport {
    /// One summary per album, remote albums first (in service order),
    /// then local-only directories (in name order).
    pub summaries: Vec<DiffSummary>,
    /// The remote album list the summaries were computed against. Kept
    /// so that selection can resolve album ids from the same snapshot.
    pub remote_albums: Vec<RemoteAlbum>,
    /// Per-album failures, e.g. an unreadable directory. The album has
    /// no summary in that case.
    pub errors: Vec<String>,
    /// Wall-clock duration of the pass in milliseconds.
    pub duration_ms: u64,
}

impl ReconcileReport {
    /// Total number of pending transfers across all albums.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.summaries.iter().map(DiffSummary::pending).sum()
    }

    /// True when every album was diffed and nothing is pending.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.summaries.iter().all(DiffSummary::in_sync)
    }
}

// ============================================================================
// Reconciler
// ============================================================================

/// Computes per-album diff summaries from a local root and the remote
/// album list.
pub struct Reconciler {
    albums: Arc<dyn IAlbumService>,
    store: Arc<dyn ILocalStore>,
}

impl Reconciler {
    /// Create a reconciler over the given ports.
    pub fn new(albums: Arc<dyn IAlbumService>, store: Arc<dyn ILocalStore>) -> Self {
        Self { albums, store }
    }

    /// Run one reconciliation pass against `root`.
    ///
    /// The result covers the union of remote album titles and local
    /// directory names: albums present on both sides are diffed photo by
    /// photo, remote-only albums count as all-downloads, local-only
    /// directories count as all-uploads.
    ///
    /// # Errors
    /// Fails only when the remote album list or the local directory list
    /// cannot be read. Per-album failures are collected in the report.
    #[tracing::instrument(skip(self))]
    pub async fn reconcile(&self, root: &Path) -> anyhow::Result<ReconcileReport> {
        let started = Instant::now();
        info!(root = %root.display(), "starting reconciliation");

        let remote_albums = self
            .albums
            .list_albums()
            .await
            .context("listing remote albums")?;
        let local_dirs = self
            .store
            .list_directories(root)
            .await
            .with_context(|| format!("listing album directories under {}", root.display()))?;

        let mut summaries = Vec::new();
        let mut errors = Vec::new();
        let mut matched: HashSet<String> = HashSet::new();

        for album in &remote_albums {
            let title = match AlbumTitle::new(album.title.clone()) {
                Ok(title) => title,
                Err(err) => {
                    warn!(album = %album.title, error = %err, "skipping remote album with unusable title");
                    errors.push(format!("album \"{}\": {err}", album.title));
                    continue;
                }
            };

            if local_dirs.iter().any(|dir| dir == title.as_str()) {
                matched.insert(album.title.clone());
                match self.diff_album(root, album, title).await {
                    Ok(summary) => summaries.push(summary),
                    Err(err) => {
                        warn!(album = %album.title, error = format!("{err:#}"), "skipping album");
                        errors.push(format!("album \"{}\": {err:#}", album.title));
                    }
                }
            } else {
                // Remote-only: everything in it would be downloaded.
                summaries.push(DiffSummary::new(title, 0, album.photo_count as usize));
            }
        }

        for dir in &local_dirs {
            if matched.contains(dir) {
                continue;
            }
            match self.summarize_local_only(root, dir).await {
                Ok(summary) => summaries.push(summary),
                Err(err) => {
                    warn!(album = %dir, error = format!("{err:#}"), "skipping directory");
                    errors.push(format!("album \"{dir}\": {err:#}"));
                }
            }
        }

        let report = ReconcileReport {
            summaries,
            remote_albums,
            errors,
            duration_ms: started.elapsed().as_millis() as u64,
        };
        info!(
            albums = report.summaries.len(),
            pending = report.pending(),
            errors = report.errors.len(),
            duration_ms = report.duration_ms,
            "reconciliation finished"
        );
        Ok(report)
    }

    /// Diff one album that exists on both sides.
    async fn diff_album(
        &self,
        root: &Path,
        album: &RemoteAlbum,
        title: AlbumTitle,
    ) -> anyhow::Result<DiffSummary> {
        let dir = root.join(title.as_str());
        let local_files = self
            .store
            .list_image_files(&dir)
            .await
            .with_context(|| format!("listing image files in {}", dir.display()))?;
        let remote_photos = self
            .albums
            .list_photos(&album.id)
            .await
            .with_context(|| format!("listing photos of album {}", album.id))?;

        let (upload_count, download_count) = diff_counts(&local_files, &remote_photos);
        debug!(album = %title, upload_count, download_count, "album diffed");
        Ok(DiffSummary::new(title, upload_count, download_count))
    }

    /// Summarize a directory with no remote counterpart.
    async fn summarize_local_only(&self, root: &Path, dir: &str) -> anyhow::Result<DiffSummary> {
        let title = AlbumTitle::new(dir)?;
        let path = root.join(dir);
        let files = self
            .store
            .list_image_files(&path)
            .await
            .with_context(|| format!("listing image files in {}", path.display()))?;
        Ok(DiffSummary::new(title, files.len(), 0))
    }
}

/// Count the name differences between a local file list and a remote
/// photo list.
///
/// Both sides are reduced to name sets first (base name without extension
/// locally, photo title remotely), so duplicate names count once.
fn diff_counts(local: &[LocalEntry], remote: &[RemotePhoto]) -> (usize, usize) {
    let local_names: HashSet<&str> = local.iter().map(|f| f.base_name.as_str()).collect();
    let remote_names: HashSet<&str> = remote.iter().map(|p| p.title.as_str()).collect();

    let uploads = local_names.difference(&remote_names).count();
    let downloads = remote_names.difference(&local_names).count();
    (uploads, downloads)
}

// ============================================================================
// Tests
// ============================================================================
