//! Task building
//!
//! The [`TaskBuilder`] turns one selected album into the ordered list of
//! [`SyncTask`]s that would bring it in sync. Two shapes come out:
//!
//! - **Album missing remotely**: one `CreateAlbum` seeded with the first
//!   file (the service refuses empty albums), followed by an `Upload` per
//!   remaining file. Those uploads carry no album id yet; the executor
//!   fills it in once the creation has completed. An album with no
//!   qualifying files produces no tasks at all.
//! - **Album existing on both sides**: an `Upload` per local-only file
//!   (already carrying the known album id) and a `Download` per
//!   remote-only photo, uploads first.
//!
//! Ordering within the returned list is what the executor relies on: the
//! `CreateAlbum` precedes every dependent `Upload`, and the queue runs
//! strictly in enqueue order.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use picsync_core::domain::{AlbumId, AlbumTitle, LocalEntry, RemoteAlbum, RemotePhoto, SyncTask};
use picsync_core::ports::{IAlbumService, ILocalStore};
use tracing::{debug, warn};

/// Builds the task list for one selected album.
pub struct TaskBuilder {
    albums: Arc<dyn IAlbumService>,
    store: Arc<dyn ILocalStore>,
}

impl TaskBuilder {
    /// Create a builder over the given ports.
    pub fn new(albums: Arc<dyn IAlbumService>, store: Arc<dyn ILocalStore>) -> Self {
        Self { albums, store }
    }

    /// Build the ordered task list for `title`.
    ///
    /// `remote` is the album's remote counterpart from the reconciliation
    /// snapshot, or `None` when the album only exists locally. The local
    /// album directory is created if missing, so downloads for a
    /// remote-only album have somewhere to land.
    ///
    /// # Errors
    /// Fails when the album directory cannot be created or either side's
    /// listing cannot be read.
    #[tracing::instrument(skip(self, remote), fields(album = %title))]
    pub async fn build(
        &self,
        root: &Path,
        title: &AlbumTitle,
        remote: Option<&RemoteAlbum>,
    ) -> anyhow::Result<Vec<SyncTask>> {
        let dir = root.join(title.as_str());
        self.store
            .ensure_directory(&dir)
            .await
            .with_context(|| format!("creating album directory {}", dir.display()))?;
        let files = self
            .store
            .list_image_files(&dir)
            .await
            .with_context(|| format!("listing image files in {}", dir.display()))?;

        let tasks = match remote {
            None => {
                if files.is_empty() {
                    warn!(album = %title, "no qualifying files; not creating an empty album");
                    return Ok(Vec::new());
                }
                plan_new_album(title, &files)
            }
            Some(album) => {
                let photos = self
                    .albums
                    .list_photos(&album.id)
                    .await
                    .with_context(|| format!("listing photos of album {}", album.id))?;
                plan_existing_album(title, &album.id, &dir, &files, &photos)
            }
        };

        debug!(album = %title, tasks = tasks.len(), "task list built");
        Ok(tasks)
    }
}

/// Plan tasks for an album with no remote counterpart.
///
/// The first file (listings are sorted by name) seeds the album; the
/// rest become uploads that wait for the allocated album id.
fn plan_new_album(title: &AlbumTitle, files: &[LocalEntry]) -> Vec<SyncTask> {
    let mut tasks = Vec::with_capacity(files.len());
    let seed = &files[0];
    tasks.push(SyncTask::create_album(title.clone(), seed.path.clone()));
    for file in &files[1..] {
        tasks.push(SyncTask::upload(title.clone(), file.path.clone(), None));
    }
    tasks
}

/// Plan tasks for an album present on both sides: uploads for local-only
/// files, then downloads for remote-only photos.
fn plan_existing_album(
    title: &AlbumTitle,
    album_id: &AlbumId,
    dir: &Path,
    files: &[LocalEntry],
    photos: &[RemotePhoto],
) -> Vec<SyncTask> {
    let local_names: HashSet<&str> = files.iter().map(|f| f.base_name.as_str()).collect();
    let remote_names: HashSet<&str> = photos.iter().map(|p| p.title.as_str()).collect();

    let mut tasks = Vec::new();
    for file in files {
        if !remote_names.contains(file.base_name.as_str()) {
            tasks.push(SyncTask::upload(
                title.clone(),
                file.path.clone(),
                Some(album_id.clone()),
            ));
        }
    }
    for photo in photos {
        if !local_names.contains(photo.title.as_str()) {
            tasks.push(SyncTask::download(
                title.clone(),
                photo.id.clone(),
                dir.to_path_buf(),
            ));
        }
    }
    tasks
}

// ============================================================================
// Tests
// ============================================================================
