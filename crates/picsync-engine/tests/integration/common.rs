//! Shared test helpers for the engine integration tests
//!
//! Provides an in-memory [`FakeAlbumService`] standing in for the remote
//! side, plus helpers for building a local album tree in a temp
//! directory. The local side always goes through the real
//! [`LocalStoreAdapter`], so the filesystem adapter is exercised along
//! the way.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use picsync_core::domain::{AlbumId, AlbumTitle, PhotoId, RemoteAlbum, RemotePhoto};
use picsync_core::ports::{DownloadedPhoto, IAlbumService};
use picsync_engine::{LocalStoreAdapter, SyncCoordinator};
use tempfile::TempDir;
use tokio::sync::mpsc;

/// Blocks one upload forever and signals when it has started; used to
/// park the executor mid-batch so cancellation can be tested
/// deterministically.
struct UploadGate {
    base_name: String,
    started_tx: mpsc::Sender<()>,
}

/// In-memory album service.
///
/// Seeded state and recorded calls live behind std mutexes; accessor
/// methods hand out clones so tests can assert on the effects of a run.
#[derive(Default)]
pub struct FakeAlbumService {
    albums: Mutex<Vec<RemoteAlbum>>,
    /// Album id -> photos currently in that album.
    photos: Mutex<HashMap<String, Vec<RemotePhoto>>>,
    /// Photo id -> downloadable content.
    content: Mutex<HashMap<String, DownloadedPhoto>>,
    /// Photo id -> title, for uploads not yet attached to an album.
    pending_titles: Mutex<HashMap<String, String>>,
    created_albums: Mutex<Vec<String>>,
    uploaded_files: Mutex<Vec<PathBuf>>,
    /// (album id, photo id) pairs, in call order.
    attachments: Mutex<Vec<(String, String)>>,
    /// Base names whose upload fails with a transfer error.
    failing_uploads: Mutex<Vec<String>>,
    /// Album ids whose photo listing fails.
    failing_listings: Mutex<Vec<String>>,
    gate: Mutex<Option<UploadGate>>,
    next_id: AtomicU64,
}

impl FakeAlbumService {
    /// Seed one remote album. `photos` are `(photo id, title)` pairs;
    /// each photo gets downloadable content named `{title}.jpg`.
    pub fn seed_album(&self, id: &str, title: &str, photos: &[(&str, &str)]) {
        self.albums.lock().unwrap().push(RemoteAlbum {
            id: AlbumId::new(id).unwrap(),
            title: title.to_string(),
            photo_count: photos.len() as u64,
        });
        let remote: Vec<RemotePhoto> = photos
            .iter()
            .map(|(photo_id, photo_title)| RemotePhoto {
                id: PhotoId::new(*photo_id).unwrap(),
                title: (*photo_title).to_string(),
            })
            .collect();
        self.photos.lock().unwrap().insert(id.to_string(), remote);
        let mut content = self.content.lock().unwrap();
        for (photo_id, photo_title) in photos {
            content.insert(
                (*photo_id).to_string(),
                DownloadedPhoto {
                    file_name: format!("{photo_title}.jpg"),
                    data: format!("content-of-{photo_id}").into_bytes(),
                },
            );
        }
    }

    /// Make uploads of files with this base name fail.
    pub fn fail_uploads_of(&self, base_name: &str) {
        self.failing_uploads
            .lock()
            .unwrap()
            .push(base_name.to_string());
    }

    /// Make photo listing fail for this album id.
    pub fn fail_photo_listing_for(&self, album_id: &str) {
        self.failing_listings
            .lock()
            .unwrap()
            .push(album_id.to_string());
    }

    /// Park the upload of `base_name` forever; the returned receiver
    /// fires once that upload has started.
    pub fn gate_upload(&self, base_name: &str) -> mpsc::Receiver<()> {
        let (started_tx, started_rx) = mpsc::channel(1);
        *self.gate.lock().unwrap() = Some(UploadGate {
            base_name: base_name.to_string(),
            started_tx,
        });
        started_rx
    }

    pub fn remote_albums(&self) -> Vec<RemoteAlbum> {
        self.albums.lock().unwrap().clone()
    }

    pub fn created_albums(&self) -> Vec<String> {
        self.created_albums.lock().unwrap().clone()
    }

    pub fn uploaded_files(&self) -> Vec<PathBuf> {
        self.uploaded_files.lock().unwrap().clone()
    }

    pub fn attachments(&self) -> Vec<(String, String)> {
        self.attachments.lock().unwrap().clone()
    }

    fn fresh_id(&self, prefix: &str) -> String {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{prefix}-{n}")
    }
}

#[async_trait]
impl IAlbumService for FakeAlbumService {
    async fn list_albums(&self) -> anyhow::Result<Vec<RemoteAlbum>> {
        Ok(self.albums.lock().unwrap().clone())
    }

    async fn list_photos(&self, album: &AlbumId) -> anyhow::Result<Vec<RemotePhoto>> {
        if self
            .failing_listings
            .lock()
            .unwrap()
            .iter()
            .any(|id| id == album.as_str())
        {
            anyhow::bail!("photo listing unavailable for album {album}");
        }
        Ok(self
            .photos
            .lock()
            .unwrap()
            .get(album.as_str())
            .cloned()
            .unwrap_or_default())
    }

    async fn create_album(&self, title: &AlbumTitle, seed_file: &Path) -> anyhow::Result<AlbumId> {
        let id = self.fresh_id("album");
        let seed_photo_id = self.fresh_id("photo");
        let seed_title = base_name(seed_file);

        self.created_albums.lock().unwrap().push(title.to_string());
        self.albums.lock().unwrap().push(RemoteAlbum {
            id: AlbumId::new(&id).unwrap(),
            title: title.to_string(),
            photo_count: 1,
        });
        self.photos.lock().unwrap().insert(
            id.clone(),
            vec![RemotePhoto {
                id: PhotoId::new(&seed_photo_id).unwrap(),
                title: seed_title,
            }],
        );
        Ok(AlbumId::new(id).unwrap())
    }

    async fn upload_photo(&self, file: &Path) -> anyhow::Result<PhotoId> {
        let name = base_name(file);

        let gate_tx = {
            let gate = self.gate.lock().unwrap();
            gate.as_ref()
                .filter(|g| g.base_name == name)
                .map(|g| g.started_tx.clone())
        };
        if let Some(tx) = gate_tx {
            let _ = tx.send(()).await;
            // Parked until the executor drops this future.
            std::future::pending::<()>().await;
        }

        if self.failing_uploads.lock().unwrap().iter().any(|n| n == &name) {
            anyhow::bail!("upload rejected for {}", file.display());
        }

        let id = self.fresh_id("photo");
        self.uploaded_files.lock().unwrap().push(file.to_path_buf());
        self.pending_titles.lock().unwrap().insert(id.clone(), name);
        Ok(PhotoId::new(id).unwrap())
    }

    async fn download_photo(&self, photo: &PhotoId) -> anyhow::Result<DownloadedPhoto> {
        self.content
            .lock()
            .unwrap()
            .get(photo.as_str())
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no content for photo {photo}"))
    }

    async fn add_photo_to_album(&self, album: &AlbumId, photo: &PhotoId) -> anyhow::Result<()> {
        let title = self
            .pending_titles
            .lock()
            .unwrap()
            .remove(photo.as_str())
            .unwrap_or_else(|| photo.to_string());
        self.attachments
            .lock()
            .unwrap()
            .push((album.to_string(), photo.to_string()));
        self.photos
            .lock()
            .unwrap()
            .entry(album.as_str().to_string())
            .or_default()
            .push(RemotePhoto {
                id: photo.clone(),
                title,
            });
        if let Some(entry) = self
            .albums
            .lock()
            .unwrap()
            .iter_mut()
            .find(|a| a.id.as_str() == album.as_str())
        {
            entry.photo_count += 1;
        }
        Ok(())
    }
}

fn base_name(file: &Path) -> String {
    file.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// A temp sync root, a fake service, and a coordinator wired over both.
pub fn setup() -> (TempDir, Arc<FakeAlbumService>, Arc<SyncCoordinator>) {
    let root = tempfile::tempdir().unwrap();
    let service = Arc::new(FakeAlbumService::default());
    let coordinator = Arc::new(SyncCoordinator::new(
        service.clone(),
        Arc::new(LocalStoreAdapter::new()),
        root.path().to_path_buf(),
    ));
    (root, service, coordinator)
}

/// Create `root/album` containing the given files.
pub async fn write_local_album(root: &Path, album: &str, files: &[&str]) {
    let dir = root.join(album);
    tokio::fs::create_dir_all(&dir).await.unwrap();
    for name in files {
        tokio::fs::write(dir.join(name), format!("pixels-of-{name}"))
            .await
            .unwrap();
    }
}

pub fn title(s: &str) -> AlbumTitle {
    AlbumTitle::new(s).unwrap()
}
