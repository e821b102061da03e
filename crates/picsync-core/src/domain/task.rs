//! Synchronization tasks
//!
//! A [`SyncTask`] is one unit of executor work. Tasks are built per album
//! in a fixed order: a `CreateAlbum` always precedes the uploads that
//! depend on its resulting album id, and uploads precede downloads. The
//! `done` flag flips only on successful completion; a failed task stays
//! not-done and is reported instead.
//!
//! Uploads into an album that does not exist remotely yet are built with
//! `album_id: None`; the executor publishes the id produced by the
//! album-creation task into them before they run.

use std::path::{Path, PathBuf};

use super::newtypes::{AlbumId, AlbumTitle, PhotoId, TaskId};

/// What a task does when executed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskKind {
    /// Create the remote album, seeded with one local file (the service
    /// cannot create empty albums)
    CreateAlbum {
        /// The file uploaded as the album's first photo
        seed_file: PathBuf,
    },
    /// Upload one local file and attach it to the album
    Upload {
        /// The file to upload
        file: PathBuf,
        /// Resolved album id; `None` until the album-creation result is
        /// published
        album_id: Option<AlbumId>,
    },
    /// Download one remote photo into the album directory
    Download {
        /// The photo to fetch
        photo_id: PhotoId,
        /// Directory the photo is written into
        target_dir: PathBuf,
    },
}

/// One unit of synchronization work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncTask {
    id: TaskId,
    album_title: AlbumTitle,
    kind: TaskKind,
    done: bool,
}

impl SyncTask {
    /// Build an album-creation task
    #[must_use]
    pub fn create_album(album_title: AlbumTitle, seed_file: PathBuf) -> Self {
        Self {
            id: TaskId::new(),
            album_title,
            kind: TaskKind::CreateAlbum { seed_file },
            done: false,
        }
    }

    /// Build an upload task; `album_id` is `None` when the album does not
    /// exist remotely yet
    #[must_use]
    pub fn upload(album_title: AlbumTitle, file: PathBuf, album_id: Option<AlbumId>) -> Self {
        Self {
            id: TaskId::new(),
            album_title,
            kind: TaskKind::Upload { file, album_id },
            done: false,
        }
    }

    /// Build a download task
    #[must_use]
    pub fn download(album_title: AlbumTitle, photo_id: PhotoId, target_dir: PathBuf) -> Self {
        Self {
            id: TaskId::new(),
            album_title,
            kind: TaskKind::Download {
                photo_id,
                target_dir,
            },
            done: false,
        }
    }

    /// Task identifier
    #[must_use]
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// The album this task belongs to
    #[must_use]
    pub fn album_title(&self) -> &AlbumTitle {
        &self.album_title
    }

    /// The task's operation
    #[must_use]
    pub fn kind(&self) -> &TaskKind {
        &self.kind
    }

    /// Whether the task completed successfully
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Mark the task as successfully completed
    pub fn mark_done(&mut self) {
        self.done = true;
    }

    /// Fill in the album id on a pending upload that lacks one
    ///
    /// Returns true if the id was written (the task is an upload of this
    /// album, not done, and had no id yet).
    pub fn fill_album_id(&mut self, title: &AlbumTitle, id: &AlbumId) -> bool {
        if self.done || self.album_title != *title {
            return false;
        }
        match &mut self.kind {
            TaskKind::Upload { album_id, .. } if album_id.is_none() => {
                *album_id = Some(id.clone());
                true
            }
            _ => false,
        }
    }

    /// Human-readable one-line description for logs and reports
    #[must_use]
    pub fn describe(&self) -> String {
        match &self.kind {
            TaskKind::CreateAlbum { seed_file } => format!(
                "create album \"{}\" (seed {})",
                self.album_title,
                file_name_of(seed_file)
            ),
            TaskKind::Upload { file, .. } => format!(
                "upload {} to \"{}\"",
                file_name_of(file),
                self.album_title
            ),
            TaskKind::Download { photo_id, .. } => {
                format!("download photo {} into \"{}\"", photo_id, self.album_title)
            }
        }
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ============================================================================
// Tests
// ============================================================================
