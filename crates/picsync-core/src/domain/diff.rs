//! Per-album diff summaries
//!
//! A [`DiffSummary`] is the unit of the reconciliation output: one row per
//! album, counting how many photos would be uploaded and how many would be
//! downloaded if the album were selected for synchronization. Summaries
//! are pure data; producing them mutates nothing on either side.

use serde::Serialize;

use super::newtypes::AlbumTitle;

/// Pending work for one album, as computed by reconciliation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffSummary {
    /// The album title, identical on both sides by definition
    pub title: AlbumTitle,
    /// Number of distinct local base names with no matching remote title
    pub upload_count: usize,
    /// Number of remote photo titles with no matching local base name
    pub download_count: usize,
}

impl DiffSummary {
    /// Create a summary
    #[must_use]
    pub fn new(title: AlbumTitle, upload_count: usize, download_count: usize) -> Self {
        Self {
            title,
            upload_count,
            download_count,
        }
    }

    /// True when the album needs no transfers in either direction
    #[must_use]
    pub fn in_sync(&self) -> bool {
        self.upload_count == 0 && self.download_count == 0
    }

    /// Total number of pending transfers
    #[must_use]
    pub fn pending(&self) -> usize {
        self.upload_count + self.download_count
    }
}
