//! Flickr photoset operations
//!
//! Wraps the `flickr.photosets.*` REST methods behind typed functions.
//! Flickr's JSON is idiosyncratic: titles arrive as `{"_content": ...}`
//! objects, numeric fields sometimes arrive as strings, and list
//! responses are paginated with `page`/`pages` counters. The raw
//! response shapes live here as private structs and are converted to
//! domain types before leaving the module.

use anyhow::{Context, Result};
use picsync_core::domain::{AlbumId, AlbumTitle, PhotoId, RemoteAlbum, RemotePhoto};
use serde::Deserialize;
use tracing::{debug, info};

use crate::client::FlickrClient;

/// Page size for paginated listing calls (Flickr's maximum)
const PER_PAGE: &str = "500";

// ============================================================================
// Raw response shapes
// ============================================================================

/// A field Flickr serves either as a JSON number or a numeric string
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(u64),
    String(String),
}

impl NumberOrString {
    fn as_u64(&self) -> u64 {
        match self {
            NumberOrString::Number(n) => *n,
            NumberOrString::String(s) => s.parse().unwrap_or(0),
        }
    }
}

impl Default for NumberOrString {
    fn default() -> Self {
        NumberOrString::Number(0)
    }
}

/// Flickr's `{"_content": "..."}` text wrapper
#[derive(Debug, Deserialize)]
struct TextContent {
    #[serde(rename = "_content")]
    content: String,
}

#[derive(Debug, Deserialize)]
struct PhotosetListEnvelope {
    photosets: PhotosetList,
}

#[derive(Debug, Deserialize)]
struct PhotosetList {
    #[serde(default)]
    page: NumberOrString,
    #[serde(default)]
    pages: NumberOrString,
    #[serde(default)]
    photoset: Vec<RawPhotoset>,
}

#[derive(Debug, Deserialize)]
struct RawPhotoset {
    id: String,
    title: TextContent,
    #[serde(default)]
    photos: NumberOrString,
}

#[derive(Debug, Deserialize)]
struct PhotosetPhotosEnvelope {
    photoset: PhotosetPhotos,
}

#[derive(Debug, Deserialize)]
struct PhotosetPhotos {
    #[serde(default)]
    page: NumberOrString,
    #[serde(default)]
    pages: NumberOrString,
    #[serde(default)]
    photo: Vec<RawPhoto>,
}

#[derive(Debug, Deserialize)]
struct RawPhoto {
    id: String,
    #[serde(default)]
    title: String,
}

#[derive(Debug, Deserialize)]
struct CreateEnvelope {
    photoset: CreatedPhotoset,
}

#[derive(Debug, Deserialize)]
struct CreatedPhotoset {
    id: String,
}

// ============================================================================
// Operations
// ============================================================================

/// Lists all photosets of the authenticated user
///
/// Follows the `page`/`pages` counters until the full set has been
/// fetched.
pub async fn list_albums(client: &FlickrClient) -> Result<Vec<RemoteAlbum>> {
    let mut albums = Vec::new();
    let mut page: u64 = 1;
    loop {
        let page_str = page.to_string();
        let value = client
            .call(
                "flickr.photosets.getList",
                &[("per_page", PER_PAGE), ("page", page_str.as_str())],
            )
            .await?;
        let envelope: PhotosetListEnvelope = serde_json::from_value(value)
            .context("Failed to parse photoset list response")?;

        for raw in envelope.photosets.photoset {
            albums.push(parse_album(raw)?);
        }

        let pages = envelope.photosets.pages.as_u64().max(1);
        if envelope.photosets.page.as_u64().max(page) >= pages {
            break;
        }
        page += 1;
    }

    debug!(count = albums.len(), "listed remote albums");
    Ok(albums)
}

/// Lists the photos of a single photoset
pub async fn list_photos(client: &FlickrClient, album: &AlbumId) -> Result<Vec<RemotePhoto>> {
    let mut photos = Vec::new();
    let mut page: u64 = 1;
    loop {
        let page_str = page.to_string();
        let value = client
            .call(
                "flickr.photosets.getPhotos",
                &[
                    ("photoset_id", album.as_str()),
                    ("per_page", PER_PAGE),
                    ("page", page_str.as_str()),
                ],
            )
            .await?;
        let envelope: PhotosetPhotosEnvelope = serde_json::from_value(value)
            .context("Failed to parse photoset photos response")?;

        for raw in envelope.photoset.photo {
            photos.push(RemotePhoto {
                id: PhotoId::new(raw.id)?,
                title: raw.title,
            });
        }

        let pages = envelope.photoset.pages.as_u64().max(1);
        if envelope.photoset.page.as_u64().max(page) >= pages {
            break;
        }
        page += 1;
    }

    debug!(album = %album, count = photos.len(), "listed album photos");
    Ok(photos)
}

/// Creates a photoset around an already-uploaded primary photo
///
/// Flickr refuses to create an empty photoset, so the first photo must
/// be uploaded before this call and its id passed as the primary.
pub async fn create_album(
    client: &FlickrClient,
    title: &AlbumTitle,
    primary: &PhotoId,
) -> Result<AlbumId> {
    let value = client
        .call(
            "flickr.photosets.create",
            &[
                ("title", title.as_str()),
                ("primary_photo_id", primary.as_str()),
            ],
        )
        .await?;
    let envelope: CreateEnvelope =
        serde_json::from_value(value).context("Failed to parse photoset create response")?;
    let id = AlbumId::new(envelope.photoset.id)?;

    info!(album = %title, id = %id, "created remote album");
    Ok(id)
}

/// Adds an uploaded photo to an existing photoset
pub async fn add_photo(client: &FlickrClient, album: &AlbumId, photo: &PhotoId) -> Result<()> {
    client
        .call(
            "flickr.photosets.addPhoto",
            &[
                ("photoset_id", album.as_str()),
                ("photo_id", photo.as_str()),
            ],
        )
        .await?;

    debug!(album = %album, photo = %photo, "added photo to album");
    Ok(())
}

fn parse_album(raw: RawPhotoset) -> Result<RemoteAlbum> {
    Ok(RemoteAlbum {
        id: AlbumId::new(raw.id)?,
        title: raw.title.content,
        photo_count: raw.photos.as_u64(),
    })
}
