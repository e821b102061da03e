//! Flickr photo transfer operations
//!
//! Uploads go to the dedicated upload endpoint as signed multipart
//! POSTs; unlike the REST methods, that endpoint answers a small XML
//! document, parsed here with string scanning rather than a full XML
//! dependency. Downloads resolve the photo's metadata and source URL
//! via `flickr.photos.getInfo` / `flickr.photos.getSizes` and then
//! fetch the image bytes with a plain GET.

use std::path::Path;

use anyhow::{Context, Result};
use picsync_core::domain::PhotoId;
use picsync_core::ports::DownloadedPhoto;
use serde::Deserialize;
use tracing::info;

use crate::client::FlickrClient;
use crate::FlickrError;

// ============================================================================
// Upload
// ============================================================================

/// Uploads a local image file and returns the new photo's id
///
/// The photo title is taken from the file stem so remote titles compare
/// cleanly against local base names during reconciliation.
pub async fn upload_photo(client: &FlickrClient, file: &Path) -> Result<PhotoId> {
    let data = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let file_name = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow::anyhow!("Upload path {} has no file name", file.display()))?;
    let title = file
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.clone());

    // The photo content is excluded from the OAuth signature; only the
    // text parameters are signed.
    let params = client.signed_upload_params(&[("title", title.as_str())])?;
    let mut form = reqwest::multipart::Form::new();
    for (name, value) in params {
        form = form.text(name, value);
    }
    let size = data.len();
    form = form.part(
        "photo",
        reqwest::multipart::Part::bytes(data).file_name(file_name.clone()),
    );

    let reply = client
        .http_client()
        .post(client.upload_url())
        .multipart(form)
        .send()
        .await
        .with_context(|| format!("Failed to upload {}", file.display()))?
        .error_for_status()
        .with_context(|| format!("Upload of {} returned error status", file.display()))?
        .text()
        .await
        .with_context(|| format!("Failed to read upload reply for {}", file.display()))?;

    let photo = parse_upload_reply(&reply)
        .with_context(|| format!("Upload of {} was rejected", file.display()))?;

    info!(file = %file_name, photo = %photo, bytes = size, "uploaded photo");
    Ok(photo)
}

/// Parses the upload endpoint's XML reply
///
/// Success: `<rsp stat="ok"><photoid>53001</photoid></rsp>`
/// Failure: `<rsp stat="fail"><err code="5" msg="..." /></rsp>`
fn parse_upload_reply(xml: &str) -> Result<PhotoId> {
    match xml_attr(xml, "rsp", "stat").as_deref() {
        Some("ok") => {
            let id = xml_text(xml, "photoid").ok_or_else(|| {
                FlickrError::InvalidResponse("upload reply has no photoid".to_string())
            })?;
            Ok(PhotoId::new(id)?)
        }
        Some("fail") => {
            let code = xml_attr(xml, "err", "code")
                .and_then(|code| code.parse::<u64>().ok())
                .unwrap_or(0);
            let message =
                xml_attr(xml, "err", "msg").unwrap_or_else(|| "unknown error".to_string());
            Err(FlickrError::Api { code, message }.into())
        }
        _ => Err(FlickrError::InvalidResponse(
            "upload reply has no rsp status".to_string(),
        )
        .into()),
    }
}

// ============================================================================
// Download
// ============================================================================

#[derive(Debug, Deserialize)]
struct PhotoInfoEnvelope {
    photo: RawPhotoInfo,
}

#[derive(Debug, Deserialize)]
struct RawPhotoInfo {
    id: String,
    title: TextContent,
    #[serde(default)]
    originalformat: Option<String>,
}

/// Flickr's `{"_content": "..."}` text wrapper
#[derive(Debug, Deserialize)]
struct TextContent {
    #[serde(rename = "_content")]
    content: String,
}

#[derive(Debug, Deserialize)]
struct SizesEnvelope {
    sizes: RawSizes,
}

#[derive(Debug, Deserialize)]
struct RawSizes {
    #[serde(default)]
    size: Vec<RawSize>,
}

#[derive(Debug, Deserialize)]
struct RawSize {
    label: String,
    source: String,
}

/// Downloads a photo's content at the best available size
///
/// Prefers the `Original` size when the account exposes it and falls
/// back to the largest listed rendition otherwise. The suggested file
/// name is built from the photo title (or id) and the original format.
pub async fn download_photo(client: &FlickrClient, photo: &PhotoId) -> Result<DownloadedPhoto> {
    let value = client
        .call("flickr.photos.getInfo", &[("photo_id", photo.as_str())])
        .await?;
    let info: PhotoInfoEnvelope =
        serde_json::from_value(value).context("Failed to parse photo info response")?;

    let value = client
        .call("flickr.photos.getSizes", &[("photo_id", photo.as_str())])
        .await?;
    let sizes: SizesEnvelope =
        serde_json::from_value(value).context("Failed to parse photo sizes response")?;
    let source = pick_source(&sizes.sizes.size)
        .ok_or_else(|| FlickrError::InvalidResponse(format!("photo {photo} has no sizes")))?
        .source
        .clone();

    let data = client
        .http_client()
        .get(&source)
        .send()
        .await
        .with_context(|| format!("Failed to download photo {photo}"))?
        .error_for_status()
        .with_context(|| format!("Photo {photo} download returned error status"))?
        .bytes()
        .await
        .with_context(|| format!("Failed to read photo {photo} content"))?
        .to_vec();

    let file_name = photo_file_name(&info.photo, &source);
    info!(photo = %photo, file = %file_name, bytes = data.len(), "downloaded photo");
    Ok(DownloadedPhoto { file_name, data })
}

/// Picks the size to download: `Original` if present, otherwise the
/// last entry (Flickr orders sizes smallest to largest)
fn pick_source(sizes: &[RawSize]) -> Option<&RawSize> {
    sizes
        .iter()
        .find(|size| size.label == "Original")
        .or_else(|| sizes.last())
}

/// Builds the file name a downloaded photo should be stored under
fn photo_file_name(info: &RawPhotoInfo, source: &str) -> String {
    let title = info.title.content.trim();
    let stem = if title.is_empty() {
        info.id.as_str()
    } else {
        title
    };
    let ext = info
        .originalformat
        .clone()
        .or_else(|| extension_of(source))
        .unwrap_or_else(|| "jpg".to_string());
    format!("{stem}.{ext}")
}

/// Extracts a plausible file extension from a source URL
fn extension_of(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next()?;
    let segment = path.rsplit('/').next()?;
    let (_, ext) = segment.rsplit_once('.')?;
    if ext.is_empty() || ext.len() > 4 {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

// ============================================================================
// Minimal XML scanning
// ============================================================================

/// Returns the text content of the first `<tag>...</tag>` element
fn xml_text(xml: &str, tag: &str) -> Option<String> {
    let rest = &xml[xml.find(&format!("<{tag}"))?..];
    let content_start = rest.find('>')? + 1;
    let content_end = rest.find(&format!("</{tag}>"))?;
    if content_end < content_start {
        return None;
    }
    Some(rest[content_start..content_end].trim().to_string())
}

/// Returns an attribute value from the first `<tag ...>` element
fn xml_attr(xml: &str, tag: &str, attr: &str) -> Option<String> {
    let rest = &xml[xml.find(&format!("<{tag}"))?..];
    let tag_body = &rest[..rest.find('>')?];
    let needle = format!("{attr}=\"");
    let value_start = tag_body.find(&needle)? + needle.len();
    let value_rest = &tag_body[value_start..];
    Some(value_rest[..value_rest.find('"')?].to_string())
}
