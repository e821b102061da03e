//! Integration tests for photo uploads and downloads
//!
//! Verifies end-to-end behavior of the transfer module and the
//! [`FlickrAlbumService`] provider against a wiremock-based mock:
//! - Multipart upload with signed text parameters and XML reply parsing
//! - Upload rejection mapped to typed errors
//! - Download via photo info, size selection, and content fetch
//! - Seed-upload-then-create sequencing in the provider

use picsync_core::domain::{AlbumTitle, PhotoId};
use picsync_core::ports::IAlbumService;
use picsync_flickr::provider::FlickrAlbumService;
use picsync_flickr::{transfer, FlickrError};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use crate::common;

#[tokio::test]
async fn test_upload_returns_photo_id() {
    let (server, client) = common::setup_flickr_mock().await;

    common::mount_upload_reply(
        &server,
        r#"<?xml version="1.0" encoding="utf-8" ?>
<rsp stat="ok"><photoid>53001</photoid></rsp>"#,
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("sunset.jpg");
    std::fs::write(&file, b"jpeg-pixels").unwrap();

    let photo = transfer::upload_photo(&client, &file)
        .await
        .expect("upload failed");
    assert_eq!(photo.as_str(), "53001");

    // The multipart body carries the signed text parameters and the
    // file content.
    let requests = server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method.to_string(), "POST");
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("oauth_signature"));
    assert!(body.contains("jpeg-pixels"));
    assert!(body.contains("sunset"));
}

#[tokio::test]
async fn test_upload_rejection_maps_to_api_error() {
    let (server, client) = common::setup_flickr_mock().await;

    common::mount_upload_reply(
        &server,
        r#"<?xml version="1.0" encoding="utf-8" ?>
<rsp stat="fail"><err code="5" msg="Filetype was not recognised" /></rsp>"#,
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("notes.gif");
    std::fs::write(&file, b"not-a-gif").unwrap();

    let err = transfer::upload_photo(&client, &file).await.unwrap_err();
    let flickr = err
        .downcast_ref::<FlickrError>()
        .expect("expected a FlickrError in the chain");
    match flickr {
        FlickrError::Api { code, message } => {
            assert_eq!(*code, 5);
            assert_eq!(message, "Filetype was not recognised");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_download_resolves_name_and_content() {
    let (server, client) = common::setup_flickr_mock().await;

    common::mount_rest_json(
        &server,
        "flickr.photos.getInfo",
        serde_json::json!({
            "stat": "ok",
            "photo": {
                "id": "53001",
                "title": {"_content": "sunset"},
                "originalformat": "png"
            }
        }),
    )
    .await;
    common::mount_rest_json(
        &server,
        "flickr.photos.getSizes",
        serde_json::json!({
            "stat": "ok",
            "sizes": {
                "size": [
                    {"label": "Medium", "source": format!("{}/photos/53001_m.jpg", server.uri()), "width": 500},
                    {"label": "Original", "source": format!("{}/photos/53001_o.png", server.uri()), "width": 4000}
                ]
            }
        }),
    )
    .await;
    common::mount_photo_content(&server, "/photos/53001_o.png", b"original-pixels").await;

    let photo = PhotoId::new("53001").unwrap();
    let downloaded = transfer::download_photo(&client, &photo)
        .await
        .expect("download failed");

    assert_eq!(downloaded.file_name, "sunset.png");
    assert_eq!(downloaded.data, b"original-pixels");
}

#[tokio::test]
async fn test_download_without_original_takes_largest() {
    let (server, client) = common::setup_flickr_mock().await;

    common::mount_rest_json(
        &server,
        "flickr.photos.getInfo",
        serde_json::json!({
            "stat": "ok",
            "photo": {"id": "53002", "title": {"_content": ""}}
        }),
    )
    .await;
    common::mount_rest_json(
        &server,
        "flickr.photos.getSizes",
        serde_json::json!({
            "stat": "ok",
            "sizes": {
                "size": [
                    {"label": "Small", "source": format!("{}/photos/53002_s.jpg", server.uri())},
                    {"label": "Large", "source": format!("{}/photos/53002_b.jpg", server.uri())}
                ]
            }
        }),
    )
    .await;
    common::mount_photo_content(&server, "/photos/53002_b.jpg", b"large-pixels").await;

    let photo = PhotoId::new("53002").unwrap();
    let downloaded = transfer::download_photo(&client, &photo)
        .await
        .expect("download failed");

    // Untitled photo falls back to its id; extension comes from the
    // source URL because no original format was reported.
    assert_eq!(downloaded.file_name, "53002.jpg");
    assert_eq!(downloaded.data, b"large-pixels");
}

#[tokio::test]
async fn test_provider_creates_album_by_uploading_seed_first() {
    let (server, client) = common::setup_flickr_mock().await;

    common::mount_upload_reply(
        &server,
        r#"<rsp stat="ok"><photoid>53010</photoid></rsp>"#,
    )
    .await;
    // The create call must carry the id the upload just returned.
    Mock::given(method("GET"))
        .and(path("/services/rest"))
        .and(query_param("method", "flickr.photosets.create"))
        .and(query_param("title", "Trip"))
        .and(query_param("primary_photo_id", "53010"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "stat": "ok",
            "photoset": {"id": "72157600000777"}
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let seed = dir.path().join("a.jpg");
    std::fs::write(&seed, b"seed-pixels").unwrap();

    let service = FlickrAlbumService::with_client(client);
    let title = AlbumTitle::new("Trip").unwrap();
    let id = service
        .create_album(&title, &seed)
        .await
        .expect("creation failed");

    assert_eq!(id.as_str(), "72157600000777");

    let requests = server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].url.path(), "/services/upload");
    assert_eq!(requests[1].url.path(), "/services/rest");
}
