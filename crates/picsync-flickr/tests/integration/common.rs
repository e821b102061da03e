//! Shared test helpers for Flickr API integration tests
//!
//! Provides wiremock-based mock server setup for the Flickr REST and
//! upload endpoints. REST methods all share one path and are told apart
//! by the `method` query parameter, so helpers mount matchers on that.

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use picsync_flickr::auth::FlickrCredentials;
use picsync_flickr::client::FlickrClient;

/// Credentials used by every test; signatures are computed but never
/// verified by the mock server.
pub fn test_credentials() -> FlickrCredentials {
    FlickrCredentials::new(
        "test-consumer-key",
        "test-consumer-secret",
        "test-token",
        "test-token-secret",
    )
}

/// Starts a mock server and returns it with a client pointing at it.
pub async fn setup_flickr_mock() -> (MockServer, FlickrClient) {
    let server = MockServer::start().await;
    let client = FlickrClient::with_base_urls(
        test_credentials(),
        format!("{}/services/rest", server.uri()),
        format!("{}/services/upload", server.uri()),
    );
    (server, client)
}

/// Mounts a REST method that answers with the given JSON body.
pub async fn mount_rest_json(server: &MockServer, api_method: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/services/rest"))
        .and(query_param("method", api_method))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Mounts a single-page photoset list response.
pub async fn mount_album_list(server: &MockServer, photosets: serde_json::Value) {
    mount_rest_json(
        server,
        "flickr.photosets.getList",
        serde_json::json!({
            "stat": "ok",
            "photosets": {"page": 1, "pages": 1, "photoset": photosets}
        }),
    )
    .await;
}

/// Mounts the upload endpoint with a fixed XML reply.
pub async fn mount_upload_reply(server: &MockServer, xml: &str) {
    Mock::given(method("POST"))
        .and(path("/services/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(xml.as_bytes().to_vec(), "text/xml"))
        .mount(server)
        .await;
}

/// Mounts a photo content endpoint serving raw bytes.
pub async fn mount_photo_content(server: &MockServer, url_path: &str, content: &[u8]) {
    Mock::given(method("GET"))
        .and(path(url_path))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(content.to_vec())
                .append_header("Content-Type", "image/jpeg"),
        )
        .mount(server)
        .await;
}
