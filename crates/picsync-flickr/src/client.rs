//! Flickr REST API client
//!
//! Provides a signed HTTP client for the Flickr endpoints. Flickr uses
//! OAuth 1.0a: every request carries a fresh nonce and timestamp plus an
//! HMAC-SHA1 signature computed over the HTTP method, the endpoint URL,
//! and all request parameters in sorted, percent-encoded form. The REST
//! endpoint answers JSON (`format=json&nojsoncallback=1`) wrapped in a
//! `stat` envelope, which this client checks before handing the payload
//! to the caller.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use picsync_flickr::auth::FlickrCredentials;
//! use picsync_flickr::client::FlickrClient;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let credentials = FlickrCredentials::new("key", "secret", "token", "token-secret");
//! let client = FlickrClient::new(credentials);
//! let value = client.call("flickr.test.login", &[]).await?;
//! println!("logged in as {}", value["user"]["username"]["_content"]);
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hmac::{Hmac, Mac};
use serde_json::Value;
use sha1::Sha1;
use tracing::debug;

use crate::auth::FlickrCredentials;
use crate::FlickrError;

/// Base URL for the Flickr REST endpoint
const REST_URL: &str = "https://api.flickr.com/services/rest";

/// Base URL for the Flickr photo upload endpoint
const UPLOAD_URL: &str = "https://up.flickr.com/services/upload";

type HmacSha1 = Hmac<Sha1>;

// ============================================================================
// FlickrClient
// ============================================================================

/// Signed HTTP client for Flickr API calls
///
/// Wraps `reqwest::Client` with OAuth 1.0a request signing and the JSON
/// envelope check. One client serves both the REST endpoint (method
/// calls) and the upload endpoint (multipart POSTs assembled in
/// [`crate::transfer`]).
pub struct FlickrClient {
    /// The underlying HTTP client
    http: reqwest::Client,
    /// Base URL for REST method calls
    rest_url: String,
    /// Base URL for photo uploads
    upload_url: String,
    /// Signing credentials
    credentials: FlickrCredentials,
}

impl FlickrClient {
    /// Creates a new FlickrClient against the production endpoints
    ///
    /// # Arguments
    /// * `credentials` - A fully authorized credential set
    pub fn new(credentials: FlickrCredentials) -> Self {
        Self {
            http: reqwest::Client::new(),
            rest_url: REST_URL.to_string(),
            upload_url: UPLOAD_URL.to_string(),
            credentials,
        }
    }

    /// Creates a new FlickrClient with custom endpoints (useful for testing)
    ///
    /// # Arguments
    /// * `credentials` - The credential set to sign with
    /// * `rest_url` - Replacement for the REST endpoint
    /// * `upload_url` - Replacement for the upload endpoint
    pub fn with_base_urls(
        credentials: FlickrCredentials,
        rest_url: impl Into<String>,
        upload_url: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            rest_url: rest_url.into(),
            upload_url: upload_url.into(),
            credentials,
        }
    }

    /// Returns the REST endpoint URL
    pub fn rest_url(&self) -> &str {
        &self.rest_url
    }

    /// Returns the upload endpoint URL
    pub fn upload_url(&self) -> &str {
        &self.upload_url
    }

    /// Returns a reference to the underlying HTTP client
    ///
    /// Used by transfer operations that POST multipart bodies or GET
    /// absolute photo-source URLs rather than calling a REST method.
    pub(crate) fn http_client(&self) -> &reqwest::Client {
        &self.http
    }

    /// Calls a REST API method and returns the checked JSON payload
    ///
    /// Assembles the standard parameters (`method`, `format`,
    /// `nojsoncallback`), the OAuth protocol parameters, and the
    /// signature, then issues a GET. The response envelope's `stat`
    /// field is checked: `"fail"` becomes [`FlickrError::Api`].
    ///
    /// # Arguments
    /// * `method` - API method name, e.g. `flickr.photosets.getList`
    /// * `params` - Method-specific parameters
    pub async fn call(&self, method: &str, params: &[(&str, &str)]) -> Result<Value> {
        let mut all: Vec<(String, String)> = Vec::with_capacity(params.len() + 10);
        all.push(("method".to_string(), method.to_string()));
        all.push(("format".to_string(), "json".to_string()));
        all.push(("nojsoncallback".to_string(), "1".to_string()));
        for (key, value) in params {
            all.push(((*key).to_string(), (*value).to_string()));
        }
        self.append_oauth_params(&mut all);
        let signature = self.sign("GET", &self.rest_url, &all)?;
        all.push(("oauth_signature".to_string(), signature));

        let url = format!("{}?{}", self.rest_url, encode_query(&all));
        debug!(method, "calling Flickr REST method");

        let value: Value = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to call {method}"))?
            .error_for_status()
            .with_context(|| format!("{method} returned error status"))?
            .json()
            .await
            .with_context(|| format!("Failed to parse {method} response"))?;

        check_envelope(value).with_context(|| format!("{method} failed"))
    }

    /// Builds the complete signed parameter set for an upload POST
    ///
    /// The upload endpoint takes its parameters as multipart form fields
    /// instead of a query string; the photo content itself is excluded
    /// from the signature.
    pub(crate) fn signed_upload_params(
        &self,
        extra: &[(&str, &str)],
    ) -> Result<Vec<(String, String)>> {
        let mut all: Vec<(String, String)> = extra
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        self.append_oauth_params(&mut all);
        let signature = self.sign("POST", &self.upload_url, &all)?;
        all.push(("oauth_signature".to_string(), signature));
        Ok(all)
    }

    /// Appends the OAuth protocol parameters with a fresh nonce and
    /// timestamp
    fn append_oauth_params(&self, params: &mut Vec<(String, String)>) {
        params.push((
            "oauth_consumer_key".to_string(),
            self.credentials.consumer_key.clone(),
        ));
        params.push((
            "oauth_nonce".to_string(),
            uuid::Uuid::new_v4().simple().to_string(),
        ));
        params.push(("oauth_signature_method".to_string(), "HMAC-SHA1".to_string()));
        params.push((
            "oauth_timestamp".to_string(),
            chrono::Utc::now().timestamp().to_string(),
        ));
        params.push((
            "oauth_token".to_string(),
            self.credentials.oauth_token.clone(),
        ));
        params.push(("oauth_version".to_string(), "1.0".to_string()));
    }

    /// Computes the OAuth 1.0a HMAC-SHA1 signature for a request
    ///
    /// The signing key is `consumer_secret&token_secret`, both halves
    /// percent-encoded; the result is base64.
    fn sign(&self, http_method: &str, url: &str, params: &[(String, String)]) -> Result<String> {
        let base = signature_base(http_method, url, params);
        let key = format!(
            "{}&{}",
            encode(&self.credentials.consumer_secret),
            encode(&self.credentials.oauth_token_secret)
        );
        let mut mac = HmacSha1::new_from_slice(key.as_bytes())
            .map_err(|_| anyhow::anyhow!("HMAC rejected the signing key"))?;
        mac.update(base.as_bytes());
        Ok(BASE64.encode(mac.finalize().into_bytes()))
    }
}

// ============================================================================
// Signing primitives
// ============================================================================

/// Percent-encodes a value the way OAuth 1.0a requires (RFC 3986
/// unreserved characters stay, everything else is `%XX`, space is `%20`)
fn encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Renders parameters as a query string, encoded identically to the
/// signature so the wire form matches what was signed
fn encode_query(params: &[(String, String)]) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{}={}", encode(key), encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Builds the OAuth signature base string:
/// `METHOD&encoded(url)&encoded(sorted-encoded-params)`
fn signature_base(http_method: &str, url: &str, params: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(key, value)| (encode(key), encode(value)))
        .collect();
    encoded.sort();
    let param_string = encoded
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");
    format!(
        "{}&{}&{}",
        http_method.to_uppercase(),
        encode(url),
        encode(&param_string)
    )
}

/// Checks the Flickr JSON envelope and unwraps the payload
///
/// Flickr answers HTTP 200 even for API failures; the real status lives
/// in the `stat` field.
fn check_envelope(value: Value) -> Result<Value> {
    match value.get("stat").and_then(Value::as_str) {
        Some("ok") => Ok(value),
        Some("fail") => {
            let code = value
                .get("code")
                .and_then(|c| c.as_u64().or_else(|| c.as_str().and_then(|s| s.parse().ok())))
                .unwrap_or(0);
            let message = value
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string();
            Err(FlickrError::Api { code, message }.into())
        }
        _ => Err(FlickrError::InvalidResponse("response has no stat field".to_string()).into()),
    }
}
