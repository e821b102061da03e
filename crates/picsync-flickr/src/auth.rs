//! Access credentials and keyring storage
//!
//! picsync does not implement the Flickr authorization flow; it consumes
//! credentials that were obtained elsewhere (the API key pair plus an
//! already-authorized OAuth 1.0a token). This module defines that
//! credential bundle and its storage in the OS keyring, so secrets never
//! touch the config file.
//!
//! ## Components
//!
//! - [`FlickrCredentials`] - The four values every signed request needs
//! - [`KeyringCredentialStore`] - Secure storage via the system keyring

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Keyring service name for storing credentials
const KEYRING_SERVICE: &str = "picsync";

// ============================================================================
// FlickrCredentials
// ============================================================================

/// The full credential set for signing Flickr API requests
///
/// All four values participate in every OAuth 1.0a signature: the
/// consumer pair identifies the application, the token pair the
/// authorized user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlickrCredentials {
    /// API key issued by Flickr for the application
    pub consumer_key: String,
    /// API secret paired with the key
    pub consumer_secret: String,
    /// Access token authorized by the user
    pub oauth_token: String,
    /// Secret paired with the access token
    pub oauth_token_secret: String,
}

impl FlickrCredentials {
    /// Create a credential set from its four parts
    pub fn new(
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
        oauth_token: impl Into<String>,
        oauth_token_secret: impl Into<String>,
    ) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
            oauth_token: oauth_token.into(),
            oauth_token_secret: oauth_token_secret.into(),
        }
    }
}

// ============================================================================
// KeyringCredentialStore
// ============================================================================

/// Stores and retrieves Flickr credentials from the system keyring
///
/// Uses the `keyring` crate to store the credential bundle in the OS
/// credential store (e.g., GNOME Keyring, KDE Wallet). The bundle is
/// serialized as JSON under the service name "picsync" with the
/// configured account name as the username.
pub struct KeyringCredentialStore;

impl KeyringCredentialStore {
    /// Stores credentials in the system keyring for the given account
    ///
    /// # Arguments
    /// * `username` - The picsync account name (used as keyring username)
    /// * `credentials` - The credential bundle to store
    pub fn store(username: &str, credentials: &FlickrCredentials) -> Result<()> {
        let entry = keyring::Entry::new(KEYRING_SERVICE, username)
            .context("Failed to create keyring entry")?;

        let json = serde_json::to_string(credentials)
            .context("Failed to serialize credentials")?;
        entry
            .set_password(&json)
            .context("Failed to store credentials in keyring")?;

        debug!("Stored credentials in keyring for account: {}", username);
        Ok(())
    }

    /// Loads credentials from the system keyring for the given account
    ///
    /// # Returns
    /// `Ok(None)` when no credentials have been stored yet.
    pub fn load(username: &str) -> Result<Option<FlickrCredentials>> {
        let entry = keyring::Entry::new(KEYRING_SERVICE, username)
            .context("Failed to create keyring entry")?;

        match entry.get_password() {
            Ok(json) => {
                let credentials: FlickrCredentials = serde_json::from_str(&json)
                    .context("Failed to deserialize credentials from keyring")?;
                debug!("Loaded credentials from keyring for account: {}", username);
                Ok(Some(credentials))
            }
            Err(keyring::Error::NoEntry) => {
                debug!("No credentials in keyring for account: {}", username);
                Ok(None)
            }
            Err(e) => Err(anyhow::Error::new(e).context("Failed to read from keyring")),
        }
    }

    /// Removes credentials from the system keyring for the given account
    ///
    /// Succeeds when there was nothing to remove.
    pub fn clear(username: &str) -> Result<()> {
        let entry = keyring::Entry::new(KEYRING_SERVICE, username)
            .context("Failed to create keyring entry")?;

        match entry.delete_credential() {
            Ok(()) => {
                info!("Cleared credentials from keyring for account: {}", username);
                Ok(())
            }
            Err(keyring::Error::NoEntry) => {
                debug!("No credentials to clear for account: {}", username);
                Ok(())
            }
            Err(e) => Err(anyhow::Error::new(e).context("Failed to delete from keyring")),
        }
    }
}
