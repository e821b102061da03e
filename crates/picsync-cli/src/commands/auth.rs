//! Auth commands - Set, Clear, and Status for stored Flickr credentials
//!
//! picsync does not run an authorization flow itself: the API key and
//! the authorized access token are obtained once from Flickr and handed
//! to `picsync auth set`, which keeps them in the system keyring under
//! the account name from the configuration. The other commands read
//! credentials from the same place, so nothing secret ever lands in the
//! configuration file.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Subcommand;
use tracing::info;

use picsync_core::config::Config;
use picsync_flickr::auth::{FlickrCredentials, KeyringCredentialStore};

use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Store Flickr API credentials in the system keyring
    Set {
        /// Flickr API key (consumer key)
        #[arg(long)]
        consumer_key: String,
        /// Flickr API secret (consumer secret)
        #[arg(long)]
        consumer_secret: String,
        /// Authorized OAuth access token
        #[arg(long)]
        oauth_token: String,
        /// Secret belonging to the access token
        #[arg(long)]
        oauth_token_secret: String,
    },
    /// Remove stored credentials
    Clear,
    /// Check whether credentials are stored
    Status,
}

impl AuthCommand {
    pub async fn execute(&self, format: OutputFormat, config_path: &Path) -> Result<()> {
        let fmt = get_formatter(format);
        let config = Config::load_or_default(config_path);
        let username = config.auth.username.as_str();

        match self {
            AuthCommand::Set {
                consumer_key,
                consumer_secret,
                oauth_token,
                oauth_token_secret,
            } => {
                let credentials = FlickrCredentials::new(
                    consumer_key.clone(),
                    consumer_secret.clone(),
                    oauth_token.clone(),
                    oauth_token_secret.clone(),
                );
                KeyringCredentialStore::store(username, &credentials)
                    .context("Failed to store credentials in keyring")?;

                info!(username, "stored Flickr credentials");

                if format.is_json() {
                    fmt.print_json(&serde_json::json!({
                        "success": true,
                        "username": username,
                    }));
                } else {
                    fmt.success(&format!("Credentials stored for '{}'", username));
                    fmt.info("Run 'picsync sync' to synchronize your albums.");
                }
            }
            AuthCommand::Clear => {
                KeyringCredentialStore::clear(username)
                    .context("Failed to remove credentials from keyring")?;

                info!(username, "cleared Flickr credentials");

                if format.is_json() {
                    fmt.print_json(&serde_json::json!({
                        "success": true,
                        "username": username,
                    }));
                } else {
                    fmt.success(&format!("Credentials removed for '{}'", username));
                }
            }
            AuthCommand::Status => {
                let stored = KeyringCredentialStore::load(username)
                    .context("Failed to read credentials from keyring")?;

                if format.is_json() {
                    fmt.print_json(&serde_json::json!({
                        "username": username,
                        "credentials_stored": stored.is_some(),
                        "consumer_key": stored.as_ref().map(|c| masked(&c.consumer_key)),
                    }));
                } else {
                    match stored {
                        Some(credentials) => {
                            fmt.success(&format!("Credentials present for '{}'", username));
                            fmt.info(&format!(
                                "Consumer key: {}",
                                masked(&credentials.consumer_key)
                            ));
                        }
                        None => {
                            fmt.info(&format!("No credentials stored for '{}'", username));
                            fmt.info("Run 'picsync auth set' to store them.");
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

/// Shows the first few characters of a secret, never the whole value
fn masked(value: &str) -> String {
    let prefix: String = value.chars().take(4).collect();
    if value.chars().count() <= 4 {
        "****".to_string()
    } else {
        format!("{prefix}...")
    }
}
