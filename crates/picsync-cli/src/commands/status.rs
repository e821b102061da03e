//! Status command - Show configuration and credential state
//!
//! Reports where picsync reads its configuration from, whether the sync
//! root exists, and whether credentials are present in the keyring.
//! This command never talks to Flickr; use `picsync sync --dry-run` to
//! see per-album differences.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use picsync_core::config::Config;
use picsync_flickr::auth::KeyringCredentialStore;

use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Args)]
pub struct StatusCommand {}

impl StatusCommand {
    pub async fn execute(&self, format: OutputFormat, config_path: &Path) -> Result<()> {
        let formatter = get_formatter(format);

        let config_exists = config_path.exists();
        let config = Config::load_or_default(config_path);
        let root_exists = config.sync.root.is_dir();
        let credentials_stored = KeyringCredentialStore::load(&config.auth.username)
            .context("Failed to read credentials from keyring")?
            .is_some();
        let validation_errors = config.validate();

        if format.is_json() {
            let errors: Vec<String> = validation_errors.iter().map(|e| e.to_string()).collect();
            formatter.print_json(&serde_json::json!({
                "config_path": config_path.display().to_string(),
                "config_exists": config_exists,
                "sync_root": config.sync.root.display().to_string(),
                "sync_root_exists": root_exists,
                "rest_url": config.flickr.rest_url,
                "upload_url": config.flickr.upload_url,
                "username": config.auth.username,
                "credentials_stored": credentials_stored,
                "config_errors": errors,
            }));
            return Ok(());
        }

        if config_exists {
            formatter.success(&format!("Configuration: {}", config_path.display()));
        } else {
            formatter.success("Configuration: defaults (no config file)");
        }

        formatter.info(&format!(
            "Sync root:    {}{}",
            config.sync.root.display(),
            if root_exists { "" } else { " (missing)" }
        ));
        formatter.info(&format!("REST API:     {}", config.flickr.rest_url));
        formatter.info(&format!("Upload API:   {}", config.flickr.upload_url));
        formatter.info(&format!(
            "Credentials:  {} for '{}'",
            if credentials_stored {
                "stored"
            } else {
                "not stored"
            },
            config.auth.username
        ));

        if !credentials_stored {
            formatter.info("");
            formatter.info("Run 'picsync auth set' to store Flickr credentials.");
        }

        if !validation_errors.is_empty() {
            formatter.warn(&format!(
                "Configuration has {} issue{}:",
                validation_errors.len(),
                if validation_errors.len() == 1 { "" } else { "s" }
            ));
            for error in &validation_errors {
                formatter.info(&format!("  {} - {}", error.field, error.message));
            }
        }

        Ok(())
    }
}
