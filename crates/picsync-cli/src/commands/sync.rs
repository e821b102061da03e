//! Sync command - Reconcile and synchronize albums with Flickr
//!
//! Provides the `picsync sync` CLI command which:
//! 1. Loads configuration and the stored credentials
//! 2. Wires the Flickr adapter and local store into a coordinator
//! 3. Reconciles and displays per-album differences
//! 4. Builds and executes transfer tasks for the selected albums,
//!    cancelling cleanly on Ctrl-C

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use picsync_core::config::Config;
use picsync_core::domain::{AlbumTitle, TaskError};
use picsync_core::ports::{IAlbumService, ILocalStore};
use picsync_engine::executor::ExecutionReport;
use picsync_engine::reconcile::ReconcileReport;
use picsync_engine::{LocalStoreAdapter, SyncCoordinator};
use picsync_flickr::auth::KeyringCredentialStore;
use picsync_flickr::client::FlickrClient;
use picsync_flickr::provider::FlickrAlbumService;

use crate::output::{get_formatter, OutputFormat, OutputFormatter};

#[derive(Debug, Args)]
pub struct SyncCommand {
    /// Sync only this album (repeatable)
    #[arg(long = "album", value_name = "TITLE")]
    pub albums: Vec<String>,

    /// Sync every album that differs
    #[arg(long, conflicts_with = "albums")]
    pub all: bool,

    /// Show per-album differences without transferring anything
    #[arg(long)]
    pub dry_run: bool,
}

impl SyncCommand {
    /// Execute the sync command
    ///
    /// Runs reconcile, select, and execute through the coordinator and
    /// displays progress and results.
    pub async fn execute(&self, format: OutputFormat, config_path: &Path) -> Result<()> {
        let formatter = get_formatter(format);

        // Step 1: Load config and credentials
        let config = Config::load_or_default(config_path);
        info!(config_path = %config_path.display(), "Loaded configuration");

        let credentials = match KeyringCredentialStore::load(&config.auth.username)
            .context("Failed to read credentials from keyring")?
        {
            Some(c) => c,
            None => {
                formatter.error("No credentials stored. Run 'picsync auth set' first.");
                return Ok(());
            }
        };

        // Step 2: Create adapters and the coordinator
        let client = FlickrClient::with_base_urls(
            credentials,
            config.flickr.rest_url.clone(),
            config.flickr.upload_url.clone(),
        );
        let service: Arc<dyn IAlbumService> = Arc::new(FlickrAlbumService::with_client(client));
        let store: Arc<dyn ILocalStore> = Arc::new(LocalStoreAdapter::new());

        let root = config.sync.root.clone();
        tokio::fs::create_dir_all(&root)
            .await
            .with_context(|| format!("Failed to create sync root {}", root.display()))?;

        let coordinator = Arc::new(SyncCoordinator::new(service, store, root));

        // Step 3: Reconcile and display the differences
        formatter.info("Comparing local albums against Flickr...");
        let report = coordinator.reconcile().await?;

        if format.is_json() {
            if self.dry_run {
                display_reconcile_json(&*formatter, &report);
                return Ok(());
            }
        } else {
            display_reconcile_human(&*formatter, &report);
            if self.dry_run {
                return Ok(());
            }
        }

        // Step 4: Resolve the album selection
        let titles = if self.all {
            report
                .summaries
                .iter()
                .filter(|s| !s.in_sync())
                .map(|s| s.title.clone())
                .collect::<Vec<_>>()
        } else {
            let mut titles = Vec::with_capacity(self.albums.len());
            for name in &self.albums {
                let title = AlbumTitle::new(name.as_str())
                    .with_context(|| format!("Invalid album title '{name}'"))?;
                titles.push(title);
            }
            titles
        };

        if titles.is_empty() {
            if self.all {
                formatter.success("All albums are already in sync");
            } else {
                formatter.info("");
                formatter.info("Nothing selected. Use --album <TITLE> or --all to transfer.");
            }
            return Ok(());
        }

        // Step 5: Build and enqueue tasks for the selection
        let queued = match coordinator.select(&titles).await {
            Ok(count) => count,
            Err(err) => {
                formatter.error(&format!("{err:#}"));
                return Ok(());
            }
        };
        if queued == 0 {
            formatter.success("Selected albums have nothing to transfer");
            return Ok(());
        }
        formatter.info(&format!(
            "Queued {} task{}",
            queued,
            if queued == 1 { "" } else { "s" }
        ));

        // Step 6: Execute, racing Ctrl-C for clean cancellation
        let progress_task = if format.is_json() {
            None
        } else {
            let mut progress = coordinator.progress();
            Some(tokio::spawn(async move {
                while progress.changed().await.is_ok() {
                    let p = *progress.borrow();
                    if p.total > 0 {
                        println!("  transferred {}/{}", p.done, p.total);
                    }
                }
            }))
        };

        let run = coordinator.run();
        tokio::pin!(run);
        let result = tokio::select! {
            res = &mut run => res,
            _ = tokio::signal::ctrl_c() => {
                formatter.warn("Interrupted; cancelling remaining tasks");
                coordinator.cancel().await;
                run.await
            }
        };
        if let Some(task) = progress_task {
            task.abort();
        }
        let exec = result?;

        // Step 7: Display results
        display_execution(&*formatter, format, &exec);

        let summaries = coordinator.summaries().await;
        if exec.is_clean() && summaries.iter().all(|s| s.in_sync()) {
            formatter.success("All albums are in sync");
        } else if !exec.is_clean() && !exec.was_cancelled() {
            formatter.info("Run 'picsync sync' again to retry the failed transfers.");
        }

        Ok(())
    }
}

fn display_reconcile_human(formatter: &dyn OutputFormatter, report: &ReconcileReport) {
    if report.summaries.is_empty() {
        formatter.info("No albums found locally or remotely.");
    }
    for summary in &report.summaries {
        if summary.in_sync() {
            formatter.info(&format!("{:<28} in sync", summary.title.as_str()));
        } else {
            formatter.info(&format!(
                "{:<28} {} to upload, {} to download",
                summary.title.as_str(),
                summary.upload_count,
                summary.download_count
            ));
        }
    }
    for error in &report.errors {
        formatter.warn(error);
    }
}

fn display_reconcile_json(formatter: &dyn OutputFormatter, report: &ReconcileReport) {
    let albums: Vec<serde_json::Value> = report
        .summaries
        .iter()
        .map(|s| {
            serde_json::json!({
                "album": s.title.as_str(),
                "upload_count": s.upload_count,
                "download_count": s.download_count,
            })
        })
        .collect();
    formatter.print_json(&serde_json::json!({
        "albums": albums,
        "pending": report.pending(),
        "errors": report.errors,
        "duration_ms": report.duration_ms,
    }));
}

fn display_execution(
    formatter: &dyn OutputFormatter,
    format: OutputFormat,
    report: &ExecutionReport,
) {
    if format.is_json() {
        let failures: Vec<serde_json::Value> = report
            .failures
            .iter()
            .map(|f| {
                serde_json::json!({
                    "task": f.description,
                    "album": f.album_title.as_str(),
                    "error": f.error.to_string(),
                })
            })
            .collect();
        formatter.print_json(&serde_json::json!({
            "total": report.total,
            "succeeded": report.succeeded,
            "failed": report.failed(),
            "cancelled": report.cancelled(),
            "duration_ms": report.duration_ms(),
            "failures": failures,
        }));
        return;
    }

    let duration_display = if report.duration_ms() >= 1000 {
        format!("{:.1}s", report.duration_ms() as f64 / 1000.0)
    } else {
        format!("{}ms", report.duration_ms())
    };

    if report.is_clean() {
        formatter.success(&format!(
            "Transferred {} task{} in {}",
            report.total,
            if report.total == 1 { "" } else { "s" },
            duration_display
        ));
    } else if report.was_cancelled() {
        formatter.warn(&format!(
            "Cancelled after {}/{} tasks ({})",
            report.succeeded, report.total, duration_display
        ));
    } else {
        formatter.warn(&format!(
            "Completed {}/{} tasks in {} ({} failed)",
            report.succeeded,
            report.total,
            duration_display,
            report.failed()
        ));
    }

    for failure in &report.failures {
        if failure.error == TaskError::Cancelled {
            continue;
        }
        formatter.info(&format!(
            "  failed: {} - {}",
            failure.description, failure.error
        ));
    }
}
