//! Watch a directory and expand markers as files change

use crate::pipeline::Pipeline;
use crate::util;
use anyhow::{Context, Result};
use helper_core::{Config, Metrics};
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use watcher::{scan, ChangeDetector};

pub async fn run(config: Arc<Config>, root: Option<PathBuf>, initial_scan: bool) -> Result<()> {
    let root = super::resolve_root(root)?;
    let metrics = Arc::new(Metrics::new());
    let annotator = Arc::new(super::build_annotator(&config, Arc::clone(&metrics))?);

    let mut detector = ChangeDetector::new(&root, &config)?;
    detector.start().context("Failed to start file watcher")?;

    println!("{} {}", "Watching".green().bold(), detector.root().display());
    println!("  {}: {}", "Model".dimmed(), config.model);
    println!("  {}: {}", "Endpoint".dimmed(), config.endpoint);
    println!(
        "  {}: {}",
        "Started".dimmed(),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    println!(
        "  {}: add '{} <task>' to a .{} file",
        "Usage".dimmed(),
        config.marker,
        config.extensions.join("/.")
    );
    println!("  {}", "Press Ctrl-C to stop (twice to abort pending requests)".dimmed());

    let shutdown = CancellationToken::new();
    let cancel = CancellationToken::new();
    spawn_signal_handler(shutdown.clone(), cancel.clone());

    let mut pipeline = Pipeline::new(annotator.clone(), config.max_concurrency, shutdown, cancel);

    if initial_scan {
        let mut queued = 0;
        for path in scan::candidate_files(detector.filter())? {
            match annotator.pending_markers(&path).await {
                Ok(0) => {}
                Ok(_) => {
                    pipeline.dispatch(path);
                    queued += 1;
                }
                Err(e) => warn!("{}", e),
            }
        }
        info!("Initial scan queued {} file(s)", queued);
    }

    pipeline.run(&mut detector).await;
    detector.stop();

    util::print_summary(&metrics.snapshot());
    Ok(())
}

/// First Ctrl-C stops intake and lets running passes finish; the second aborts them
fn spawn_signal_handler(shutdown: CancellationToken, cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        info!("Shutting down, waiting for running files (Ctrl-C again to abort)");
        shutdown.cancel();

        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Aborting pending generation requests");
            cancel.cancel();
        }
    });
}
