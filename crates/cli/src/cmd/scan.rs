//! Expand markers in every watched file under a directory

use crate::util;
use anyhow::Result;
use helper_core::{Config, Metrics};
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use watcher::{scan, PathFilter};

pub async fn run(config: Arc<Config>, root: Option<PathBuf>, dry_run: bool) -> Result<()> {
    let root = super::resolve_root(root)?.canonicalize()?;
    let filter = PathFilter::load(&root, &config)?;
    let metrics = Arc::new(Metrics::new());
    let annotator = super::build_annotator(&config, Arc::clone(&metrics))?;

    let mut pending = Vec::new();
    for path in scan::candidate_files(&filter)? {
        match annotator.pending_markers(&path).await {
            Ok(0) => {}
            Ok(count) => pending.push((path, count)),
            Err(e) => warn!("{}", e),
        }
    }

    if pending.is_empty() {
        println!("No pending markers under {}", root.display());
        return Ok(());
    }

    if dry_run {
        println!("{}", "Pending markers".bold());
        for (path, count) in &pending {
            println!("  {} {}", count.to_string().yellow(), super::display_relative(path, &root));
        }
        return Ok(());
    }

    let cancel = CancellationToken::new();
    for (path, _) in &pending {
        match annotator.process(path, &cancel).await {
            Ok(outcome) => println!(
                "{} {} ({} expanded, {} failed)",
                "✓".green(),
                super::display_relative(path, &root),
                outcome.expanded,
                outcome.failed
            ),
            Err(e) => metrics.record_error(&e),
        }
    }

    util::print_summary(&metrics.snapshot());
    Ok(())
}
