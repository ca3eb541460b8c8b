//! Expand markers in explicit files once

use crate::util;
use anyhow::Result;
use helper_core::{Config, Metrics};
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub async fn run(config: Arc<Config>, files: &[PathBuf]) -> Result<()> {
    let metrics = Arc::new(Metrics::new());
    let annotator = super::build_annotator(&config, Arc::clone(&metrics))?;
    let cancel = CancellationToken::new();

    let mut failed = 0;
    for path in files {
        match annotator.process(path, &cancel).await {
            Ok(outcome) if outcome.written => {
                println!(
                    "{} {} ({} expanded, {} failed)",
                    "✓".green(),
                    path.display(),
                    outcome.expanded,
                    outcome.failed
                );
            }
            Ok(outcome) => {
                let reason = if outcome.markers == 0 {
                    "no markers".to_string()
                } else {
                    format!("{} already expanded", outcome.skipped)
                };
                println!("{} {} ({})", "-".dimmed(), path.display(), reason.dimmed());
            }
            Err(e) => {
                metrics.record_error(&e);
                println!("{} {}", "✗".red(), path.display());
                failed += 1;
            }
        }
    }

    util::print_summary(&metrics.snapshot());

    if failed > 0 {
        anyhow::bail!("{} of {} file(s) could not be processed", failed, files.len());
    }
    Ok(())
}
