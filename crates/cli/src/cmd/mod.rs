//! CLI command implementations

pub mod config;
pub mod process;
pub mod scan;
pub mod watch;

use anyhow::{Context, Result};
use generate::OllamaClient;
use helper_core::{Annotator, Config, Metrics};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Annotator backed by the configured HTTP endpoint
pub fn build_annotator(config: &Config, metrics: Arc<Metrics>) -> Result<Annotator<OllamaClient>> {
    let client = OllamaClient::new(config).context("Failed to create generation client")?;
    Ok(Annotator::new(config, client, metrics))
}

/// `root` or the current directory
pub fn resolve_root(root: Option<PathBuf>) -> Result<PathBuf> {
    match root {
        Some(root) => Ok(root),
        None => std::env::current_dir().context("Failed to get current directory"),
    }
}

pub(crate) fn display_relative<'a>(path: &'a Path, root: &Path) -> std::path::Display<'a> {
    path.strip_prefix(root).unwrap_or(path).display()
}
