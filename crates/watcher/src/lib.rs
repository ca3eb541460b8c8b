//! File system watching for ai-helper
//!
//! This crate provides:
//! - Recursive change detection on a root directory (notify)
//! - Extension, directory and ignore-rule filtering
//! - Per-path debouncing with a bounded table
//! - A full-tree scan for one-shot runs

pub mod debounce;
pub mod filter;
pub mod scan;

pub use debounce::Debouncer;
pub use filter::PathFilter;

use anyhow::{Context, Result};
use helper_core::Config;
use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// A raw change notification
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    /// Path that changed
    pub path: PathBuf,
    /// When the event was received
    pub timestamp: Instant,
}

/// Lifecycle of a detector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorState {
    Idle,
    Watching,
    Stopped,
}

/// Watches one root and yields debounced, filtered paths
pub struct ChangeDetector {
    root: PathBuf,
    filter: PathFilter,
    debouncer: Debouncer,
    watcher: Option<RecommendedWatcher>,
    events: Option<mpsc::UnboundedReceiver<ChangeEvent>>,
    state: DetectorState,
}

impl ChangeDetector {
    /// Create a detector for `root`; nothing is watched until [`start`](Self::start)
    pub fn new(root: &Path, config: &Config) -> Result<Self> {
        let root = root
            .canonicalize()
            .with_context(|| format!("Cannot watch {}", root.display()))?;
        let filter = PathFilter::load(&root, config)?;

        Ok(Self {
            root,
            filter,
            debouncer: Debouncer::new(config.debounce()),
            watcher: None,
            events: None,
            state: DetectorState::Idle,
        })
    }

    /// Start watching the root recursively
    pub fn start(&mut self) -> Result<()> {
        if self.state == DetectorState::Watching {
            return Ok(());
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            match res {
                Ok(event) if is_content_change(&event.kind) => {
                    let timestamp = Instant::now();
                    for path in event.paths {
                        // Receiver gone means we are shutting down
                        let _ = tx.send(ChangeEvent { path, timestamp });
                    }
                }
                Ok(_) => {}
                Err(e) => warn!("File watch error: {}", e),
            }
        })
        .context("Failed to create file watcher")?;

        watcher
            .watch(&self.root, RecursiveMode::Recursive)
            .with_context(|| format!("Failed to watch {}", self.root.display()))?;

        info!("Watching {}", self.root.display());
        self.watcher = Some(watcher);
        self.events = Some(rx);
        self.state = DetectorState::Watching;
        Ok(())
    }

    /// Stop watching. Pending events are discarded.
    pub fn stop(&mut self) {
        self.watcher = None;
        self.events = None;
        self.state = DetectorState::Stopped;
    }

    /// Next accepted path, or `None` once the detector is stopped
    pub async fn next_change(&mut self) -> Option<PathBuf> {
        loop {
            let event = self.events.as_mut()?.recv().await?;
            if self.accept(&event) {
                return Some(event.path);
            }
        }
    }

    /// Filter and debounce one event
    pub fn accept(&mut self, event: &ChangeEvent) -> bool {
        if !self.filter.allows(&event.path) {
            return false;
        }
        if !self.debouncer.accept(&event.path, event.timestamp) {
            debug!("Debounced {}", event.path.display());
            return false;
        }
        true
    }

    pub fn state(&self) -> DetectorState {
        self.state
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn filter(&self) -> &PathFilter {
        &self.filter
    }
}

/// Writes, creations and renames; metadata-only and access events are dropped
fn is_content_change(kind: &EventKind) -> bool {
    match kind {
        EventKind::Create(_) => true,
        EventKind::Modify(ModifyKind::Metadata(_)) => false,
        EventKind::Modify(_) => true,
        _ => false,
    }
}
