//! Per-path debouncing logic
//!
//! Editors often emit several write events for one save. An event is accepted only if
//! the same path has not been accepted within the debounce window.
//!
//! The table is bounded: once it grows past its capacity, entries older than
//! `SWEEP_FACTOR` windows are swept, and if that is not enough the least recently
//! accepted paths are evicted.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Entries older than this many windows can no longer suppress anything useful
const SWEEP_FACTOR: u32 = 4;

/// Default maximum number of tracked paths
pub const DEFAULT_CAPACITY: usize = 1024;

/// Path -> last accepted event time
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    capacity: usize,
    last_accepted: HashMap<PathBuf, Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self::with_capacity(window, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(window: Duration, capacity: usize) -> Self {
        Self {
            window,
            capacity: capacity.max(1),
            last_accepted: HashMap::new(),
        }
    }

    /// Decide whether an event for `path` at `now` passes, recording it if so
    pub fn accept(&mut self, path: &Path, now: Instant) -> bool {
        if let Some(&last) = self.last_accepted.get(path) {
            if now.saturating_duration_since(last) < self.window {
                return false;
            }
        }

        self.last_accepted.insert(path.to_path_buf(), now);
        if self.last_accepted.len() > self.capacity {
            self.sweep(path, now);
        }
        true
    }

    /// Number of tracked paths
    pub fn len(&self) -> usize {
        self.last_accepted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_accepted.is_empty()
    }

    fn sweep(&mut self, keep: &Path, now: Instant) {
        let horizon = self.window * SWEEP_FACTOR;
        self.last_accepted
            .retain(|_, &mut last| now.saturating_duration_since(last) < horizon);

        let excess = self.last_accepted.len().saturating_sub(self.capacity);
        if excess == 0 {
            return;
        }

        let mut by_age: Vec<(PathBuf, Instant)> = self
            .last_accepted
            .iter()
            .filter(|(p, _)| p.as_path() != keep)
            .map(|(p, &t)| (p.clone(), t))
            .collect();
        by_age.sort_by_key(|(_, t)| *t);

        for (path, _) in by_age.into_iter().take(excess) {
            self.last_accepted.remove(&path);
        }
        tracing::debug!("Debounce table evicted {} entries", excess);
    }
}
