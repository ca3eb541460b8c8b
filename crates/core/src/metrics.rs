//! Process metrics
//!
//! Counters are write-only from the processor and the generation path and read back
//! for the exit summary. Nothing is persisted across restarts.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{error, info};

/// Operation, error and generation counters
#[derive(Debug, Default)]
pub struct Metrics {
    operations: AtomicU64,
    errors: AtomicU64,
    tasks: AtomicU64,
    tokens: AtomicU64,
    busy_ms: AtomicU64,
}

/// Point-in-time copy of [`Metrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub operations: u64,
    pub errors: u64,
    pub tasks: u64,
    pub tokens: u64,
    pub busy: Duration,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start timing an operation; the duration is logged when the timer ends or drops
    pub fn start_operation(&self, label: impl Into<String>) -> OperationTimer<'_> {
        OperationTimer {
            metrics: self,
            label: label.into(),
            started: Instant::now(),
            finished: false,
        }
    }

    /// Count a failure and log it. Callers do not log the error again.
    pub fn record_error(&self, err: &dyn fmt::Display) {
        self.errors.fetch_add(1, Ordering::Relaxed);
        error!("{}", err);
    }

    pub fn record_tasks(&self, count: usize, tokens: u64) {
        self.tasks.fetch_add(count as u64, Ordering::Relaxed);
        self.tokens.fetch_add(tokens, Ordering::Relaxed);
        info!("Generated {} tasks ({} tokens)", count, tokens);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            operations: self.operations.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            tasks: self.tasks.load(Ordering::Relaxed),
            tokens: self.tokens.load(Ordering::Relaxed),
            busy: Duration::from_millis(self.busy_ms.load(Ordering::Relaxed)),
        }
    }

    fn end_operation(&self, label: &str, elapsed: Duration) {
        self.operations.fetch_add(1, Ordering::Relaxed);
        self.busy_ms
            .fetch_add(elapsed.as_millis() as u64, Ordering::Relaxed);
        info!("{} completed in {:.2} seconds", label, elapsed.as_secs_f64());
    }
}

/// Scoped timer returned by [`Metrics::start_operation`]
pub struct OperationTimer<'a> {
    metrics: &'a Metrics,
    label: String,
    started: Instant,
    finished: bool,
}

impl OperationTimer<'_> {
    /// End the operation now and return its duration
    pub fn end(mut self) -> Duration {
        self.finish()
    }

    fn finish(&mut self) -> Duration {
        let elapsed = self.started.elapsed();
        if !self.finished {
            self.finished = true;
            self.metrics.end_operation(&self.label, elapsed);
        }
        elapsed
    }
}

impl Drop for OperationTimer<'_> {
    fn drop(&mut self) {
        self.finish();
    }
}
