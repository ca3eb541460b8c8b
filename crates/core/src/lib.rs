//! Core of the ai-helper task expansion pipeline
//!
//! This crate provides:
//! - Configuration loading (defaults overlaid with the per-user JSON file)
//! - The `Generator` seam implemented by the HTTP generation client
//! - The annotation processor that expands `//ai` markers in place
//! - Process metrics with scoped operation timers
//! - Atomic whole-file writes

pub mod annotate;
pub mod config;
pub mod error;
pub mod fsutil;
pub mod generator;
pub mod metrics;

// Re-exports
pub use annotate::{Annotator, Marker, Outcome};
pub use config::Config;
pub use error::{ConfigError, ProcessError};
pub use generator::{GenerateError, Generation, Generator};
pub use metrics::{Metrics, MetricsSnapshot, OperationTimer};
