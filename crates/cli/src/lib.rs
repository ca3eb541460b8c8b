//! ai-helper CLI library
//!
//! Exposes the command implementations and the processing pipeline so integration
//! tests can drive them without spawning the binary.

pub mod cmd;
pub mod logging;
pub mod pipeline;
pub mod util;

pub use pipeline::Pipeline;
