//! Text-generation client for ai-helper
//!
//! Sends one prompt per task description to an Ollama-compatible `/api/generate`
//! endpoint and turns the numbered reply into subtasks.

pub mod client;
pub mod parse;
pub mod prompt;

pub use client::{ClientError, OllamaClient};
pub use helper_core::{GenerateError, Generation, Generator};
pub use parse::{parse_subtasks, strip_reasoning};
pub use prompt::build_prompt;
