//! Seam between the annotation processor and a text-generation backend

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Subtasks produced for one task description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    /// Normalized `"k. text"` lines in response order
    pub subtasks: Vec<String>,
    /// Tokens reported by the endpoint, or an estimate
    pub tokens: u64,
}

/// Why a generation attempt produced no subtasks.
///
/// The display form is what ends up in the `// Error:` comment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    #[error("Error generating subtasks: API request failed with status code {0}")]
    Status(u16),

    #[error("Error generating subtasks: empty response from API")]
    EmptyResponse,

    #[error("Error generating subtasks: failed to connect to the generation service at {0}, is it running?")]
    Unreachable(String),

    #[error("Error generating subtasks: request timed out after {0}s")]
    Timeout(u64),

    #[error("Error generating subtasks: no valid subtasks in the response")]
    NoValidSubtasks,

    #[error("Error generating subtasks: invalid response: {0}")]
    InvalidResponse(String),

    #[error("Error generating subtasks: request failed: {0}")]
    Request(String),

    #[error("Error generating subtasks: cancelled")]
    Cancelled,
}

impl GenerateError {
    /// Connection-level failures, as opposed to the service answering badly
    pub fn is_connection_failure(&self) -> bool {
        matches!(self, GenerateError::Unreachable(_))
    }
}

/// Something that turns a task description into subtasks
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(
        &self,
        task: &str,
        cancel: &CancellationToken,
    ) -> Result<Generation, GenerateError>;
}
