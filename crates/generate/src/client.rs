//! HTTP client for an Ollama-compatible `/api/generate` endpoint

use crate::parse::parse_subtasks;
use crate::prompt::build_prompt;
use async_trait::async_trait;
use helper_core::{Config, GenerateError, Generation, Generator};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Failures building the client itself
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid api endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("failed to build http client: {0}")]
    Build(#[from] reqwest::Error),
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    temperature: f64,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
    #[serde(default)]
    eval_count: Option<u64>,
}

/// One-shot generation client
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: reqwest::Client,
    endpoint: Url,
    model: String,
    temperature: f64,
    max_tokens: u32,
    timeout: Duration,
}

impl OllamaClient {
    pub fn new(config: &Config) -> Result<Self, ClientError> {
        let endpoint =
            Url::parse(&config.endpoint).map_err(|e| ClientError::InvalidEndpoint {
                endpoint: config.endpoint.clone(),
                reason: e.to_string(),
            })?;

        let http = reqwest::Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            http,
            endpoint,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout: config.timeout(),
        })
    }

    async fn request(&self, task: &str) -> Result<GenerateResponse, GenerateError> {
        let request = GenerateRequest {
            model: &self.model,
            prompt: build_prompt(task),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream: false,
        };

        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GenerateError::Status(status.as_u16()));
        }

        let body = response.text().await.map_err(|e| self.classify(e))?;
        if body.trim().is_empty() {
            return Err(GenerateError::EmptyResponse);
        }
        serde_json::from_str(&body).map_err(|e| {
            GenerateError::InvalidResponse(format!("failed to parse response: {}", e))
        })
    }

    fn classify(&self, err: reqwest::Error) -> GenerateError {
        if err.is_timeout() {
            GenerateError::Timeout(self.timeout.as_secs())
        } else if err.is_connect() {
            GenerateError::Unreachable(self.endpoint.to_string())
        } else {
            GenerateError::Request(err.to_string())
        }
    }
}

#[async_trait]
impl Generator for OllamaClient {
    async fn generate(
        &self,
        task: &str,
        cancel: &CancellationToken,
    ) -> Result<Generation, GenerateError> {
        debug!("Requesting subtasks for '{}' from {}", task, self.endpoint);

        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(GenerateError::Cancelled),
            response = self.request(task) => response?,
        };

        if response.response.trim().is_empty() {
            return Err(GenerateError::EmptyResponse);
        }

        let subtasks = parse_subtasks(&response.response);
        if subtasks.is_empty() {
            return Err(GenerateError::NoValidSubtasks);
        }

        let tokens = response
            .eval_count
            .unwrap_or_else(|| estimate_tokens(&response.response));

        Ok(Generation { subtasks, tokens })
    }
}

/// Rough token count for endpoints that do not report one
fn estimate_tokens(text: &str) -> u64 {
    let words = text.split_whitespace().count() as u64;
    (words * 4).div_ceil(3)
}
