//! Stand-ins for the generation endpoint

use async_trait::async_trait;
use axum::routing::post;
use axum::{Json, Router};
use helper_core::{GenerateError, Generation, Generator};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

/// Serve a fixed `/api/generate` reply on an ephemeral port and return its URL
pub async fn spawn_endpoint(response: &str) -> String {
    let body: Value = json!({ "response": response, "eval_count": 12 });
    let router = Router::new().route(
        "/api/generate",
        post(move || {
            let body = body.clone();
            async move { Json(body) }
        }),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}/api/generate", addr)
}

/// A port nothing listens on
pub async fn closed_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/api/generate", addr)
}

/// Generator that blocks every call until the test opens the gate
#[derive(Clone)]
pub struct Gated {
    gate: Arc<Semaphore>,
    calls: Arc<AtomicUsize>,
}

impl Gated {
    /// Gate starts closed
    pub fn new() -> Self {
        Self {
            gate: Arc::new(Semaphore::new(0)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Let `n` pending or future calls through
    pub fn open(&self, n: usize) {
        self.gate.add_permits(n);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Generator for Gated {
    async fn generate(
        &self,
        task: &str,
        cancel: &CancellationToken,
    ) -> Result<Generation, GenerateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::select! {
            _ = cancel.cancelled() => Err(GenerateError::Cancelled),
            permit = self.gate.acquire() => {
                permit.map_err(|e| GenerateError::Request(e.to_string()))?.forget();
                Ok(Generation {
                    subtasks: vec![format!("1. Plan {}", task), "2. Build it".to_string()],
                    tokens: 8,
                })
            }
        }
    }
}
