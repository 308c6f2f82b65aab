//! Test utilities for spendwise-core
//!
//! A mock Ollama server that speaks just enough of the HTTP API for
//! integration tests and local development.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

/// Text returned by `MockOllamaServer::start`
pub const MOCK_INSIGHT: &str =
    "You are spending most on Food. Cook at home twice a week and move the savings into a recurring deposit.";

#[derive(Clone)]
enum Behaviour {
    Reply(String),
    Fail(StatusCode, String),
}

#[derive(Clone)]
struct MockState {
    behaviour: Behaviour,
    requests: Arc<AtomicUsize>,
    last_prompt: Arc<Mutex<Option<String>>>,
}

/// Mock Ollama server for testing and development
pub struct MockOllamaServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    state: MockState,
}

impl MockOllamaServer {
    /// Start a server that answers every generate call with `MOCK_INSIGHT`
    pub async fn start() -> Self {
        Self::start_with(Behaviour::Reply(MOCK_INSIGHT.to_string())).await
    }

    /// Start a server that answers every generate call with `text`
    pub async fn start_with_response(text: &str) -> Self {
        Self::start_with(Behaviour::Reply(text.to_string())).await
    }

    /// Start a server whose generate endpoint fails with `status` and an Ollama error body
    pub async fn start_failing(status: u16, error: &str) -> Self {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::start_with(Behaviour::Fail(status, error.to_string())).await
    }

    async fn start_with(behaviour: Behaviour) -> Self {
        let state = MockState {
            behaviour,
            requests: Arc::new(AtomicUsize::new(0)),
            last_prompt: Arc::new(Mutex::new(None)),
        };

        let app = Router::new()
            .route("/api/tags", get(handle_tags))
            .route("/api/generate", post(handle_generate))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
            state,
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Number of generate requests received
    pub fn generate_calls(&self) -> usize {
        self.state.requests.load(Ordering::SeqCst)
    }

    /// The prompt of the most recent generate request
    pub fn last_prompt(&self) -> Option<String> {
        self.state.last_prompt.lock().unwrap().clone()
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockOllamaServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Ollama tags endpoint response (health check)
async fn handle_tags() -> Json<TagsResponse> {
    Json(TagsResponse {
        models: vec![ModelInfo {
            name: "tinyllama:latest".to_string(),
            modified_at: "2024-01-01T00:00:00Z".to_string(),
            size: 637_000_000,
        }],
    })
}

/// Ollama generate endpoint
async fn handle_generate(
    State(state): State<MockState>,
    Json(request): Json<GenerateRequest>,
) -> Response {
    state.requests.fetch_add(1, Ordering::SeqCst);
    *state.last_prompt.lock().unwrap() = Some(request.prompt.clone());

    match state.behaviour {
        Behaviour::Reply(text) => Json(GenerateResponse {
            model: request.model,
            response: text,
            done: true,
        })
        .into_response(),
        Behaviour::Fail(status, error) => {
            (status, Json(serde_json::json!({ "error": error }))).into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    #[allow(dead_code)]
    stream: bool,
}

#[derive(Debug, Serialize)]
struct GenerateResponse {
    model: String,
    response: String,
    done: bool,
}

#[derive(Debug, Serialize)]
struct TagsResponse {
    models: Vec<ModelInfo>,
}

#[derive(Debug, Serialize)]
struct ModelInfo {
    name: String,
    modified_at: String,
    size: u64,
}
