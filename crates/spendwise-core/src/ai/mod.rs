//! Pluggable text-generation backend
//!
//! The insight composer only needs one operation from a language model:
//! prompt in, free text out. Everything model-specific lives behind
//! `AIBackend`.
//!
//! # Architecture
//!
//! - `AIBackend` trait: the interface every backend implements
//! - `AIClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `OllamaBackend`, `MockBackend`
//!
//! # Configuration
//!
//! Environment variables:
//! - `AI_BACKEND`: Backend to use (ollama, mock). Default: ollama
//! - `OLLAMA_HOST`: Ollama server URL (default: http://localhost:11434)
//! - `OLLAMA_MODEL`: Model name (default: tinyllama)
//! - `OLLAMA_TIMEOUT_SECS`: Optional request timeout in seconds

mod mock;
mod ollama;

pub use mock::MockBackend;
pub use ollama::{OllamaBackend, DEFAULT_OLLAMA_HOST, DEFAULT_OLLAMA_MODEL};

use async_trait::async_trait;

use crate::error::Result;

/// Interface for text-generation backends
///
/// Backends must be Send + Sync so one instance can serve every request task.
#[async_trait]
pub trait AIBackend: Send + Sync {
    /// Send a prompt and return the generated text
    ///
    /// One attempt per call; failures surface as `Error::Upstream`.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Check if the backend is reachable
    async fn health_check(&self) -> bool;

    /// Get the model name
    fn model(&self) -> &str;

    /// Get the host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete AI client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum AIClient {
    /// Ollama backend (HTTP API)
    Ollama(OllamaBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl AIClient {
    /// Create an AI client from environment variables
    ///
    /// `AI_BACKEND=mock` selects the mock backend; anything else uses Ollama
    /// with its defaults filled in.
    pub fn from_env() -> Self {
        let backend = std::env::var("AI_BACKEND").unwrap_or_else(|_| "ollama".to_string());

        match backend.to_lowercase().as_str() {
            "ollama" => AIClient::Ollama(OllamaBackend::from_env()),
            "mock" => AIClient::Mock(MockBackend::new()),
            _ => {
                tracing::warn!(backend = %backend, "Unknown AI_BACKEND, falling back to ollama");
                AIClient::Ollama(OllamaBackend::from_env())
            }
        }
    }

    /// Create an Ollama backend directly
    pub fn ollama(host: &str, model: &str) -> Self {
        AIClient::Ollama(OllamaBackend::new(host, model))
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        AIClient::Mock(MockBackend::new())
    }
}

#[async_trait]
impl AIBackend for AIClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        match self {
            AIClient::Ollama(b) => b.generate(prompt).await,
            AIClient::Mock(b) => b.generate(prompt).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            AIClient::Ollama(b) => b.health_check().await,
            AIClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            AIClient::Ollama(b) => b.model(),
            AIClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            AIClient::Ollama(b) => b.host(),
            AIClient::Mock(b) => b.host(),
        }
    }
}
