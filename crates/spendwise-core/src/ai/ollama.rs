//! Ollama backend implementation
//!
//! HTTP client for the Ollama `/api/generate` endpoint with streaming off.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};

use super::AIBackend;

pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "tinyllama";

/// Ollama backend
#[derive(Clone)]
pub struct OllamaBackend {
    http_client: Client,
    base_url: String,
    model: String,
    timeout: Option<Duration>,
}

impl OllamaBackend {
    /// Create a new Ollama backend
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            timeout: None,
        }
    }

    /// Bound each generate request; without this only the transport's own limits apply
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Create from environment variables, falling back to local defaults
    pub fn from_env() -> Self {
        let host = std::env::var("OLLAMA_HOST").unwrap_or_else(|_| DEFAULT_OLLAMA_HOST.to_string());
        let model =
            std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| DEFAULT_OLLAMA_MODEL.to_string());

        let backend = Self::new(&host, &model);
        match std::env::var("OLLAMA_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            Some(secs) if secs > 0 => backend.with_timeout(Duration::from_secs(secs)),
            _ => backend,
        }
    }
}

/// Request to Ollama API
#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

/// Response from Ollama API
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

/// Ollama reports failures as `{"error": "..."}`
#[derive(Debug, Deserialize)]
struct OllamaErrorBody {
    error: String,
}

fn transport_error(e: reqwest::Error) -> Error {
    Error::Upstream {
        status: e.status().map(|s| s.as_u16()),
        message: e.to_string(),
    }
}

#[async_trait]
impl AIBackend for OllamaBackend {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = OllamaRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let mut builder = self
            .http_client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(|e| {
            warn!(host = %self.base_url, error = %e, "Ollama unreachable");
            transport_error(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<OllamaErrorBody>(&body)
                .map(|b| b.error)
                .unwrap_or_else(|_| {
                    if body.trim().is_empty() {
                        status
                            .canonical_reason()
                            .unwrap_or("Text generation failed")
                            .to_string()
                    } else {
                        body
                    }
                });
            warn!(status = status.as_u16(), message = %message, "Ollama returned an error");
            return Err(Error::Upstream {
                status: Some(status.as_u16()),
                message,
            });
        }

        let ollama_response: OllamaResponse = response.json().await.map_err(transport_error)?;
        debug!(
            model = %self.model,
            chars = ollama_response.response.len(),
            "Ollama response received"
        );

        Ok(ollama_response.response)
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}
