//! Mock backend for testing
//!
//! Returns a fixed response (or a fixed failure) and counts how often it was
//! asked, so cache behaviour can be asserted without a running model.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::AIBackend;

const DEFAULT_MOCK_RESPONSE: &str =
    "Track your daily spending and set aside a fixed amount for savings each month.";

#[derive(Clone, Debug)]
enum MockReply {
    Text(String),
    Fail { status: Option<u16>, message: String },
}

/// Mock AI backend for testing
///
/// Clones share the call counter.
#[derive(Clone, Debug)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    reply: MockReply,
    calls: Arc<AtomicUsize>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self::with_response(DEFAULT_MOCK_RESPONSE)
    }

    /// Create a mock that always answers with `text`
    pub fn with_response(text: &str) -> Self {
        Self {
            healthy: true,
            reply: MockReply::Text(text.to_string()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a mock whose every generate call fails as an upstream error
    pub fn failing(status: Option<u16>, message: &str) -> Self {
        Self {
            healthy: false,
            reply: MockReply::Fail {
                status,
                message: message.to_string(),
            },
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of generate calls received so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AIBackend for MockBackend {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            MockReply::Text(text) => Ok(text.clone()),
            MockReply::Fail { status, message } => Err(Error::Upstream {
                status: *status,
                message: message.clone(),
            }),
        }
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_counts_calls_across_clones() {
        let mock = MockBackend::new();
        let clone = mock.clone();
        mock.generate("a").await.unwrap();
        clone.generate("b").await.unwrap();
        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test]
    async fn test_failing_mock() {
        let mock = MockBackend::failing(Some(503), "model loading");
        let err = mock.generate("a").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Upstream {
                status: Some(503),
                ..
            }
        ));
        assert!(!mock.health_check().await);
    }
}
