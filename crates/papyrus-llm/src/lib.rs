//! Papyrus LLM Provider Layer
//!
//! Reasoning-service implementations for the extraction pipeline.
//!
//! # Architecture
//!
//! This crate provides implementations of the `ReasoningService` trait from
//! `papyrus-domain`. Retries for transient failures live here, inside the
//! provider, so callers see at most one error per logical call.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic mock for testing
//! - `OpenAiProvider`: OpenAI chat-completions API
//!
//! # Examples
//!
//! ```
//! use papyrus_llm::MockProvider;
//! use papyrus_domain::traits::{CompletionRequest, ReasoningService};
//!
//! let rt = tokio::runtime::Runtime::new().unwrap();
//! let provider = MockProvider::new(r#"{"iniciativas": []}"#);
//! let request = CompletionRequest {
//!     system: "instrucciones".to_string(),
//!     user: "<DOCUMENTO>texto</DOCUMENTO>".to_string(),
//!     seed: Some(1),
//!     temperature: None,
//!     json_only: true,
//!     label: None,
//! };
//! let completion = rt.block_on(provider.complete(&request)).unwrap();
//! assert_eq!(completion.text, r#"{"iniciativas": []}"#);
//! ```

#![warn(missing_docs)]

pub mod openai;
pub mod retry;

use async_trait::async_trait;
use papyrus_domain::traits::{Completion, CompletionRequest, ReasoningService};
use papyrus_domain::TokenUsage;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;

pub use openai::{OpenAiConfig, OpenAiProvider};
pub use retry::RetryPolicy;

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Credentials missing or rejected
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Provider misconfigured
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

impl LlmError {
    /// Whether another attempt could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, LlmError::Communication(_) | LlmError::RateLimitExceeded)
    }
}

const ERROR_SENTINEL: &str = "ERROR";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Mock reasoning service for deterministic testing
///
/// Returns pre-configured responses without making any network calls.
/// A response is chosen by the first registered key that occurs in the
/// user message; otherwise the default response is returned.
///
/// # Examples
///
/// ```
/// use papyrus_llm::MockProvider;
///
/// let mut provider = MockProvider::default();
/// provider.add_response("documento-1", r#"{"iniciativas": []}"#);
/// provider.add_error("documento-2");
/// assert_eq!(provider.call_count(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    model: String,
    default_response: String,
    responses: Arc<Mutex<Vec<(String, String)>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
    call_count: Arc<Mutex<usize>>,
    usage: Option<TokenUsage>,
    delay: Option<Duration>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all requests
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            model: "mock-model".to_string(),
            default_response: response.into(),
            responses: Arc::new(Mutex::new(Vec::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
            usage: None,
            delay: None,
        }
    }

    /// Set the model name reported to callers
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Report this token usage with every completion
    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = Some(usage);
        self
    }

    /// Sleep before answering (to exercise timeouts)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Add a specific response for user messages containing `key`
    pub fn add_response(&mut self, key: impl Into<String>, response: impl Into<String>) {
        let key = key.into();
        let response = response.into();
        let mut responses = lock(&self.responses);
        match responses.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = response,
            None => responses.push((key, response)),
        }
    }

    /// Configure to return an error for user messages containing `key`
    pub fn add_error(&mut self, key: impl Into<String>) {
        self.add_response(key, ERROR_SENTINEL);
    }

    /// Get the number of times complete was called
    pub fn call_count(&self) -> usize {
        *lock(&self.call_count)
    }

    /// Reset the call count and recorded requests
    pub fn reset_call_count(&self) {
        *lock(&self.call_count) = 0;
        lock(&self.requests).clear();
    }

    /// Requests received so far, in call order
    pub fn requests(&self) -> Vec<CompletionRequest> {
        lock(&self.requests).clone()
    }

    fn respond_to(&self, user: &str) -> String {
        lock(&self.responses)
            .iter()
            .find(|(key, _)| user.contains(key.as_str()))
            .map(|(_, response)| response.clone())
            .unwrap_or_else(|| self.default_response.clone())
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new(r#"{"iniciativas": []}"#)
    }
}

#[async_trait]
impl ReasoningService for MockProvider {
    type Error = LlmError;

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, Self::Error> {
        *lock(&self.call_count) += 1;
        lock(&self.requests).push(request.clone());

        let response = self.respond_to(&request.user);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if response == ERROR_SENTINEL {
            return Err(LlmError::Other("Mock error".to_string()));
        }

        Ok(Completion {
            text: response,
            usage: self.usage,
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
