//! OpenAI Provider Implementation
//!
//! Chat-completions client used as the production reasoning service.
//!
//! # Features
//!
//! - Async HTTP communication with the `/chat/completions` endpoint
//! - Fixed seed and JSON-object response format for reproducible extraction
//! - Retry logic with exponential backoff for transport errors, 429 and 5xx
//! - Temperature omitted for reasoning models, which reject it
//!
//! # Examples
//!
//! ```no_run
//! use papyrus_llm::OpenAiProvider;
//!
//! let provider = OpenAiProvider::new("sk-...", "gpt-5-mini").unwrap();
//! ```

use crate::retry::RetryPolicy;
use crate::LlmError;
use async_trait::async_trait;
use papyrus_domain::traits::{Completion, CompletionRequest, ReasoningService};
use papyrus_domain::TokenUsage;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default OpenAI API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model
pub const DEFAULT_MODEL: &str = "gpt-5-mini";

/// Default deadline for one attempt (35 seconds)
///
/// Three attempts plus backoff fit inside the default 120s extraction timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 35;

/// Default number of attempts per call
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Provider settings, loaded from the `[llm]` config section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    /// Model identifier
    pub model: String,

    /// API base URL
    pub base_url: String,

    /// Environment variable holding the API key (the key itself is never stored)
    pub api_key_env: String,

    /// Attempts per call, including the first
    pub max_retries: u32,

    /// HTTP timeout for one attempt (seconds)
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key_env: API_KEY_ENV.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl OpenAiConfig {
    /// Fewer attempts and a shorter timeout
    pub fn aggressive() -> Self {
        Self {
            max_retries: 1,
            timeout_secs: 30,
            ..Self::default()
        }
    }

    /// More attempts and a longer timeout
    pub fn lenient() -> Self {
        Self {
            max_retries: 5,
            timeout_secs: 55,
            ..Self::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("model must not be empty".to_string());
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(format!("base_url '{}' is not an http(s) URL", self.base_url));
        }
        if self.api_key_env.trim().is_empty() {
            return Err("api_key_env must not be empty".to_string());
        }
        if self.max_retries == 0 {
            return Err("max_retries must be greater than 0".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Retry policy for one call
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_secs(self.timeout_secs))
    }

    /// Worst-case time of one call, all attempts and pauses included
    pub fn call_budget(&self) -> Duration {
        self.retry_policy().budget()
    }
}

/// OpenAI chat-completions provider
pub struct OpenAiProvider {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
    retry: RetryPolicy,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<Metadata<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Serialize)]
struct Metadata<'a> {
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
    #[serde(default)]
    total_tokens: u64,
}

/// Whether a model rejects the `temperature` parameter
pub fn is_reasoning_model(model: &str) -> bool {
    model.starts_with("o1")
        || model.starts_with("o3")
        || model.starts_with("gpt-5")
        || model.contains("-o1")
        || model.contains("-o3")
}

impl OpenAiProvider {
    /// Create a new OpenAI provider
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the API key is empty or the HTTP client
    /// cannot be built.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, LlmError> {
        Self::with_timeout(api_key.into(), model.into(), DEFAULT_TIMEOUT_SECS)
    }

    /// Create a provider from config, reading the key from `config.api_key_env`
    pub fn from_config(config: &OpenAiConfig) -> Result<Self, LlmError> {
        config.validate().map_err(LlmError::Configuration)?;
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| LlmError::Authentication(format!("{} not set", config.api_key_env)))?;
        Ok(Self::with_timeout(api_key, config.model.clone(), config.timeout_secs)?
            .with_base_url(config.base_url.clone())
            .with_max_retries(config.max_retries))
    }

    fn with_timeout(api_key: String, model: String, timeout_secs: u64) -> Result<Self, LlmError> {
        if api_key.trim().is_empty() {
            return Err(LlmError::Configuration("API key must not be empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| LlmError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            model,
            client,
            retry: RetryPolicy::new(DEFAULT_MAX_RETRIES, Duration::from_secs(timeout_secs)),
        })
    }

    /// Create a provider reading the key from `OPENAI_API_KEY`
    pub fn from_env(model: impl Into<String>) -> Result<Self, LlmError> {
        let api_key = std::env::var(API_KEY_ENV)
            .map_err(|_| LlmError::Authentication(format!("{} not set", API_KEY_ENV)))?;
        Self::new(api_key, model)
    }

    /// Set a custom base URL (proxies, compatible gateways)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the maximum number of attempts
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.retry = RetryPolicy::new(max_retries, self.retry.attempt_timeout);
        self
    }

    /// Retry policy in use
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Base URL in use
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_request<'a>(&'a self, request: &'a CompletionRequest) -> ChatRequest<'a> {
        let temperature = if is_reasoning_model(&self.model) {
            None
        } else {
            request.temperature
        };

        ChatRequest {
            model: &self.model,
            messages: vec![
                Message { role: "system", content: &request.system },
                Message { role: "user", content: &request.user },
            ],
            temperature,
            seed: request.seed,
            response_format: request
                .json_only
                .then_some(ResponseFormat { format_type: "json_object" }),
            metadata: request.label.as_deref().map(|prompt| Metadata { prompt }),
        }
    }

    async fn attempt(&self, body: &ChatRequest<'_>) -> Result<Completion, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| LlmError::Communication(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(match status.as_u16() {
                401 | 403 => LlmError::Authentication(format!("HTTP {}: {}", status, error_text)),
                404 => LlmError::ModelNotAvailable(self.model.clone()),
                429 => LlmError::RateLimitExceeded,
                s if s >= 500 => LlmError::Communication(format!("HTTP {}: {}", status, error_text)),
                _ => LlmError::InvalidResponse(format!("HTTP {}: {}", status, error_text)),
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LlmError::InvalidResponse("Response has no message content".to_string()))?;

        let usage = parsed.usage.map(|u| TokenUsage {
            input: u.prompt_tokens,
            output: u.completion_tokens,
            total: u.total_tokens,
        });

        Ok(Completion { text, usage })
    }
}

#[async_trait]
impl ReasoningService for OpenAiProvider {
    type Error = LlmError;

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, Self::Error> {
        let body = self.build_request(request);
        let completion = self.retry.run(&self.model, || self.attempt(&body)).await?;
        debug!(model = %self.model, chars = completion.text.len(), "Completion received");
        Ok(completion)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
