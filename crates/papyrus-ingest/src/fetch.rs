//! Remote content fetching
//!
//! `HttpFetcher` downloads PDF and HTML sources with a desktop-browser
//! identity, a bounded timeout and a bounded retry policy. `MockFetcher`
//! serves canned bytes for tests.

use crate::error::{IngestError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, warn};

/// Desktop browser identity; many official sites reject unidentified clients
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Downloads raw bytes for a URL
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Fetch the body of `url`
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Fetcher configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Timeout per request, in seconds
    pub timeout_secs: u64,

    /// Attempts per URL (transport errors, 429 and 5xx only)
    pub max_attempts: u32,

    /// User-Agent header
    pub user_agent: String,

    /// Maximum redirects followed
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_attempts: 3,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_redirects: 5,
        }
    }
}

impl FetchConfig {
    /// Fail fast: short timeout, single attempt
    pub fn aggressive() -> Self {
        Self {
            timeout_secs: 10,
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Patient: long timeout, more attempts
    pub fn lenient() -> Self {
        Self {
            timeout_secs: 90,
            max_attempts: 4,
            ..Self::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.timeout_secs == 0 {
            return Err("timeout_secs must be greater than 0".to_string());
        }
        if self.max_attempts == 0 {
            return Err("max_attempts must be greater than 0".to_string());
        }
        if self.user_agent.trim().is_empty() {
            return Err("user_agent must not be empty".to_string());
        }
        Ok(())
    }

    /// Request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// HTTP fetcher backed by reqwest
pub struct HttpFetcher {
    client: reqwest::Client,
    max_attempts: u32,
}

enum Attempt {
    Done(Vec<u8>),
    Retry(IngestError),
    Fail(IngestError),
}

impl HttpFetcher {
    /// Build a fetcher from configuration
    pub fn new(config: &FetchConfig) -> Result<Self> {
        config.validate().map_err(IngestError::Configuration)?;

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/pdf,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            reqwest::header::HeaderValue::from_static("es-ES,es;q=0.9,en;q=0.5"),
        );

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()
            .map_err(|e| IngestError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            max_attempts: config.max_attempts,
        })
    }

    async fn attempt(&self, url: &str) -> Attempt {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => return Attempt::Retry(IngestError::fetch(url, format!("Request failed: {}", e))),
        };

        let status = response.status();
        if !status.is_success() {
            let error = IngestError::fetch(url, format!("HTTP {}", status));
            return if status.as_u16() == 429 || status.is_server_error() {
                Attempt::Retry(error)
            } else {
                Attempt::Fail(error)
            };
        }

        match response.bytes().await {
            Ok(bytes) => Attempt::Done(bytes.to_vec()),
            Err(e) => Attempt::Retry(IngestError::fetch(url, format!("Failed to read body: {}", e))),
        }
    }
}

#[async_trait]
impl ContentFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let mut attempts = 0;
        let mut last_error = None;

        while attempts < self.max_attempts {
            match self.attempt(url).await {
                Attempt::Done(bytes) => {
                    debug!(url, bytes = bytes.len(), "Fetched");
                    return Ok(bytes);
                }
                Attempt::Fail(e) => return Err(e),
                Attempt::Retry(e) => {
                    warn!(url, attempt = attempts + 1, error = %e, "Fetch attempt failed");
                    last_error = Some(e);
                }
            }

            attempts += 1;
            if attempts < self.max_attempts {
                // Exponential backoff: 1s, 2s, 4s, etc.
                let delay = Duration::from_secs(2u64.pow(attempts - 1));
                tokio::time::sleep(delay).await;
            }
        }

        Err(last_error.unwrap_or_else(|| IngestError::fetch(url, "max attempts exceeded")))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// In-memory fetcher for tests
///
/// Unknown URLs fail with a 404-style fetch error.
#[derive(Debug, Clone, Default)]
pub struct MockFetcher {
    pages: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    call_count: Arc<Mutex<usize>>,
}

impl MockFetcher {
    /// Create an empty mock
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for `url`
    pub fn add_page(&mut self, url: impl Into<String>, body: impl Into<Vec<u8>>) {
        lock(&self.pages).insert(url.into(), body.into());
    }

    /// Number of fetch calls so far
    pub fn call_count(&self) -> usize {
        *lock(&self.call_count)
    }
}

#[async_trait]
impl ContentFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        *lock(&self.call_count) += 1;
        lock(&self.pages)
            .get(url)
            .cloned()
            .ok_or_else(|| IngestError::fetch(url, "HTTP 404 Not Found"))
    }
}
