//! Bounded retries for one logical reasoning-service call

use crate::LlmError;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

/// Attempt count, per-attempt deadline and backoff for one call
///
/// A retryable failure (transport error, timeout, 429, 5xx) is followed by
/// an exponential pause of 1s, 2s, 4s and so on before the next attempt.
/// Any other error ends the call at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per call, including the first
    pub max_attempts: u32,

    /// Deadline for a single attempt
    pub attempt_timeout: Duration,
}

impl RetryPolicy {
    /// Create a policy; at least one attempt is always made
    pub fn new(max_attempts: u32, attempt_timeout: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            attempt_timeout,
        }
    }

    /// Pause after failed attempt `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_secs(2u64.saturating_pow(attempt.saturating_sub(1)))
    }

    /// Worst-case wall time of a call: every attempt runs to its deadline
    pub fn budget(&self) -> Duration {
        let pauses: Duration = (1..self.max_attempts).map(|a| self.backoff(a)).sum();
        self.attempt_timeout * self.max_attempts + pauses
    }

    /// Run `op` until it succeeds, fails for good, or attempts run out
    ///
    /// An attempt that outlives `attempt_timeout` is dropped and counted as a
    /// retryable communication failure.
    pub async fn run<T, F, Fut>(&self, service: &str, mut op: F) -> Result<T, LlmError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, LlmError>>,
    {
        let mut last_error = None;

        for attempt in 1..=self.max_attempts {
            let outcome = match timeout(self.attempt_timeout, op()).await {
                Ok(outcome) => outcome,
                Err(_) => Err(LlmError::Communication(format!(
                    "attempt timed out after {}s",
                    self.attempt_timeout.as_secs()
                ))),
            };

            match outcome {
                Ok(value) => {
                    debug!(service, attempts = attempt, "Call succeeded");
                    return Ok(value);
                }
                Err(e) if e.is_retryable() => {
                    warn!(service, attempt, error = %e, "Attempt failed");
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }

            if attempt < self.max_attempts {
                sleep(self.backoff(attempt)).await;
            }
        }

        Err(last_error.unwrap_or_else(|| LlmError::Communication("Max retries exceeded".to_string())))
    }
}
