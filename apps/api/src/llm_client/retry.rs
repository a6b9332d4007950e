//! Exponential backoff around a single-attempt `TextGenerator`.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, warn};

use super::{LlmError, TextGenerator};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_secs(1);
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Which errors to retry is decided by `LlmError::is_retryable`; this only
/// holds the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first. Zero is treated as one.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
            max_backoff: DEFAULT_MAX_BACKOFF,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based): initial, 2x, 4x, ... capped.
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry.saturating_sub(1)).unwrap_or(u32::MAX);
        self.initial_backoff
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }
}

/// Wraps any generator with the retry schedule. Non-retryable errors are
/// returned on the first failure.
pub struct RetryingGenerator<G> {
    inner: G,
    policy: RetryPolicy,
}

impl<G: TextGenerator> RetryingGenerator<G> {
    pub fn new(inner: G, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &G {
        &self.inner
    }
}

#[async_trait]
impl<G: TextGenerator> TextGenerator for RetryingGenerator<G> {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.inner.generate(prompt).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    let delay = self.policy.backoff(attempt);
                    warn!(
                        "LLM call attempt {}/{} failed ({}), retrying after {}ms...",
                        attempt,
                        max_attempts,
                        e,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    if e.is_retryable() {
                        error!("LLM call failed after {} attempts: {}", attempt, e);
                    } else {
                        warn!("LLM call failed with non-retryable error: {}", e);
                    }
                    return Err(e);
                }
            }
        }
    }
}
