//! Retry configuration and client decorator.
//!
//! [`RetryingClient`] wraps an [`InferenceClient`] with automatic retry on
//! transient errors (as classified by
//! [`HermodError::is_transient()`](crate::HermodError::is_transient)),
//! using exponential backoff and respecting provider `retry_after` hints.
//! Retries happen inside one logical upstream call, so the orchestrator's
//! single-flight guarantee is unaffected.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use super::{CompletionRequest, InferenceClient};
use crate::telemetry;
use crate::types::Completion;
use crate::Result;

/// Configuration for retry behaviour on transient errors.
///
/// ```rust
/// # use hermod::RetryConfig;
/// # use std::time::Duration;
/// let config = RetryConfig::new()
///     .max_attempts(5)
///     .initial_delay(Duration::from_millis(200));
/// ```
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the initial request).
    /// 1 = no retry. Default: 3.
    pub max_attempts: u32,
    /// Base delay before the first retry. Default: 500ms.
    pub initial_delay: Duration,
    /// Maximum delay between retries (caps exponential growth). Default: 30s.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryConfig {
    /// Create a new config with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum attempts (including the initial request).
    pub fn max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = n;
        self
    }

    /// Set the base delay before the first retry.
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the maximum delay between retries.
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Calculate the delay for a given attempt number (0-indexed).
    ///
    /// Exponential backoff: `initial_delay * 2^attempt`, capped at `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self
            .initial_delay
            .saturating_mul(2u32.saturating_pow(attempt));
        delay.min(self.max_delay)
    }

    /// Calculate the effective delay, respecting provider `retry_after` hints.
    ///
    /// A `retry_after` duration (from a `RateLimited` error) takes
    /// precedence over the calculated backoff.
    pub fn effective_delay(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        retry_after.unwrap_or_else(|| self.delay_for_attempt(attempt))
    }
}

/// Decorator that wraps an [`InferenceClient`] with retry logic.
///
/// Permanent errors are returned immediately without retry.
pub struct RetryingClient {
    inner: Arc<dyn InferenceClient>,
    config: RetryConfig,
}

impl RetryingClient {
    /// Wrap a client with retry logic.
    pub fn new(inner: Arc<dyn InferenceClient>, config: RetryConfig) -> Self {
        Self { inner, config }
    }
}

#[async_trait]
impl InferenceClient for RetryingClient {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        let mut last_err = None;
        for attempt in 0..self.config.max_attempts {
            match self.inner.complete(request).await {
                Ok(completion) => return Ok(completion),
                Err(e) if e.is_transient() => {
                    if attempt + 1 < self.config.max_attempts {
                        metrics::counter!(telemetry::RETRIES_TOTAL,
                            "provider" => self.inner.name().to_owned(),
                        )
                        .increment(1);
                        let delay = self.config.effective_delay(attempt, e.retry_after());
                        warn!(
                            provider = self.inner.name(),
                            attempt = attempt + 1,
                            max_attempts = self.config.max_attempts,
                            delay_ms = delay.as_millis() as u64,
                            error = %e,
                            "retrying after transient error"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    last_err = Some(e);
                }
                Err(e) => return Err(e), // permanent error, no retry
            }
        }
        Err(last_err.unwrap_or(crate::HermodError::Provider {
            message: "retry budget exhausted".into(),
        }))
    }
}
