//! Bounded retries with capped exponential backoff.
//!
//! [`RetryPolicy::execute`] re-runs an async operation while its error reports
//! itself as transient through [`Retryable`]. A permanent error ends the loop
//! at once; a transient one is retried until `max_retries` extra attempts have
//! been spent.

use crate::error::Retryable;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// How many times to retry and how long to wait in between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Extra attempts after the first one
    pub max_retries: u32,
    /// Wait before the first retry; doubles for each following retry
    pub initial_delay: Duration,
    /// Upper bound on the doubled wait, before jitter
    pub max_delay: Duration,
    /// Add up to 25% random extra wait
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// A configuration that never retries.
    #[must_use]
    pub fn no_retries() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Set the number of retries.
    #[must_use]
    pub const fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the first backoff.
    #[must_use]
    pub const fn with_initial_delay(mut self, initial: Duration) -> Self {
        self.initial_delay = initial;
        self
    }

    /// Set the backoff cap.
    #[must_use]
    pub const fn with_max_delay(mut self, cap: Duration) -> Self {
        self.max_delay = cap;
        self
    }

    /// Wait exactly the computed backoff.
    #[must_use]
    pub const fn without_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }
}

/// Runs operations under a [`RetryConfig`].
#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    /// Build a policy from its configuration.
    #[must_use]
    pub const fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Extra attempts this policy allows.
    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.config.max_retries
    }

    /// Wait before retry number `retry` (zero-based).
    ///
    /// `initial_delay * 2^retry`, capped at `max_delay`, plus jitter when
    /// enabled. Without jitter the result never decreases as `retry` grows.
    #[must_use]
    pub fn delay_for_attempt(&self, retry: u32) -> Duration {
        let factor = 2u32.checked_pow(retry).unwrap_or(u32::MAX);
        let backoff = self
            .config
            .initial_delay
            .saturating_mul(factor)
            .min(self.config.max_delay);

        if !self.config.jitter {
            return backoff;
        }
        let spread_ms = u64::try_from(backoff.as_millis() / 4).unwrap_or(u64::MAX);
        backoff + Duration::from_millis(rand::thread_rng().gen_range(0..=spread_ms))
    }

    /// Whether `error` deserves another attempt after `retries_done` retries.
    #[must_use]
    pub fn should_retry<E: Retryable>(&self, error: &E, retries_done: u32) -> bool {
        error.is_retryable() && retries_done < self.config.max_retries
    }

    /// Run `operation` until it succeeds, fails permanently, or the retry
    /// budget is spent.
    ///
    /// `operation_name` labels the backoff warnings.
    ///
    /// # Errors
    ///
    /// The first permanent error, or the error of the last attempt.
    pub async fn execute<F, Fut, T, E>(&self, operation_name: &str, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + std::fmt::Display,
    {
        let mut retries = 0;
        loop {
            let error = match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            if !self.should_retry(&error, retries) {
                if retries > 0 {
                    debug!(operation = operation_name, retries, "Retry budget spent or error permanent");
                }
                return Err(error);
            }

            let delay = self.delay_for_attempt(retries);
            retries += 1;
            warn!(
                operation = operation_name,
                retry = retries,
                max_retries = self.config.max_retries,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %error,
                "Transient failure, backing off"
            );
            tokio::time::sleep(delay).await;
        }
    }
}
