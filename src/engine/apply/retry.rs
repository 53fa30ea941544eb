use std::time::Duration;

use rand::Rng;

use crate::engine::errors::ConfigurationError;
use crate::shared::config::RetryConfig;

/// Exponential backoff for retryable bulk request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// Fail a batch on its first request-level error.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    pub fn from_config(cfg: &RetryConfig) -> Self {
        Self {
            max_retries: cfg.max_retries,
            initial_backoff: Duration::from_millis(cfg.initial_backoff_ms),
            max_backoff: Duration::from_millis(cfg.max_backoff_ms),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.initial_backoff > self.max_backoff {
            return Err(ConfigurationError::InvalidRetry(format!(
                "initial backoff {:?} exceeds max backoff {:?}",
                self.initial_backoff, self.max_backoff
            )));
        }
        Ok(())
    }

    /// Delay before retry number `retry` (0-based): doubles each time, capped.
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry).unwrap_or(u32::MAX);
        self.initial_backoff
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }

    /// `backoff` with jitter in `[delay / 2, delay]`.
    pub fn jittered_backoff(&self, retry: u32) -> Duration {
        let delay = self.backoff(retry).as_millis() as u64;
        if delay == 0 {
            return Duration::ZERO;
        }
        let ms = rand::thread_rng().gen_range(delay / 2..=delay);
        Duration::from_millis(ms)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}
