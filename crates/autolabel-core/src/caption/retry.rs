//! Retry policy for caption calls.
//!
//! Only transient failures are retried: stage timeouts, HTTP 429 and 5xx, and
//! connection-level errors that carry no status.

use std::time::Duration;

use crate::config::PipelineConfig;
use crate::error::PipelineError;

/// Upper bound on a single backoff sleep.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// How many times to retry a caption, and how long to wait between tries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            max_retries: config.retry_attempts,
            base_delay: Duration::from_millis(config.retry_delay_ms),
        }
    }

    /// Whether `error`, seen after `retries_so_far` retries, earns another try.
    pub fn should_retry(&self, error: &PipelineError, retries_so_far: u32) -> bool {
        retries_so_far < self.max_retries && is_transient(error)
    }

    /// Sleep before retry number `retry` (zero-based): doubling, capped.
    pub fn delay(&self, retry: u32) -> Duration {
        let factor = 2u32.checked_pow(retry).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(MAX_BACKOFF)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

fn is_transient(error: &PipelineError) -> bool {
    match error {
        PipelineError::Timeout { .. } => true,
        PipelineError::Caption {
            status_code: Some(code),
            ..
        } => *code == 429 || (500..600).contains(code),
        PipelineError::Caption { message, .. } => {
            let message = message.to_ascii_lowercase();
            message.contains("timed out") || message.contains("connect")
        }
        _ => false,
    }
}
