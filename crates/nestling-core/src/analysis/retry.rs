//! Bounded fixed-interval retry for transient cloud failures.

use nestling_types::{AnalysisConfig, AnalysisError};
use std::time::Duration;
use tokio::time::sleep;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryStrategy {
    NoRetry,
    FixedDelay(Duration),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub interval: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, interval: Duration) -> Self {
        Self { max_retries, interval }
    }

    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// `attempt` is zero-based: the first call is attempt 0.
    pub fn determine(&self, error: &AnalysisError, attempt: u32) -> RetryStrategy {
        if !error.is_transient() || attempt >= self.max_retries {
            return RetryStrategy::NoRetry;
        }
        RetryStrategy::FixedDelay(self.interval)
    }

    /// Sleeps as the strategy says. Returns `true` if the caller should retry.
    pub async fn apply(&self, strategy: RetryStrategy, attempt: u32, error: &AnalysisError) -> bool {
        match strategy {
            RetryStrategy::NoRetry => {
                tracing::debug!("Not retrying after {}", error);
                false
            },
            RetryStrategy::FixedDelay(delay) => {
                tracing::warn!(
                    "Retrying cloud analysis: error={}, attempt={}/{}, delay={}ms",
                    error,
                    attempt + 1,
                    self.max_retries,
                    delay.as_millis()
                );
                sleep(delay).await;
                true
            },
        }
    }
}

impl From<&AnalysisConfig> for RetryPolicy {
    fn from(config: &AnalysisConfig) -> Self {
        Self::new(config.max_retry_count, config.retry_interval())
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&AnalysisConfig::default())
    }
}
