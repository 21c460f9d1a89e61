use std::time::Duration;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Bounded exponential backoff shared by every external data load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub factor: u32,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 100,
            factor: 2,
            max_delay_ms: 5_000,
        }
    }
}

impl RetryPolicy {
    /// A policy that tries once
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay before the retry following failed attempt `attempt` (1-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        let growth = u64::from(self.factor).saturating_pow(attempt.saturating_sub(1));
        Duration::from_millis(
            self.base_delay_ms
                .saturating_mul(growth)
                .min(self.max_delay_ms),
        )
    }

    /// Runs `operation` until it succeeds or the attempts are exhausted,
    /// returning the last error
    pub async fn run<T, F, Fut>(&self, what: &str, mut operation: F) -> Result<T, EngineError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, EngineError>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < attempts => {
                    let delay = self.delay(attempt);
                    warn!("Loading {what} failed (attempt {attempt}/{attempts}): {err}, retrying in {delay:?}");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    warn!("Loading {what} failed after {attempts} attempts: {err}");
                    return Err(err);
                }
            }
        }
    }
}
