//! Bounded retry for transient request failures.
//!
//! Every resource call runs through [`RetryPolicy::run`]. Only errors for
//! which [`Error::is_transient`] holds are retried (connection failures,
//! timeouts, HTTP 5xx); everything else surfaces on the first attempt.
//! Dropping the returned future cancels both the in-flight attempt and
//! any pending delay.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::Error;

/// Delay schedule between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backoff {
    /// Same delay before every retry.
    #[default]
    Fixed,
    /// `delay * 2^retry`, never exceeding `max_delay`.
    Exponential { max_delay: Duration },
}

/// Retry settings for one client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts = `max_retries + 1`.
    pub max_retries: u32,
    /// Fixed delay, or the base delay for exponential backoff.
    pub delay: Duration,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay: Duration::from_secs(1),
            backoff: Backoff::Fixed,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay to wait before retry number `retry` (0-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.delay,
            Backoff::Exponential { max_delay } => {
                let factor = 2_u32.checked_pow(retry).unwrap_or(u32::MAX);
                self.delay.saturating_mul(factor).min(max_delay)
            }
        }
    }

    /// Run `op` until it succeeds, fails non-transiently, or the retry
    /// budget is spent. The last error is returned unchanged.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, Error>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        let mut retry: u32 = 0;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && retry < self.max_retries => {
                    let delay = self.delay_for(retry);
                    warn!(
                        error = %err,
                        attempt = retry + 1,
                        max_attempts = self.max_retries.saturating_add(1),
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "transient failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
