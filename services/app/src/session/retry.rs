//! services/app/src/session/retry.rs
//!
//! A bounded retry policy with a fixed backoff, and the sleep abstraction it
//! waits through.

use async_trait::async_trait;
use foodshare_core::ports::PortResult;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

//=========================================================================================
// Sleeper
//=========================================================================================

/// Waits for a duration. Swapped out in tests so retries run instantly.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

//=========================================================================================
// RetryPolicy
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self { max_attempts, backoff }
    }

    /// Calls `attempt` until it yields a value or the attempts run out.
    ///
    /// `Ok(None)` and `Err(_)` both count as a failed attempt. The backoff is
    /// slept between attempts, never after the last one. A policy with zero
    /// attempts still tries once.
    pub async fn run<T, F, Fut>(&self, sleeper: &dyn Sleeper, what: &str, mut attempt: F) -> Option<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = PortResult<Option<T>>>,
    {
        let attempts = self.max_attempts.max(1);
        for n in 1..=attempts {
            match attempt(n).await {
                Ok(Some(value)) => return Some(value),
                Ok(None) => warn!("{}: attempt {}/{} found nothing", what, n, attempts),
                Err(e) => warn!("{}: attempt {}/{} failed: {}", what, n, attempts, e),
            }
            if n < attempts {
                sleeper.sleep(self.backoff).await;
            }
        }
        None
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

#[cfg(test)]
#[path = "retry_test.rs"]
mod tests;
