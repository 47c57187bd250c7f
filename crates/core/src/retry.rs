//! Retry wrapper with exponential backoff
//!
//! Used for the short metadata-style calls around an upload (folder
//! creation, permission grants) where any failure is worth a couple more
//! attempts. Chunk sends have their own bounded retry loop in the upload
//! engine and do not go through this wrapper.

use std::time::Duration;

use crate::error::Result;

/// Backoff policy for non-chunk remote calls
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    /// Smallest delay between attempts
    pub floor: Duration,

    /// Largest delay between attempts
    pub cap: Duration,

    /// Delay multiplier applied per attempt
    pub multiplier: u32,

    /// Total attempts, including the first
    pub max_attempts: u32,
}

impl Default for BackoffPolicy {
    /// Delays of 3s then 6s between three total attempts.
    fn default() -> Self {
        Self {
            floor: Duration::from_secs(3),
            cap: Duration::from_secs(6),
            multiplier: 2,
            max_attempts: 3,
        }
    }
}

impl BackoffPolicy {
    /// Delay before re-running attempt number `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exp = self.multiplier.saturating_pow(attempt.saturating_sub(1));
        let delay = self.floor.saturating_mul(exp);
        delay.min(self.cap)
    }
}

/// Retry a fallible async operation with exponential backoff.
///
/// Every error type is eligible for retry; exhausting the attempt budget
/// surfaces the last underlying error rather than a generic retry error.
pub async fn retry_with_backoff<T, F, Fut>(policy: &BackoffPolicy, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                if attempt >= policy.max_attempts {
                    return Err(e);
                }

                let backoff = policy.delay_after(attempt);
                tracing::debug!(
                    attempt = attempt,
                    backoff_ms = backoff.as_millis(),
                    error = %e,
                    "Retrying after failed call"
                );

                tokio::time::sleep(backoff).await;
            }
        }
    }
}
