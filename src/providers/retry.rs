//! Rate-limit retry policy and the shared retry loop.
//!
//! Provider throttling (HTTP 429) is the only condition retried here. Each
//! retry waits `base_cooldown * (attempt + 1)`, publishes an
//! [`Advisory::RateLimited`] naming the resume time, and holds back every
//! caller sharing the [`RateLimiter`] for the duration.

use std::future::Future;
use std::time::Duration;

use chrono::{Local, TimeDelta};
use tracing::warn;

use super::throttle::RateLimiter;
use crate::telemetry;
use crate::types::{Advisory, AdvisorySink};
use crate::{Result, ScrapeError};

/// Configuration for retrying throttled provider calls.
///
/// ```rust
/// # use gridscrape::RetryPolicy;
/// # use std::time::Duration;
/// let policy = RetryPolicy::new()
///     .max_retries(3)
///     .base_cooldown(Duration::from_secs(60));
/// assert_eq!(policy.cooldown_for_attempt(1), Duration::from_secs(120));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the initial attempt. Default: 5.
    pub max_retries: u32,
    /// Cooldown unit; attempt `n` waits `(n + 1)` units. Default: 120s.
    pub base_cooldown: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_cooldown: Duration::from_secs(120),
        }
    }
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail on the first throttling response.
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    pub fn base_cooldown(mut self, cooldown: Duration) -> Self {
        self.base_cooldown = cooldown;
        self
    }

    /// Cooldown after the throttled attempt `attempt` (0-indexed).
    ///
    /// Linear growth: `base_cooldown * (attempt + 1)`.
    pub fn cooldown_for_attempt(&self, attempt: u32) -> Duration {
        self.base_cooldown.saturating_mul(attempt.saturating_add(1))
    }
}

/// Run `f` until it stops reporting throttling or the policy is exhausted.
///
/// `f` receives the 0-indexed attempt number. Errors other than
/// [`ScrapeError::RateLimited`] are returned unchanged on first occurrence.
pub(crate) async fn with_rate_limit_retry<F, Fut, T>(
    policy: &RetryPolicy,
    limiter: &RateLimiter,
    advisories: &dyn AdvisorySink,
    endpoint: &'static str,
    f: F,
) -> Result<T>
where
    F: Fn(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match f(attempt).await {
            Ok(result) => return Ok(result),
            Err(e) if e.is_transient() => {
                if attempt >= policy.max_retries {
                    warn!(
                        endpoint,
                        retries = attempt,
                        "provider still rate limiting, giving up"
                    );
                    return Err(ScrapeError::RateLimitExceeded { retries: attempt });
                }

                let cooldown = policy.cooldown_for_attempt(attempt);
                let now = Local::now();
                let resume_at = TimeDelta::from_std(cooldown)
                    .ok()
                    .and_then(|delta| now.checked_add_signed(delta))
                    .unwrap_or(now);

                warn!(
                    endpoint,
                    attempt = attempt + 1,
                    max_retries = policy.max_retries,
                    cooldown_ms = cooldown.as_millis() as u64,
                    resume_at = %resume_at.format("%H:%M:%S"),
                    "rate limited, cooling down"
                );
                advisories.advise(&Advisory::RateLimited {
                    attempt,
                    cooldown,
                    resume_at,
                });
                metrics::counter!(telemetry::RETRIES_TOTAL, "endpoint" => endpoint).increment(1);

                limiter.cool_down(cooldown).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
