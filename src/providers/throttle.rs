//! Process-wide request pacing.
//!
//! [`RateLimiter`] enforces two things for every outbound call:
//!
//! - a minimum spacing between calls (courtesy throttling, 100 ms by default),
//!   implemented with a `governor` direct limiter with a burst of one;
//! - a cooldown gate: after the provider signals throttling, no call is
//!   released before the cooldown has elapsed.
//!
//! The limiter is cheap to clone and clones share state, so several scraper
//! instances can share one pacing budget or get isolated ones deliberately.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as GovernorLimiter};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Default spacing between ordinary provider calls.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(100);

type DirectLimiter = GovernorLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Shared throttle for all provider traffic.
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Inner>,
}

struct Inner {
    min_interval: Duration,
    spacing: Option<DirectLimiter>,
    /// End of the current cooldown, if one was requested.
    resume_at: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Create a limiter releasing at most one call per `min_interval`.
    ///
    /// A zero interval disables spacing; cooldowns still apply.
    pub fn new(min_interval: Duration) -> Self {
        let spacing = Quota::with_period(min_interval)
            .map(|quota| GovernorLimiter::direct(quota.allow_burst(NonZeroU32::MIN)));
        Self {
            inner: Arc::new(Inner {
                min_interval,
                spacing,
                resume_at: Mutex::new(None),
            }),
        }
    }

    /// Limiter without spacing between calls.
    pub fn unthrottled() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn min_interval(&self) -> Duration {
        self.inner.min_interval
    }

    /// Wait until the next call may be issued.
    ///
    /// Blocks through any active cooldown first, then for the spacing slot.
    pub async fn throttle(&self) {
        self.wait_for_cooldown().await;
        if let Some(spacing) = &self.inner.spacing {
            spacing.until_ready().await;
        }
    }

    /// Hold back every caller for `wait`, starting now.
    ///
    /// Overlapping cooldowns extend to the later deadline. Returns once the
    /// cooldown requested by this call has elapsed.
    pub async fn cool_down(&self, wait: Duration) {
        let requested = Instant::now() + wait;
        {
            let mut resume_at = self.inner.resume_at.lock().await;
            if resume_at.is_none_or(|existing| existing < requested) {
                *resume_at = Some(requested);
            }
        }
        debug!(wait_ms = wait.as_millis() as u64, "cooling down");
        tokio::time::sleep_until(requested).await;
    }

    /// Whether a cooldown is currently holding calls back.
    pub async fn is_cooling_down(&self) -> bool {
        matches!(*self.inner.resume_at.lock().await, Some(at) if at > Instant::now())
    }

    async fn wait_for_cooldown(&self) {
        let resume_at = *self.inner.resume_at.lock().await;
        if let Some(at) = resume_at
            && at > Instant::now()
        {
            tokio::time::sleep_until(at).await;
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_INTERVAL)
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("min_interval", &self.inner.min_interval)
            .finish_non_exhaustive()
    }
}
