//! Builder for [`SteamGridDb`].

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use tracing::{info, warn};

use super::{DEFAULT_BASE_URL, PROVIDER_NAME, ScraperState, SteamGridDb};
use crate::Result;
use crate::cache::ScrapeCache;
use crate::client::{DEFAULT_TIMEOUT, JsonClient};
use crate::config::Config;
use crate::providers::retry::RetryPolicy;
use crate::providers::throttle::{DEFAULT_MIN_INTERVAL, RateLimiter};
use crate::types::{AdvisorySink, LogSink};

/// Default wait before the single download retry.
pub const DEFAULT_DOWNLOAD_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Builder for configuring a [`SteamGridDb`] scraper.
///
/// ```rust,no_run
/// # use gridscrape::SteamGridDb;
/// let scraper = SteamGridDb::builder()
///     .api_key("my-key")
///     .cache_dir("/var/cache/gridscrape")
///     .build()?;
/// # Ok::<(), gridscrape::ScrapeError>(())
/// ```
pub struct SteamGridDbBuilder {
    api_key: Option<String>,
    base_url: String,
    cache_dir: Option<PathBuf>,
    limiter: Option<RateLimiter>,
    min_interval: Duration,
    retry: RetryPolicy,
    download_retry_delay: Duration,
    timeout: Duration,
    advisories: Option<Arc<dyn AdvisorySink>>,
    dump_dir: Option<PathBuf>,
}

impl Default for SteamGridDbBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SteamGridDbBuilder {
    pub fn new() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            cache_dir: None,
            limiter: None,
            min_interval: DEFAULT_MIN_INTERVAL,
            retry: RetryPolicy::default(),
            download_retry_delay: DEFAULT_DOWNLOAD_RETRY_DELAY,
            timeout: DEFAULT_TIMEOUT,
            advisories: None,
            dump_dir: None,
        }
    }

    /// Start from a loaded [`Config`], resolving the API key from the
    /// environment first.
    pub fn from_config(config: &Config) -> Self {
        let mut builder = Self::new()
            .base_url(&config.steamgriddb.base_url)
            .timeout(Duration::from_secs(config.steamgriddb.timeout_secs))
            .cache_dir(config.cache_dir())
            .min_interval(Duration::from_millis(config.throttle.min_interval_ms))
            .retry(
                RetryPolicy::new()
                    .max_retries(config.retry.max_retries)
                    .base_cooldown(Duration::from_secs(config.retry.base_cooldown_secs)),
            )
            .download_retry_delay(Duration::from_secs(config.download.retry_delay_secs));
        builder.api_key = config.api_key();
        builder.dump_dir = config.debug.dump_dir.clone();
        builder
    }

    /// API key. Empty or whitespace-only keys leave the scraper disabled.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Override the API base URL (for testing with wiremock).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Directory for the persistent cache files. Without one the cache only
    /// lives for the session.
    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Share pacing with other scrapers. Overrides [`min_interval`](Self::min_interval).
    pub fn rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.limiter = Some(limiter);
        self
    }

    pub fn min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = interval;
        self
    }

    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    pub fn download_retry_delay(mut self, delay: Duration) -> Self {
        self.download_retry_delay = delay;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Receiver for rate-limit and missing-key notices. Default: [`LogSink`].
    pub fn advisory_sink(mut self, sink: Arc<dyn AdvisorySink>) -> Self {
        self.advisories = Some(sink);
        self
    }

    /// Write every raw provider response to this directory.
    pub fn debug_dump_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dump_dir = Some(dir.into());
        self
    }

    pub fn build(self) -> Result<SteamGridDb> {
        let state = match self.api_key.map(|k| k.trim().to_string()) {
            Some(key) if !key.is_empty() => ScraperState::Active { api_key: key },
            _ => {
                warn!(provider = PROVIDER_NAME, "no API key configured, scraper disabled");
                ScraperState::Disabled
            }
        };

        let limiter = self
            .limiter
            .unwrap_or_else(|| RateLimiter::new(self.min_interval));
        let client = JsonClient::new(limiter, self.timeout)?;

        let cache = match &self.cache_dir {
            Some(dir) => ScrapeCache::open(dir, PROVIDER_NAME),
            None => ScrapeCache::ephemeral(),
        };

        info!(
            provider = PROVIDER_NAME,
            base_url = %self.base_url,
            cache_dir = ?self.cache_dir,
            max_retries = self.retry.max_retries,
            "scraper ready"
        );

        Ok(SteamGridDb {
            state,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            client,
            cache,
            retry: self.retry,
            download_retry_delay: self.download_retry_delay,
            advisories: self.advisories.unwrap_or_else(|| Arc::new(LogSink)),
            dump_dir: self.dump_dir,
            credentials_notice_sent: AtomicBool::new(false),
        })
    }
}
