//! Throttled JSON-over-HTTP client.
//!
//! [`JsonClient`] issues exactly one request per call: it waits on the shared
//! [`RateLimiter`], sends a GET with a bearer token, classifies the status and
//! decodes the body. Retrying is the caller's business.

use std::path::Path;
use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::{debug, trace};

use crate::providers::RateLimiter;
use crate::{Result, ScrapeError, telemetry};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// How a response status is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpClass {
    /// 200: decode the body.
    Success,
    /// 404: an absent resource, not an error.
    NotFound,
    /// 429: provider throttling.
    RateLimited,
    /// 400: malformed request.
    ClientError,
    /// Anything else.
    Other(u16),
}

impl HttpClass {
    pub fn from_status(status: u16) -> Self {
        match status {
            200 => Self::Success,
            404 => Self::NotFound,
            429 => Self::RateLimited,
            400 => Self::ClientError,
            other => Self::Other(other),
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Success => "ok",
            Self::NotFound => "not_found",
            Self::RateLimited => "rate_limited",
            Self::ClientError => "client_error",
            Self::Other(_) => "http_error",
        }
    }
}

/// Outcome of a successful exchange.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched {
    Body(Value),
    NotFound,
}

impl Fetched {
    pub fn into_body(self) -> Option<Value> {
        match self {
            Self::Body(value) => Some(value),
            Self::NotFound => None,
        }
    }
}

/// HTTP client shared by every call a scraper makes.
#[derive(Clone, Debug)]
pub struct JsonClient {
    http: Client,
    limiter: RateLimiter,
}

impl JsonClient {
    pub fn new(limiter: RateLimiter, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(crate::version::user_agent())
            .build()
            .map_err(|e| ScrapeError::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, limiter })
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Fetch `url` and decode a JSON body.
    ///
    /// `endpoint` labels the request in logs and metrics. `attempt` is echoed
    /// back in [`ScrapeError::RateLimited`] so the retry loop can count.
    pub async fn fetch_json(
        &self,
        url: &str,
        api_key: &str,
        endpoint: &'static str,
        attempt: u32,
    ) -> Result<Fetched> {
        self.limiter.throttle().await;
        debug!(endpoint, url, attempt, "GET");

        let response = match self.http.get(url).bearer_auth(api_key).send().await {
            Ok(response) => response,
            Err(e) => {
                metrics::counter!(telemetry::REQUESTS_TOTAL,
                    "endpoint" => endpoint,
                    "status" => "transport_error",
                )
                .increment(1);
                return Err(ScrapeError::Transport(e.to_string()));
            }
        };

        let status = response.status().as_u16();
        let class = HttpClass::from_status(status);
        metrics::counter!(telemetry::REQUESTS_TOTAL,
            "endpoint" => endpoint,
            "status" => class.label(),
        )
        .increment(1);

        match class {
            HttpClass::Success => {
                let body = response
                    .text()
                    .await
                    .map_err(|e| ScrapeError::Transport(e.to_string()))?;
                trace!(endpoint, bytes = body.len(), "response body");
                serde_json::from_str(&body)
                    .map(Fetched::Body)
                    .map_err(|e| ScrapeError::parse(e.to_string(), Some(&body)))
            }
            HttpClass::NotFound => {
                debug!(endpoint, url, "not found");
                Ok(Fetched::NotFound)
            }
            HttpClass::RateLimited => {
                metrics::counter!(telemetry::RATE_LIMITED_TOTAL, "endpoint" => endpoint)
                    .increment(1);
                Err(ScrapeError::RateLimited { attempt })
            }
            HttpClass::ClientError | HttpClass::Other(_) => Err(ScrapeError::Http { status }),
        }
    }

    /// Download `url` to `dest`, creating parent directories as needed.
    ///
    /// Image hosts get no credentials. Any non-200 status is a
    /// [`ScrapeError::Download`].
    pub async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        self.limiter.throttle().await;
        debug!(url, dest = %dest.display(), "downloading");

        let failed = |message: String| ScrapeError::Download {
            url: url.to_string(),
            message,
        };

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(failed(format!("HTTP {}", status.as_u16())));
        }
        let bytes = response.bytes().await.map_err(|e| failed(e.to_string()))?;

        if let Some(parent) = dest.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(dest, &bytes).await?;
        Ok(())
    }
}
