//! Telemetry metric name constants.
//!
//! Hosts install their own `metrics` recorder (e.g. prometheus, statsd);
//! without a recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `gridscrape_`. Counters end in `_total`.
//!
//! # Common labels
//!
//! - `endpoint`: provider endpoint family (e.g. "search", "game", "grids")
//! - `status`: outcome of one HTTP attempt or download
//! - `namespace`: cache namespace ("candidates", "metadata", "assets")

/// HTTP attempts issued against the provider.
///
/// Labels: `endpoint`, `status` ("ok" | "not_found" | "rate_limited" |
/// "client_error" | "http_error" | "transport_error").
pub const REQUESTS_TOTAL: &str = "gridscrape_requests_total";

/// HTTP 429 responses received.
pub const RATE_LIMITED_TOTAL: &str = "gridscrape_rate_limited_total";

/// Requests re-issued after a rate-limit cooldown.
pub const RETRIES_TOTAL: &str = "gridscrape_retries_total";

/// Labels: `namespace`.
pub const CACHE_HITS_TOTAL: &str = "gridscrape_cache_hits_total";

/// Labels: `namespace`.
pub const CACHE_MISSES_TOTAL: &str = "gridscrape_cache_misses_total";

/// Asset binary downloads.
///
/// Labels: `status` ("ok" | "retried_ok" | "failed").
pub const DOWNLOADS_TOTAL: &str = "gridscrape_downloads_total";
