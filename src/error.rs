//! gridscrape error types

/// Error taxonomy for scraping operations.
///
/// "Not found" and "scraper disabled" are deliberately absent: both resolve
/// to empty or default results rather than errors.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    // Provider/network errors
    /// Network-level failure: no HTTP status was received.
    #[error("network error: {0}")]
    Transport(String),

    /// The provider answered with a non-success status (400, 401, 5xx, ...).
    #[error("bad HTTP status code {status}")]
    Http { status: u16 },

    /// The provider signalled throttling (HTTP 429). Recoverable; the retry
    /// loop turns it into [`ScrapeError::RateLimitExceeded`] once the cap is hit.
    #[error("rate limited by provider (attempt {attempt})")]
    RateLimited { attempt: u32 },

    #[error("rate limit still in effect after {retries} retries")]
    RateLimitExceeded { retries: u32 },

    // Data errors
    /// The body of a successful response could not be decoded.
    #[error("error decoding JSON data: {message}")]
    Parse {
        message: String,
        /// Raw payload (truncated) kept for diagnostics.
        payload: Option<String>,
    },

    #[error("asset download failed for {url}: {message}")]
    Download { url: String, message: String },

    // Cache errors
    #[error("no cached entry for key '{key}' in {namespace} cache")]
    CacheMiss { namespace: &'static str, key: String },

    #[error("cache error: {0}")]
    Cache(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Failure reported by the host's entity store.
    #[error("entity store error: {0}")]
    Store(String),
}

impl ScrapeError {
    /// Whether the operation may succeed if retried after a cooldown.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// The literal HTTP status code, for HTTP-level failures.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Http { status } => Some(*status),
            Self::RateLimited { .. } | Self::RateLimitExceeded { .. } => Some(429),
            _ => None,
        }
    }

    /// Build a parse error, keeping at most [`MAX_PAYLOAD_CAPTURE`] bytes of the body.
    pub fn parse(message: impl Into<String>, payload: Option<&str>) -> Self {
        Self::Parse {
            message: message.into(),
            payload: payload.map(truncate_payload),
        }
    }
}

/// Upper bound on the raw payload retained in [`ScrapeError::Parse`].
pub const MAX_PAYLOAD_CAPTURE: usize = 4096;

fn truncate_payload(raw: &str) -> String {
    if raw.len() <= MAX_PAYLOAD_CAPTURE {
        return raw.to_string();
    }
    let mut end = MAX_PAYLOAD_CAPTURE;
    while !raw.is_char_boundary(end) {
        end -= 1;
    }
    raw[..end].to_string()
}

/// Result type alias for gridscrape operations
pub type Result<T> = std::result::Result<T, ScrapeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_is_truncated_on_char_boundary() {
        let raw = "é".repeat(MAX_PAYLOAD_CAPTURE);
        let err = ScrapeError::parse("bad", Some(&raw));
        let ScrapeError::Parse { payload, .. } = err else {
            panic!("expected parse error");
        };
        let payload = payload.unwrap();
        assert!(payload.len() <= MAX_PAYLOAD_CAPTURE);
        assert!(payload.chars().all(|c| c == 'é'));
    }

    #[test]
    fn short_payload_kept_verbatim() {
        let err = ScrapeError::parse("bad", Some("{not json"));
        let ScrapeError::Parse { payload, .. } = err else {
            panic!("expected parse error");
        };
        assert_eq!(payload.as_deref(), Some("{not json"));
    }
}
