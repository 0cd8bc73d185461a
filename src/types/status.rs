//! Status reporting towards the host application.
//!
//! Two channels reach the host:
//!
//! - [`ScrapeStatus`]: the outcome of an operation (`ok`, message, whether
//!   the host should show a dialog). Built from errors with
//!   [`ScrapeStatus::from_error`].
//! - [`Advisory`]: out-of-band notices published while an operation is still
//!   running (rate-limit cooldowns, missing credentials). Delivered through an
//!   [`AdvisorySink`]; the default [`LogSink`] writes them to the log.

use std::time::Duration;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::ScrapeError;

/// How the host should surface a status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogKind {
    /// Modal dialog the user must acknowledge.
    Message,
    /// Transient notification.
    Notify,
}

/// Structured status object handed to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeStatus {
    pub ok: bool,
    pub message: String,
    pub dialog: Option<DialogKind>,
}

impl ScrapeStatus {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
            dialog: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
            dialog: None,
        }
    }

    pub fn with_dialog(mut self, dialog: DialogKind) -> Self {
        self.dialog = Some(dialog);
        self
    }

    /// Status for a fatal error. The message is suitable for direct display.
    pub fn from_error(err: &ScrapeError) -> Self {
        let status = Self::failed(err.to_string());
        match err {
            ScrapeError::RateLimitExceeded { .. } => status.with_dialog(DialogKind::Message),
            ScrapeError::Http { status: 401 | 403 } => status.with_dialog(DialogKind::Message),
            ScrapeError::Transport(_) => status.with_dialog(DialogKind::Notify),
            _ => status,
        }
    }
}

impl Default for ScrapeStatus {
    fn default() -> Self {
        Self::ok("")
    }
}

/// Where to obtain a SteamGridDB API key.
pub const AUTH_DOCS_URL: &str = "https://www.steamgriddb.com/api/v2#section/Authentication";

/// Notice published to the host while work is in progress.
#[derive(Debug, Clone, PartialEq)]
pub enum Advisory {
    /// The scraper has no API key and is disabled.
    MissingCredentials { provider: String },
    /// The provider throttled us; no request is issued before `resume_at`.
    RateLimited {
        attempt: u32,
        cooldown: Duration,
        resume_at: DateTime<Local>,
    },
}

impl Advisory {
    pub fn message(&self) -> String {
        match self {
            Advisory::MissingCredentials { provider } => format!(
                "{provider} requires an API key. Visit {AUTH_DOCS_URL} for directions \
                 about how to get your key and add it to the scraper settings."
            ),
            Advisory::RateLimited { resume_at, .. } => format!(
                "You've exceeded the max rate limit. Respecting the website, \
                 we wait at least till {}.",
                resume_at.format("%Y-%m-%d %H:%M:%S")
            ),
        }
    }

    /// The advisory as a status object. Missing credentials are a failure the
    /// user must act on; a cooldown is informational.
    pub fn to_status(&self) -> ScrapeStatus {
        match self {
            Advisory::MissingCredentials { .. } => {
                ScrapeStatus::failed(self.message()).with_dialog(DialogKind::Message)
            }
            Advisory::RateLimited { .. } => {
                ScrapeStatus::ok(self.message()).with_dialog(DialogKind::Message)
            }
        }
    }
}

/// Receiver for [`Advisory`] notices.
pub trait AdvisorySink: Send + Sync {
    fn advise(&self, advisory: &Advisory);
}

/// Sink that writes advisories to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl AdvisorySink for LogSink {
    fn advise(&self, advisory: &Advisory) {
        match advisory {
            Advisory::MissingCredentials { provider } => {
                warn!(provider = %provider, "{}", advisory.message());
            }
            Advisory::RateLimited {
                attempt, cooldown, ..
            } => {
                warn!(
                    attempt,
                    cooldown_secs = cooldown.as_secs(),
                    "{}",
                    advisory.message()
                );
            }
        }
    }
}
