//! Resolved per-title metadata.

use chrono::{DateTime, Datelike};
use serde::{Deserialize, Serialize};

/// Title used when the provider does not report one.
pub const UNKNOWN_TITLE: &str = "Unknown title";

/// Metadata fields a scraper can resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetadataField {
    Title,
    Year,
}

/// Metadata resolved for one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub title: String,
    /// Absent when the provider gives no, an empty or an unparseable release date.
    pub release_year: Option<i32>,
}

impl Default for MetadataRecord {
    fn default() -> Self {
        Self {
            title: UNKNOWN_TITLE.to_string(),
            release_year: None,
        }
    }
}

impl MetadataRecord {
    /// Calendar year (UTC) of a unix timestamp given as text, e.g. `"1394668800"`.
    ///
    /// Returns `None` for empty or non-numeric input.
    pub fn year_from_timestamp(raw: &str) -> Option<i32> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        let seconds = raw.parse::<f64>().ok().filter(|s| s.is_finite())?;
        DateTime::from_timestamp(seconds.trunc() as i64, 0).map(|dt| dt.year())
    }
}
