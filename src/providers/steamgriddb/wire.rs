//! SteamGridDB response shapes.
//!
//! Only the fields the scraper reads are modelled; everything else in the
//! payload is ignored.

use std::fmt;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::types::MetadataRecord;
use crate::{Result, ScrapeError};

/// Every v2 response wraps its payload in `{"success": .., "data": ..}`.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub data: T,
}

/// Decode the `data` member of a response body.
pub(crate) fn decode<T: DeserializeOwned>(payload: Value) -> Result<T> {
    serde_json::from_value::<Envelope<T>>(payload)
        .map(|envelope| envelope.data)
        .map_err(|e| ScrapeError::parse(e.to_string(), None))
}

/// Game ids are numeric today, but are treated as opaque strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum GameId {
    Number(u64),
    Text(String),
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameId::Number(n) => write!(f, "{n}"),
            GameId::Text(s) => f.write_str(s),
        }
    }
}

/// One hit of `search/autocomplete`.
#[derive(Debug, Deserialize)]
pub(crate) struct SearchHit {
    pub id: GameId,
    pub name: String,
}

/// `games/id/{id}`.
#[derive(Debug, Deserialize)]
pub(crate) struct GameDetail {
    #[serde(default)]
    pub name: Option<String>,
    /// Unix timestamp, as a number or a string; absent or empty when unknown.
    #[serde(default)]
    pub release_date: Option<Value>,
}

impl GameDetail {
    pub fn release_year(&self) -> Option<i32> {
        match self.release_date.as_ref()? {
            Value::Number(n) => MetadataRecord::year_from_timestamp(&n.to_string()),
            Value::String(s) => MetadataRecord::year_from_timestamp(s),
            _ => None,
        }
    }
}

/// One entry of `grids|heroes|logos/game/{id}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ImageEntry {
    #[serde(default)]
    pub style: Option<String>,
    pub url: String,
    pub thumb: String,
    #[serde(default)]
    pub author: Option<Author>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Author {
    #[serde(default)]
    pub name: Option<String>,
}

impl ImageEntry {
    /// `"{style} by {author}"`, with `image` and `unknown` standing in for
    /// missing parts.
    pub fn display_name(&self) -> String {
        let style = self
            .style
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or("image");
        let author = self
            .author
            .as_ref()
            .and_then(|a| a.name.as_deref())
            .filter(|s| !s.is_empty())
            .unwrap_or("unknown");
        format!("{style} by {author}")
    }
}
