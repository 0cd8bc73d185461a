//! Artwork assets.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ScrapeError;

/// A category of artwork.
///
/// Only [`BoxFront`](Self::BoxFront), [`ClearLogo`](Self::ClearLogo) and
/// [`Fanart`](Self::Fanart) are served by SteamGridDB; the other kinds exist
/// so hosts can ask for them and receive an empty list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    BoxFront,
    BoxBack,
    Cartridge,
    ClearLogo,
    Fanart,
    Snap,
    Title,
}

impl AssetKind {
    pub const ALL: [AssetKind; 7] = [
        AssetKind::BoxFront,
        AssetKind::BoxBack,
        AssetKind::Cartridge,
        AssetKind::ClearLogo,
        AssetKind::Fanart,
        AssetKind::Snap,
        AssetKind::Title,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AssetKind::BoxFront => "box_front",
            AssetKind::BoxBack => "box_back",
            AssetKind::Cartridge => "cartridge",
            AssetKind::ClearLogo => "clear_logo",
            AssetKind::Fanart => "fanart",
            AssetKind::Snap => "snap",
            AssetKind::Title => "title",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetKind {
    type Err = ScrapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        AssetKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| ScrapeError::Configuration(format!("unknown asset kind: {s}")))
    }
}

/// One downloadable artwork item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub kind: AssetKind,
    pub display_name: String,
    pub thumbnail_url: String,
    pub full_url: String,
}

impl AssetRecord {
    /// Thumbnail and full-resolution URLs. Both are already present on the record.
    pub fn resolve_urls(&self) -> (&str, &str) {
        (&self.thumbnail_url, &self.full_url)
    }

    /// File extension of the full-resolution image, lowercased, without the dot.
    ///
    /// Query strings, fragments and the host are ignored. Returns `None` when
    /// the URL does not parse or its last path segment has no suffix.
    pub fn extension(&self) -> Option<String> {
        url_extension(&self.full_url)
    }
}

fn url_extension(url: &str) -> Option<String> {
    let url = reqwest::Url::parse(url).ok()?;
    let last_segment = url.path_segments()?.next_back()?;
    let (stem, ext) = last_segment.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}
