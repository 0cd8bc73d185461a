//! Core Scraper trait

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::Result;
use crate::types::{AssetKind, AssetRecord, Candidate, MetadataField, MetadataRecord, ScrapeStatus};

/// A source of candidates, metadata and artwork for game titles.
///
/// Metadata and asset lookups take the [`Candidate`] the caller selected from
/// a [`search`](Scraper::search), so resolution can never run against a
/// missing or stale selection.
///
/// A scraper without credentials behaves as disabled: every lookup returns an
/// empty or default result and performs no network access.
#[async_trait]
pub trait Scraper: Send + Sync {
    /// Provider name for logging/debugging.
    fn name(&self) -> &str;

    // ===== Capabilities =====

    fn supported_assets(&self) -> &[AssetKind];

    fn supports_asset(&self, kind: AssetKind) -> bool {
        self.supported_assets().contains(&kind)
    }

    fn supported_metadata(&self) -> &[MetadataField];

    fn supports_metadata(&self) -> bool {
        !self.supported_metadata().is_empty()
    }

    /// Report whether the scraper is usable. A disabled scraper returns a
    /// failed status pointing the user at where to obtain a key.
    fn check_credentials(&self) -> ScrapeStatus;

    // ===== Lookups =====

    /// Candidates for `term` on `platform`, best match first.
    ///
    /// An unknown title yields an empty list, not an error.
    async fn search(&self, term: &str, platform: &str) -> Result<Vec<Candidate>>;

    /// Metadata of the selected candidate. Unknown ids yield the default record.
    async fn metadata(&self, candidate: &Candidate) -> Result<MetadataRecord>;

    /// Assets of one kind for the selected candidate, possibly empty.
    async fn assets(&self, candidate: &Candidate, kind: AssetKind) -> Result<Vec<AssetRecord>>;

    /// Fetch the full-resolution image of `asset` into `dest`.
    async fn download_asset(&self, asset: &AssetRecord, dest: &Path) -> Result<PathBuf>;

    // ===== Cache =====

    /// Whether a search for `term` on `platform` would be served from cache.
    fn has_cached_candidates(&self, _term: &str, _platform: &str) -> bool {
        false
    }

    /// Persist cached results.
    fn flush(&self) -> Result<()> {
        Ok(())
    }
}
