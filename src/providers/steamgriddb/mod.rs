//! SteamGridDB scraper.
//!
//! Searches titles, resolves basic metadata and lists box fronts (grids),
//! fanart (heroes) and clear logos (logos). See
//! <https://www.steamgriddb.com/api/v2>.
//!
//! Every result is cached per candidate. Network access goes through a
//! shared [`RateLimiter`](super::RateLimiter) and throttled calls are retried
//! per the configured [`RetryPolicy`](super::RetryPolicy).

mod builder;
mod wire;

pub use builder::{DEFAULT_DOWNLOAD_RETRY_DELAY, SteamGridDbBuilder};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use self::wire::{GameDetail, ImageEntry, SearchHit};
use super::retry::{RetryPolicy, with_rate_limit_retry};
use crate::cache::{CacheKey, ScrapeCache};
use crate::client::JsonClient;
use crate::traits::Scraper;
use crate::types::{
    Advisory, AdvisorySink, AssetKind, AssetRecord, Candidate, MetadataField, MetadataRecord,
    ScrapeStatus, UNKNOWN_TITLE, rank,
};
use crate::{Result, ScrapeError, telemetry};

/// Provider name; also the prefix of the cache files.
pub const PROVIDER_NAME: &str = "SteamGridDB";

pub const DEFAULT_BASE_URL: &str = "https://www.steamgriddb.com/api/v2";

/// Asset kinds SteamGridDB can serve.
pub const SUPPORTED_ASSETS: [AssetKind; 3] =
    [AssetKind::BoxFront, AssetKind::ClearLogo, AssetKind::Fanart];

pub const SUPPORTED_METADATA: [MetadataField; 2] = [MetadataField::Title, MetadataField::Year];

/// Image endpoints, in the order a catalog is assembled.
#[derive(Debug, Clone, Copy)]
enum ImageEndpoint {
    Grids,
    Heroes,
    Logos,
}

impl ImageEndpoint {
    const ALL: [ImageEndpoint; 3] = [Self::Grids, Self::Heroes, Self::Logos];

    fn path(self) -> &'static str {
        match self {
            Self::Grids => "grids",
            Self::Heroes => "heroes",
            Self::Logos => "logos",
        }
    }

    fn kind(self) -> AssetKind {
        match self {
            Self::Grids => AssetKind::BoxFront,
            Self::Heroes => AssetKind::Fanart,
            Self::Logos => AssetKind::ClearLogo,
        }
    }

    fn dump_file(self) -> &'static str {
        match self {
            Self::Grids => "SteamGridDB_assets_covers.json",
            Self::Heroes => "SteamGridDB_assets_fanarts.json",
            Self::Logos => "SteamGridDB_assets_logos.json",
        }
    }
}

/// Whether the scraper may talk to the provider at all.
enum ScraperState {
    /// No API key: every call returns an empty result without network access.
    Disabled,
    Active { api_key: String },
}

/// SteamGridDB scraper. Build one with [`SteamGridDb::builder`].
pub struct SteamGridDb {
    state: ScraperState,
    base_url: String,
    client: JsonClient,
    cache: ScrapeCache,
    retry: RetryPolicy,
    download_retry_delay: Duration,
    advisories: Arc<dyn AdvisorySink>,
    dump_dir: Option<PathBuf>,
    credentials_notice_sent: AtomicBool,
}

impl SteamGridDb {
    pub fn builder() -> SteamGridDbBuilder {
        SteamGridDbBuilder::new()
    }

    /// False when no API key was supplied.
    pub fn is_enabled(&self) -> bool {
        matches!(self.state, ScraperState::Active { .. })
    }

    pub fn cache(&self) -> &ScrapeCache {
        &self.cache
    }

    /// Publish the missing-key advisory, once per scraper instance.
    fn notify_disabled(&self) -> Advisory {
        let advisory = Advisory::MissingCredentials {
            provider: PROVIDER_NAME.to_string(),
        };
        if !self.credentials_notice_sent.swap(true, Ordering::Relaxed) {
            self.advisories.advise(&advisory);
        }
        advisory
    }

    /// The API key, or `None` (after the one-time notice) when disabled.
    fn api_key(&self) -> Option<&str> {
        match &self.state {
            ScraperState::Active { api_key } => Some(api_key),
            ScraperState::Disabled => {
                self.notify_disabled();
                None
            }
        }
    }

    /// GET a JSON document, retrying through rate limits. `None` on 404.
    async fn get_json(
        &self,
        url: &str,
        api_key: &str,
        endpoint: &'static str,
    ) -> Result<Option<Value>> {
        let fetched = with_rate_limit_retry(
            &self.retry,
            self.client.limiter(),
            self.advisories.as_ref(),
            endpoint,
            |attempt| self.client.fetch_json(url, api_key, endpoint, attempt),
        )
        .await?;
        Ok(fetched.into_body())
    }

    /// Write a raw payload to the dump directory, if one is configured.
    fn dump(&self, file_name: &str, payload: &Value) {
        let Some(dir) = &self.dump_dir else {
            return;
        };
        let path = dir.join(file_name);
        let written = std::fs::create_dir_all(dir).and_then(|()| {
            let json = serde_json::to_vec_pretty(payload).map_err(std::io::Error::other)?;
            std::fs::write(&path, json)
        });
        match written {
            Ok(()) => debug!(path = %path.display(), "dumped response"),
            Err(e) => warn!(path = %path.display(), error = %e, "failed to dump response"),
        }
    }

    #[instrument(skip(self), fields(provider = PROVIDER_NAME))]
    pub async fn search(&self, term: &str, platform: &str) -> Result<Vec<Candidate>> {
        let Some(api_key) = self.api_key() else {
            return Ok(Vec::new());
        };

        let key = CacheKey::search(term, platform);
        if let Some(cached) = self.cache.candidates.lookup(&key) {
            debug!(%key, count = cached.len(), "candidates served from cache");
            return Ok(cached);
        }

        let term = term.trim();
        let url = format!(
            "{}/search/autocomplete/{}",
            self.base_url,
            urlencoding::encode(term)
        );
        let Some(payload) = self.get_json(&url, api_key, "search").await? else {
            return Ok(Vec::new());
        };
        self.dump("SteamGridDB_get_candidates.json", &payload);

        let hits: Vec<SearchHit> = wire::decode(payload)?;
        let mut candidates: Vec<Candidate> = hits
            .into_iter()
            .map(|hit| Candidate::scored(hit.id.to_string(), hit.name, platform, term))
            .collect();
        rank(&mut candidates);

        info!(count = candidates.len(), "search complete");
        self.cache.candidates.put(&key, candidates.clone());
        Ok(candidates)
    }

    #[instrument(skip(self, candidate), fields(provider = PROVIDER_NAME, id = %candidate.id))]
    pub async fn metadata(&self, candidate: &Candidate) -> Result<MetadataRecord> {
        let Some(api_key) = self.api_key() else {
            return Ok(MetadataRecord::default());
        };

        let key = CacheKey::entity(&candidate.id);
        if let Some(cached) = self.cache.metadata.lookup(&key) {
            return Ok(cached);
        }

        let url = format!(
            "{}/games/id/{}",
            self.base_url,
            urlencoding::encode(&candidate.id)
        );
        let Some(payload) = self.get_json(&url, api_key, "game").await? else {
            return Ok(MetadataRecord::default());
        };
        self.dump("SteamGridDB_get_metadata.json", &payload);

        let detail: GameDetail = wire::decode(payload)?;
        let record = MetadataRecord {
            release_year: detail.release_year(),
            title: detail.name.unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
        };
        self.cache.metadata.put(&key, record.clone());
        Ok(record)
    }

    /// Assets of one kind. Kinds outside [`SUPPORTED_ASSETS`] are empty
    /// without a network call.
    #[instrument(skip(self, candidate), fields(provider = PROVIDER_NAME, id = %candidate.id))]
    pub async fn assets(&self, candidate: &Candidate, kind: AssetKind) -> Result<Vec<AssetRecord>> {
        if !SUPPORTED_ASSETS.contains(&kind) {
            debug!(%kind, "asset kind not served by provider");
            return Ok(Vec::new());
        }
        let catalog = self.asset_catalog(candidate).await?;
        Ok(catalog.into_iter().filter(|a| a.kind == kind).collect())
    }

    /// Every asset of every supported kind, cached as one entry.
    async fn asset_catalog(&self, candidate: &Candidate) -> Result<Vec<AssetRecord>> {
        let Some(api_key) = self.api_key() else {
            return Ok(Vec::new());
        };

        let key = CacheKey::entity(&candidate.id);
        if let Some(cached) = self.cache.assets.lookup(&key) {
            return Ok(cached);
        }

        let mut catalog = Vec::new();
        for endpoint in ImageEndpoint::ALL {
            catalog.extend(self.image_list(api_key, candidate, endpoint).await?);
        }
        debug!(count = catalog.len(), "asset catalog assembled");
        self.cache.assets.put(&key, catalog.clone());
        Ok(catalog)
    }

    async fn image_list(
        &self,
        api_key: &str,
        candidate: &Candidate,
        endpoint: ImageEndpoint,
    ) -> Result<Vec<AssetRecord>> {
        let url = format!(
            "{}/{}/game/{}",
            self.base_url,
            endpoint.path(),
            urlencoding::encode(&candidate.id)
        );
        let Some(payload) = self.get_json(&url, api_key, endpoint.path()).await? else {
            return Ok(Vec::new());
        };
        self.dump(endpoint.dump_file(), &payload);

        let entries: Vec<ImageEntry> = wire::decode(payload)?;
        Ok(entries
            .into_iter()
            .map(|entry| AssetRecord {
                kind: endpoint.kind(),
                display_name: entry.display_name(),
                thumbnail_url: entry.thumb,
                full_url: entry.url,
            })
            .collect())
    }

    /// Download `asset` to `dest`. A failed or missing download is retried
    /// once after the configured delay.
    #[instrument(skip(self, asset), fields(provider = PROVIDER_NAME, url = %asset.full_url))]
    pub async fn download_asset(&self, asset: &AssetRecord, dest: &Path) -> Result<PathBuf> {
        let first = match self.download_once(asset, dest).await {
            Ok(()) => {
                metrics::counter!(telemetry::DOWNLOADS_TOTAL, "status" => "ok").increment(1);
                return Ok(dest.to_path_buf());
            }
            Err(e) => e,
        };

        warn!(
            error = %first,
            delay_ms = self.download_retry_delay.as_millis() as u64,
            "download failed, retrying once"
        );
        tokio::time::sleep(self.download_retry_delay).await;

        match self.download_once(asset, dest).await {
            Ok(()) => {
                metrics::counter!(telemetry::DOWNLOADS_TOTAL, "status" => "retried_ok")
                    .increment(1);
                Ok(dest.to_path_buf())
            }
            Err(e) => {
                metrics::counter!(telemetry::DOWNLOADS_TOTAL, "status" => "failed").increment(1);
                Err(match e {
                    e @ ScrapeError::Download { .. } => e,
                    other => ScrapeError::Download {
                        url: asset.full_url.clone(),
                        message: other.to_string(),
                    },
                })
            }
        }
    }

    async fn download_once(&self, asset: &AssetRecord, dest: &Path) -> Result<()> {
        self.client.download(&asset.full_url, dest).await?;
        if tokio::fs::try_exists(dest).await? {
            Ok(())
        } else {
            Err(ScrapeError::Download {
                url: asset.full_url.clone(),
                message: format!("{} missing after download", dest.display()),
            })
        }
    }

    pub fn check_credentials(&self) -> ScrapeStatus {
        match &self.state {
            ScraperState::Active { .. } => ScrapeStatus::ok("SteamGridDB API key is set"),
            ScraperState::Disabled => self.notify_disabled().to_status(),
        }
    }

    pub fn has_cached_candidates(&self, term: &str, platform: &str) -> bool {
        self.cache.candidates.has(&CacheKey::search(term, platform))
    }

    pub fn flush(&self) -> Result<()> {
        self.cache.flush()
    }
}

#[async_trait]
impl Scraper for SteamGridDb {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn supported_assets(&self) -> &[AssetKind] {
        &SUPPORTED_ASSETS
    }

    fn supported_metadata(&self) -> &[MetadataField] {
        &SUPPORTED_METADATA
    }

    fn check_credentials(&self) -> ScrapeStatus {
        SteamGridDb::check_credentials(self)
    }

    async fn search(&self, term: &str, platform: &str) -> Result<Vec<Candidate>> {
        SteamGridDb::search(self, term, platform).await
    }

    async fn metadata(&self, candidate: &Candidate) -> Result<MetadataRecord> {
        SteamGridDb::metadata(self, candidate).await
    }

    async fn assets(&self, candidate: &Candidate, kind: AssetKind) -> Result<Vec<AssetRecord>> {
        SteamGridDb::assets(self, candidate, kind).await
    }

    async fn download_asset(&self, asset: &AssetRecord, dest: &Path) -> Result<PathBuf> {
        SteamGridDb::download_asset(self, asset, dest).await
    }

    fn has_cached_candidates(&self, term: &str, platform: &str) -> bool {
        SteamGridDb::has_cached_candidates(self, term, platform)
    }

    fn flush(&self) -> Result<()> {
        SteamGridDb::flush(self)
    }
}

impl Drop for SteamGridDb {
    fn drop(&mut self) {
        if let Err(e) = self.cache.flush() {
            warn!(error = %e, "failed to flush scrape cache on drop");
        }
    }
}
