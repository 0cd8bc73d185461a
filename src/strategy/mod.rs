//! Scrape orchestration.
//!
//! [`ScrapeStrategy`] drives a [`Scraper`] over the titles an [`EntityStore`]
//! hands it. For each title:
//!
//! 1. search for candidates
//! 2. pick one with the [`CandidateSelector`] (default: [`TopRanked`])
//! 3. resolve metadata
//! 4. for every requested asset kind, download the first asset offered
//!
//! The outcomes are stored back through the [`EntityStore`]. A failing title
//! is recorded as failed and the batch carries on.

mod store;

pub use store::{EntityKind, EntityRef, EntityStore, ScrapeSubject};

use store::sanitize_file_stem;

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::Result;
use crate::traits::Scraper;
use crate::types::{AssetKind, Candidate, MetadataRecord, ScrapeStatus};

/// Extension used when an asset URL has none.
const FALLBACK_EXTENSION: &str = "png";

/// Chooses one of the ranked candidates of a search.
pub trait CandidateSelector: Send + Sync {
    /// Index into `candidates` (never empty), or `None` to skip the title.
    fn select(&self, subject: &ScrapeSubject, candidates: &[Candidate]) -> Option<usize>;
}

/// Selects the best-scoring candidate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TopRanked;

impl CandidateSelector for TopRanked {
    fn select(&self, _subject: &ScrapeSubject, candidates: &[Candidate]) -> Option<usize> {
        (!candidates.is_empty()).then_some(0)
    }
}

/// What to resolve per title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeSettings {
    pub scrape_metadata: bool,
    /// Asset kinds to download, in order.
    pub asset_kinds: Vec<AssetKind>,
}

impl Default for ScrapeSettings {
    fn default() -> Self {
        Self {
            scrape_metadata: true,
            asset_kinds: vec![AssetKind::BoxFront, AssetKind::Fanart, AssetKind::ClearLogo],
        }
    }
}

/// Result of one asset kind for one title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AssetOutcome {
    Downloaded { kind: AssetKind, path: PathBuf },
    /// The provider offers nothing of this kind.
    NotAvailable { kind: AssetKind },
    /// Both download attempts failed.
    Failed { kind: AssetKind, message: String },
}

impl AssetOutcome {
    pub fn kind(&self) -> AssetKind {
        match self {
            Self::Downloaded { kind, .. }
            | Self::NotAvailable { kind }
            | Self::Failed { kind, .. } => *kind,
        }
    }
}

/// Everything resolved for one title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityOutcome {
    pub subject_id: String,
    pub candidate: Option<Candidate>,
    pub metadata: Option<MetadataRecord>,
    pub assets: Vec<AssetOutcome>,
    pub status: ScrapeStatus,
}

impl EntityOutcome {
    fn new(subject: &ScrapeSubject) -> Self {
        Self {
            subject_id: subject.id.clone(),
            candidate: None,
            metadata: None,
            assets: Vec::new(),
            status: ScrapeStatus::default(),
        }
    }
}

pub struct ScrapeStrategy {
    scraper: Arc<dyn Scraper>,
    store: Arc<dyn EntityStore>,
    selector: Arc<dyn CandidateSelector>,
    settings: ScrapeSettings,
}

impl ScrapeStrategy {
    pub fn new(
        scraper: Arc<dyn Scraper>,
        store: Arc<dyn EntityStore>,
        settings: ScrapeSettings,
    ) -> Self {
        Self {
            scraper,
            store,
            selector: Arc::new(TopRanked),
            settings,
        }
    }

    /// Replace the default [`TopRanked`] selection, e.g. with an interactive prompt.
    pub fn with_selector(mut self, selector: Arc<dyn CandidateSelector>) -> Self {
        self.selector = selector;
        self
    }

    /// Scrape every title of `entity` and store the outcomes.
    ///
    /// Errors only when the store itself fails; per-title failures are
    /// reported in the returned outcomes.
    #[instrument(skip(self), fields(scraper = self.scraper.name()))]
    pub async fn process(&self, entity: &EntityRef) -> Result<Vec<EntityOutcome>> {
        let preflight = self.scraper.check_credentials();
        if !preflight.ok {
            warn!(message = %preflight.message, "scraper unavailable");
        }

        let subjects = self.store.subjects(entity).await?;
        info!(count = subjects.len(), "scraping");

        let mut outcomes = Vec::with_capacity(subjects.len());
        for subject in &subjects {
            outcomes.push(self.scrape_subject(subject).await);
        }

        if let Err(e) = self.scraper.flush() {
            warn!(error = %e, "failed to flush scraper cache");
        }

        let failed = outcomes.iter().filter(|o| !o.status.ok).count();
        info!(total = outcomes.len(), failed, "scrape finished");

        self.store.store(entity, &outcomes).await?;
        Ok(outcomes)
    }

    #[deprecated(note = "use `process(&EntityRef::rom(id))`")]
    pub async fn process_rom(&self, id: &str) -> Result<Vec<EntityOutcome>> {
        self.process(&EntityRef::rom(id)).await
    }

    #[deprecated(note = "use `process(&EntityRef::collection(id))`")]
    pub async fn process_collection(&self, id: &str) -> Result<Vec<EntityOutcome>> {
        self.process(&EntityRef::collection(id)).await
    }

    #[instrument(skip(self, subject), fields(subject = %subject.id))]
    async fn scrape_subject(&self, subject: &ScrapeSubject) -> EntityOutcome {
        let mut outcome = EntityOutcome::new(subject);
        if let Err(e) = self.resolve(subject, &mut outcome).await {
            warn!(error = %e, "scrape failed");
            outcome.status = ScrapeStatus::from_error(&e);
        }
        outcome
    }

    /// Fill `outcome` in place, so a failure keeps whatever was resolved before it.
    async fn resolve(&self, subject: &ScrapeSubject, outcome: &mut EntityOutcome) -> Result<()> {
        let candidates = self
            .scraper
            .search(&subject.search_term, &subject.platform)
            .await?;
        if candidates.is_empty() {
            outcome.status =
                ScrapeStatus::ok(format!("No candidates found for '{}'", subject.search_term));
            return Ok(());
        }

        let Some(candidate) = self
            .selector
            .select(subject, &candidates)
            .and_then(|index| candidates.get(index))
        else {
            outcome.status = ScrapeStatus::ok("Candidate selection skipped");
            return Ok(());
        };
        debug!(id = %candidate.id, name = %candidate.display_name, "selected candidate");
        outcome.candidate = Some(candidate.clone());

        if self.settings.scrape_metadata && self.scraper.supports_metadata() {
            outcome.metadata = Some(self.scraper.metadata(candidate).await?);
        }

        for &kind in &self.settings.asset_kinds {
            if !self.scraper.supports_asset(kind) {
                continue;
            }
            let Some(dir) = subject.asset_dirs.get(&kind) else {
                debug!(%kind, "no target directory, skipping");
                continue;
            };

            let assets = self.scraper.assets(candidate, kind).await?;
            let Some(asset) = assets.first() else {
                outcome.assets.push(AssetOutcome::NotAvailable { kind });
                continue;
            };

            let extension = asset
                .extension()
                .unwrap_or_else(|| FALLBACK_EXTENSION.to_string());
            let stem = sanitize_file_stem(&subject.file_stem);
            let dest = dir.join(format!("{stem}.{extension}"));
            let result = match self.scraper.download_asset(asset, &dest).await {
                Ok(path) => AssetOutcome::Downloaded { kind, path },
                Err(e) => {
                    warn!(%kind, error = %e, "asset download failed");
                    AssetOutcome::Failed {
                        kind,
                        message: e.to_string(),
                    }
                }
            };
            outcome.assets.push(result);
        }

        outcome.status = ScrapeStatus::ok(format!("Scraped '{}'", candidate.display_name));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str) -> Candidate {
        Candidate::scored(id, "Halo", "PC", "Halo")
    }

    #[test]
    fn top_ranked_picks_first() {
        let subject = ScrapeSubject::new("1", "Halo", "PC");
        assert_eq!(TopRanked.select(&subject, &[candidate("a"), candidate("b")]), Some(0));
        assert_eq!(TopRanked.select(&subject, &[]), None);
    }

    #[test]
    fn entity_ref_display() {
        assert_eq!(EntityRef::rom("42").to_string(), "rom:42");
        assert_eq!(EntityRef::collection("c1").to_string(), "collection:c1");
    }

    #[test]
    fn asset_outcome_kind() {
        let outcome = AssetOutcome::Failed {
            kind: AssetKind::Fanart,
            message: "boom".into(),
        };
        assert_eq!(outcome.kind(), AssetKind::Fanart);
    }
}
