//! Disk-backed scrape cache.
//!
//! Three independent namespaces, each persisted to its own JSON file under
//! the host-supplied cache directory:
//!
//! - [`Namespace::Candidates`]: ranked search results, keyed by
//!   [`CacheKey::search`] (normalized title + platform).
//! - [`Namespace::Metadata`]: resolved [`MetadataRecord`]s, keyed by
//!   [`CacheKey::entity`] (raw candidate id).
//! - [`Namespace::Assets`]: full asset catalogs, keyed by candidate id.
//!
//! Entries are only written after a fully successful fetch-and-parse, and
//! are replaced wholesale rather than mutated. Nothing reaches disk until
//! [`ScrapeCache::flush`] is called.

mod disk;

pub use disk::DiskNamespace;

use std::fmt;
use std::path::Path;

use crate::Result;
use crate::types::{AssetRecord, Candidate, MetadataRecord};

/// Cache partition for one result type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Candidates,
    Metadata,
    Assets,
}

impl Namespace {
    pub fn as_str(self) -> &'static str {
        match self {
            Namespace::Candidates => "candidates",
            Namespace::Metadata => "metadata",
            Namespace::Assets => "assets",
        }
    }

    /// File name of this namespace for the given scraper,
    /// e.g. `SteamGridDB__metadata.json`.
    pub fn file_name(self, scraper: &str) -> String {
        format!("{scraper}__{}.json", self.as_str())
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized cache fingerprint.
///
/// Identical logical requests always produce identical keys: search keys
/// ignore case and surrounding whitespace of the title.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Key for a search request: `{title byte length}:{title}|{platform}`.
    ///
    /// The length prefix keeps the title/platform boundary unambiguous when
    /// either part contains the separator.
    pub fn search(title: &str, platform: &str) -> Self {
        let title = title.trim().to_lowercase();
        Self(format!("{}:{title}|{}", title.len(), platform.trim()))
    }

    /// Key for a provider entity (candidate id).
    pub fn entity(id: &str) -> Self {
        Self(id.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The three namespaces of one scraper.
pub struct ScrapeCache {
    pub candidates: DiskNamespace<Vec<Candidate>>,
    pub metadata: DiskNamespace<MetadataRecord>,
    pub assets: DiskNamespace<Vec<AssetRecord>>,
}

impl ScrapeCache {
    /// Open (or create on first flush) the cache files of `scraper` in `dir`.
    pub fn open(dir: &Path, scraper: &str) -> Self {
        let path = |ns: Namespace| dir.join(ns.file_name(scraper));
        Self {
            candidates: DiskNamespace::open(Namespace::Candidates, path(Namespace::Candidates)),
            metadata: DiskNamespace::open(Namespace::Metadata, path(Namespace::Metadata)),
            assets: DiskNamespace::open(Namespace::Assets, path(Namespace::Assets)),
        }
    }

    /// Session-only cache; [`flush`](Self::flush) is a no-op.
    pub fn ephemeral() -> Self {
        Self {
            candidates: DiskNamespace::ephemeral(Namespace::Candidates),
            metadata: DiskNamespace::ephemeral(Namespace::Metadata),
            assets: DiskNamespace::ephemeral(Namespace::Assets),
        }
    }

    /// Persist all namespaces. Every namespace is attempted; the first error
    /// is returned.
    pub fn flush(&self) -> Result<()> {
        let results = [
            self.candidates.flush(),
            self.metadata.flush(),
            self.assets.flush(),
        ];
        results.into_iter().collect::<Result<Vec<()>>>().map(|_| ())
    }
}
