//! Host-side entity store seam.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::EntityOutcome;
use crate::Result;
use crate::types::AssetKind;

/// Kind of host entity a scrape is requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A single title.
    Rom,
    /// A group of titles, scraped member by member.
    Collection,
}

/// Typed reference to a host entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: String,
}

impl EntityRef {
    pub fn rom(id: impl Into<String>) -> Self {
        Self {
            kind: EntityKind::Rom,
            id: id.into(),
        }
    }

    pub fn collection(id: impl Into<String>) -> Self {
        Self {
            kind: EntityKind::Collection,
            id: id.into(),
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            EntityKind::Rom => "rom",
            EntityKind::Collection => "collection",
        };
        write!(f, "{kind}:{}", self.id)
    }
}

/// One title to scrape, as described by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeSubject {
    /// Host identifier of the title.
    pub id: String,
    pub search_term: String,
    pub platform: String,
    /// Base name for downloaded files, without extension.
    pub file_stem: String,
    /// Where each asset kind is downloaded to. Kinds without a directory are
    /// not downloaded.
    #[serde(default)]
    pub asset_dirs: BTreeMap<AssetKind, PathBuf>,
}

impl ScrapeSubject {
    pub fn new(
        id: impl Into<String>,
        search_term: impl Into<String>,
        platform: impl Into<String>,
    ) -> Self {
        let search_term = search_term.into();
        Self {
            id: id.into(),
            file_stem: sanitize_file_stem(&search_term),
            search_term,
            platform: platform.into(),
            asset_dirs: BTreeMap::new(),
        }
    }

    /// Base name for downloads. Path separators are replaced, so the stem
    /// always names a single file inside the asset directory.
    pub fn file_stem(mut self, stem: impl Into<String>) -> Self {
        self.file_stem = sanitize_file_stem(&stem.into());
        self
    }

    pub fn asset_dir(mut self, kind: AssetKind, dir: impl Into<PathBuf>) -> Self {
        self.asset_dirs.insert(kind, dir.into());
        self
    }
}

/// Turn `raw` into a single path component: separators and NULs become `_`,
/// and empty, `.` or `..` stems become `_`.
pub(crate) fn sanitize_file_stem(raw: &str) -> String {
    let stem: String = raw
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect();
    match stem.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => stem,
    }
}

/// The host's media library, as seen by the orchestrator.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Titles to scrape for `entity`: one for a ROM, every member for a collection.
    async fn subjects(&self, entity: &EntityRef) -> Result<Vec<ScrapeSubject>>;

    /// Persist the outcomes of a scrape of `entity`.
    async fn store(&self, entity: &EntityRef, outcomes: &[EntityOutcome]) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_stem_is_a_single_component() {
        assert_eq!(ScrapeSubject::new("1", "AC/DC", "PC").file_stem, "AC_DC");
        assert_eq!(ScrapeSubject::new("1", r"a\b", "PC").file_stem, "a_b");
        assert_eq!(ScrapeSubject::new("1", "..", "PC").file_stem, "_");
        assert_eq!(ScrapeSubject::new("1", "  ", "PC").file_stem, "_");
    }

    #[test]
    fn explicit_stem_is_sanitized() {
        let subject = ScrapeSubject::new("1", "Halo", "PC").file_stem("../../etc/passwd");
        assert_eq!(subject.file_stem, ".._.._etc_passwd");
    }

    #[test]
    fn ordinary_titles_are_kept() {
        assert_eq!(
            ScrapeSubject::new("1", "Halo: Combat Evolved", "PC").file_stem,
            "Halo: Combat Evolved"
        );
    }
}
