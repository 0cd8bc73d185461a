//! Search candidates.

use serde::{Deserialize, Serialize};

/// Score every candidate starts with.
pub const BASELINE_SCORE: u32 = 1;
/// Bonus for a case-insensitive exact title match.
pub const EXACT_MATCH_BONUS: u32 = 2;
/// Bonus when the search term occurs anywhere in the title.
pub const SUBSTRING_MATCH_BONUS: u32 = 1;

/// One possible provider-side match for a searched title.
///
/// Candidates are immutable once produced; a search returns them ordered by
/// descending [`match_score`](Self::match_score), ties kept in provider order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Opaque provider identifier.
    pub id: String,
    /// Title as reported by the provider.
    pub display_name: String,
    /// Platform the search was issued for.
    pub platform: String,
    /// Local relevance score (see [`Candidate::score`]).
    pub match_score: u32,
}

impl Candidate {
    /// Create a candidate scored against `search_term`.
    pub fn scored(
        id: impl Into<String>,
        display_name: impl Into<String>,
        platform: impl Into<String>,
        search_term: &str,
    ) -> Self {
        let display_name = display_name.into();
        let match_score = Self::score(&display_name, search_term);
        Self {
            id: id.into(),
            display_name,
            platform: platform.into(),
            match_score,
        }
    }

    /// Relevance of `title` for `search_term`.
    ///
    /// Baseline 1, +2 on a case-insensitive exact match, +1 when the term is
    /// a case-insensitive substring of the title. An exact match is also a
    /// substring match, so it collects both bonuses.
    pub fn score(title: &str, search_term: &str) -> u32 {
        let title = title.to_lowercase();
        let term = search_term.trim().to_lowercase();
        let mut score = BASELINE_SCORE;
        if title == term {
            score += EXACT_MATCH_BONUS;
        }
        if title.contains(&term) {
            score += SUBSTRING_MATCH_BONUS;
        }
        score
    }
}

/// Stable sort by descending score; equal scores keep provider order.
pub(crate) fn rank(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| b.match_score.cmp(&a.match_score));
}
