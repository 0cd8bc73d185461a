//! Public types for the gridscrape API.

mod asset;
mod candidate;
mod metadata;
mod status;

pub use asset::{AssetKind, AssetRecord};
pub use candidate::{BASELINE_SCORE, Candidate, EXACT_MATCH_BONUS, SUBSTRING_MATCH_BONUS};
pub use metadata::{MetadataField, MetadataRecord, UNKNOWN_TITLE};
pub use status::{AUTH_DOCS_URL, Advisory, AdvisorySink, DialogKind, LogSink, ScrapeStatus};

pub(crate) use candidate::rank;
