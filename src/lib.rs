//! gridscrape - SteamGridDB artwork and metadata scraper
//!
//! This crate provides a [`Scraper`] trait for game-artwork providers and a
//! SteamGridDB implementation with throttled, rate-limit aware HTTP access
//! and a disk-backed result cache. [`ScrapeStrategy`] drives a scraper over
//! the titles of a host media library.
//!
//! # Example
//!
//! ```rust,no_run
//! use gridscrape::{AssetKind, Scraper, SteamGridDb};
//!
//! #[tokio::main]
//! async fn main() -> gridscrape::Result<()> {
//!     let scraper = SteamGridDb::builder()
//!         .api_key("your-api-key")
//!         .cache_dir("/tmp/gridscrape")
//!         .build()?;
//!
//!     let candidates = scraper.search("Halo", "Microsoft Xbox").await?;
//!     if let Some(best) = candidates.first() {
//!         let metadata = scraper.metadata(best).await?;
//!         let covers = scraper.assets(best, AssetKind::BoxFront).await?;
//!         println!("{} ({:?}): {} covers", metadata.title, metadata.release_year, covers.len());
//!     }
//!
//!     scraper.flush()?;
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod providers;
pub mod strategy;
pub mod telemetry;
pub mod traits;
pub mod types;
mod version;

// Re-export main types at crate root
pub use config::Config;
pub use error::{Result, ScrapeError};
pub use providers::{RateLimiter, RetryPolicy, SteamGridDb, SteamGridDbBuilder};
pub use strategy::{
    AssetOutcome, CandidateSelector, EntityKind, EntityOutcome, EntityRef, EntityStore,
    ScrapeSettings, ScrapeStrategy, ScrapeSubject, TopRanked,
};
pub use traits::Scraper;
pub use version::{BUILD_TIMESTAMP, GIT_BRANCH, GIT_SHA, PKG_VERSION, git_dirty, version_string};

pub use types::{
    AUTH_DOCS_URL, Advisory, AdvisorySink, AssetKind, AssetRecord, Candidate, DialogKind, LogSink,
    MetadataField, MetadataRecord, ScrapeStatus, UNKNOWN_TITLE,
};
