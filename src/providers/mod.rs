//! Scraper implementations and the plumbing they share.
//!
//! - [`throttle`]: process-wide request spacing and cooldown gate
//! - [`retry`]: bounded retry of rate-limited calls
//! - [`steamgriddb`]: the SteamGridDB scraper

pub mod retry;
pub mod steamgriddb;
pub mod throttle;

pub use retry::RetryPolicy;
pub use steamgriddb::{SteamGridDb, SteamGridDbBuilder};
pub use throttle::RateLimiter;
