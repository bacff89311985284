//! Upstream feed client for the ampel alert tracker.
//!
//! The upstream source publishes two JSON documents: the region list
//! (codes, category, names) and the current warning levels, one snapshot
//! per publication timestamp. This crate decodes both into typed records
//! and hides the transport behind the [`RegionFeed`] trait so the
//! ingester can be driven from tests without a network.
//!
//! # Example
//!
//! ```no_run
//! use region_feed::{FeedConfig, HttpRegionFeed, RegionFeed};
//!
//! # async fn example() -> Result<(), region_feed::FeedError> {
//! let feed = HttpRegionFeed::new(FeedConfig::default())?;
//!
//! for snapshot in feed.fetch_warnings().await? {
//!     println!("{}: {} observations", snapshot.taken_at, snapshot.entries.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
mod http;
pub mod types;

pub use config::FeedConfig;
pub use error::FeedError;
pub use http::HttpRegionFeed;
pub use types::{RegionRecord, WarningObservation, WarningSnapshot};

use async_trait::async_trait;

/// Capability to pull the upstream region and warning-level documents.
///
/// Pull-based, called once per ingestion cycle. Implementations decode
/// leniently: malformed records are dropped, not surfaced as errors.
#[async_trait]
pub trait RegionFeed: Send + Sync {
    /// Fetch the current region list.
    async fn fetch_regions(&self) -> Result<Vec<RegionRecord>, FeedError>;

    /// Fetch the published warning-level snapshots.
    async fn fetch_warnings(&self) -> Result<Vec<WarningSnapshot>, FeedError>;
}

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
