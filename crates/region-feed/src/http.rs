//! HTTP implementation of the region feed.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use crate::config::FeedConfig;
use crate::error::FeedError;
use crate::types::{RawRegionsDoc, RawSnapshot, RegionRecord, WarningSnapshot};
use crate::RegionFeed;

/// Feed client pulling the two upstream JSON documents over HTTP.
#[derive(Clone)]
pub struct HttpRegionFeed {
    http: Client,
    config: FeedConfig,
}

impl HttpRegionFeed {
    /// Build a feed client from the given configuration.
    pub fn new(config: FeedConfig) -> Result<Self, FeedError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(FeedError::Http)?;

        Ok(Self { http, config })
    }

    /// Get the configuration this client was built with.
    pub fn config(&self) -> &FeedConfig {
        &self.config
    }
}

#[async_trait]
impl RegionFeed for HttpRegionFeed {
    async fn fetch_regions(&self) -> Result<Vec<RegionRecord>, FeedError> {
        debug!(url = %self.config.regions_url, "Fetching region list");

        let body = self
            .http
            .get(&self.config.regions_url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let doc: RawRegionsDoc = serde_json::from_str(&body)?;

        let regions: Vec<RegionRecord> = doc
            .regions
            .into_iter()
            .filter_map(RegionRecord::from_raw)
            .collect();

        info!(count = regions.len(), "Fetched region list");
        Ok(regions)
    }

    async fn fetch_warnings(&self) -> Result<Vec<WarningSnapshot>, FeedError> {
        debug!(url = %self.config.warnings_url, "Fetching warning levels");

        let body = self
            .http
            .get(&self.config.warnings_url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let raw: Vec<RawSnapshot> = serde_json::from_str(&body)?;

        let snapshots: Vec<WarningSnapshot> = raw
            .into_iter()
            .filter_map(WarningSnapshot::from_raw)
            .collect();

        info!(count = snapshots.len(), "Fetched warning snapshots");
        Ok(snapshots)
    }
}
