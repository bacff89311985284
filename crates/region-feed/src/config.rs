//! Configuration types for the upstream feed.

use std::time::Duration;

/// Configuration for the upstream feed endpoints.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// URL of the region list document.
    pub regions_url: String,
    /// URL of the current warning-level document.
    pub warnings_url: String,
    /// Request timeout for each fetch.
    pub timeout: Duration,
}

impl FeedConfig {
    /// Create a configuration with the given endpoint URLs.
    pub fn new(regions_url: impl Into<String>, warnings_url: impl Into<String>) -> Self {
        Self {
            regions_url: regions_url.into(),
            warnings_url: warnings_url.into(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self::new(
            "https://corona-ampel.gv.at/sites/corona-ampel.gv.at/files/coronadata/CoronaKommissionV2.json",
            "https://corona-ampel.gv.at/sites/corona-ampel.gv.at/files/assets/Warnstufen_Corona_Ampel_aktuell.json",
        )
    }
}
