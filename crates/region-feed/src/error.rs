//! Error types for the feed client.

use thiserror::Error;

/// Errors that can occur when fetching or decoding the upstream feed.
#[derive(Debug, Error)]
pub enum FeedError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
