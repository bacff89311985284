//! Error types for dispatch operations.

use database::DatabaseError;
use thiserror::Error;

/// Errors that can occur during a dispatch run.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Database failure.
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// Alert level outside the presentation table.
    ///
    /// The ledger stores levels as observed; an unknown value fails
    /// loudly here instead of being silently misrendered.
    #[error("no presentation entry for alert level {level}")]
    UnknownLevel { level: i64 },
}
