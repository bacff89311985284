//! Database models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// An administrative area tracked for alert-level changes.
///
/// The id is the external region code published by the upstream feed and
/// is stable across ingestion cycles. A region is created once on first
/// sighting and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Region {
    /// External region code (e.g. 701).
    pub id: i64,
    /// Category label ("municipality", "district", "state").
    pub kind: String,
    /// Display name.
    pub name: String,
}

/// One revision of a region's alert-level history.
///
/// Identified by `(revision, week, region_id)`. Revisions per region are
/// strictly increasing starting at 1; the highest revision is the current
/// state. Entries are appended only when the level actually changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct WarningEntry {
    /// Revision number, starting at 1 per region.
    pub revision: i64,
    /// Calendar-week bucket of the observation.
    pub week: i64,
    /// Region this entry belongs to.
    pub region_id: i64,
    /// Ordinal severity (1 = low .. 4 = critical), stored as observed.
    pub alert_level: i64,
    /// Free-text justification from the feed.
    pub reason: String,
}

/// A region whose latest ledger change has not yet been delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PendingUpdate {
    /// Auto-incrementing ID.
    pub id: i64,
    /// Region awaiting delivery.
    pub region_id: i64,
    /// Set once fan-out for the region has been attempted.
    pub delivered: bool,
}

/// An external identity interested in one or more regions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Subscriber {
    /// External chat/account id.
    pub id: String,
    /// Display name.
    pub name: String,
}

/// A subscriber/region interest pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Subscription {
    pub subscriber_id: String,
    pub region_id: i64,
}
