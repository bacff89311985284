//! Warning ledger operations.
//!
//! The ledger is the append-only, revision-numbered history of alert
//! levels per region and the source of truth for "did anything change".
//! Rows are never updated or deleted; `ingest` appends a new revision
//! only when the observed level differs from the current one.

use sqlx::SqlitePool;

use crate::error::Result;
use crate::models::WarningEntry;

/// Sentinel stored when the feed supplies no justification text.
///
/// Keeps "no reason given" distinguishable from "reason not yet known".
pub const NO_REASON: &str = "none supplied";

/// Outcome of ingesting one observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// A new revision was appended; subscribers need to hear about it.
    Changed,
    /// The observed level matches the current state; nothing was written.
    Unchanged,
}

/// Ingest one observed alert level for a region.
///
/// The first observation for a region always appends revision 1 and
/// counts as a change. Levels outside the expected 1..4 domain are stored
/// as-is; the presentation layer is responsible for failing loudly on
/// them.
pub async fn ingest(
    pool: &SqlitePool,
    region_id: i64,
    week: i64,
    observed_level: i64,
    reason: &str,
) -> Result<IngestOutcome> {
    match latest(pool, region_id).await? {
        Some(current) if current.alert_level == observed_level => Ok(IngestOutcome::Unchanged),
        Some(current) => {
            append(pool, current.revision + 1, week, region_id, observed_level, reason).await?;
            tracing::info!(
                region_id,
                revision = current.revision + 1,
                from = current.alert_level,
                to = observed_level,
                "Alert level changed"
            );
            Ok(IngestOutcome::Changed)
        }
        None => {
            append(pool, 1, week, region_id, observed_level, reason).await?;
            tracing::info!(region_id, level = observed_level, "First observation for region");
            Ok(IngestOutcome::Changed)
        }
    }
}

/// Get the current state: the entry with the highest revision.
pub async fn latest(pool: &SqlitePool, region_id: i64) -> Result<Option<WarningEntry>> {
    let entry = sqlx::query_as::<_, WarningEntry>(
        r#"
        SELECT revision, week, region_id, alert_level, reason
        FROM warnings
        WHERE region_id = ?
        ORDER BY revision DESC
        LIMIT 1
        "#,
    )
    .bind(region_id)
    .fetch_optional(pool)
    .await?;

    Ok(entry)
}

/// Get the two most recent entries, newest first.
///
/// The dispatcher diffs these to pick the transition tone. A region with
/// a single entry has no previous level to diff against.
pub async fn latest_two(pool: &SqlitePool, region_id: i64) -> Result<Vec<WarningEntry>> {
    let entries = sqlx::query_as::<_, WarningEntry>(
        r#"
        SELECT revision, week, region_id, alert_level, reason
        FROM warnings
        WHERE region_id = ?
        ORDER BY revision DESC
        LIMIT 2
        "#,
    )
    .bind(region_id)
    .fetch_all(pool)
    .await?;

    Ok(entries)
}

/// Full revision history for a region, oldest first.
pub async fn history(pool: &SqlitePool, region_id: i64) -> Result<Vec<WarningEntry>> {
    let entries = sqlx::query_as::<_, WarningEntry>(
        r#"
        SELECT revision, week, region_id, alert_level, reason
        FROM warnings
        WHERE region_id = ?
        ORDER BY revision ASC
        "#,
    )
    .bind(region_id)
    .fetch_all(pool)
    .await?;

    Ok(entries)
}

async fn append(
    pool: &SqlitePool,
    revision: i64,
    week: i64,
    region_id: i64,
    alert_level: i64,
    reason: &str,
) -> Result<()> {
    let reason = if reason.trim().is_empty() { NO_REASON } else { reason };

    sqlx::query(
        r#"
        INSERT INTO warnings (revision, week, region_id, alert_level, reason)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(revision)
    .bind(week)
    .bind(region_id)
    .bind(alert_level)
    .bind(reason)
    .execute(pool)
    .await?;

    Ok(())
}
