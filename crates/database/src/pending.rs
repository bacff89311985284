//! Pending-update queue operations.
//!
//! The queue holds regions whose most recent ledger change has not yet
//! been delivered. It is written only by the ingestion path and cleared
//! only by the dispatcher; delivery is at-least-once (a crash between
//! fan-out and `mark_delivered` re-delivers on the next run).

use sqlx::SqlitePool;

use crate::error::Result;

/// Enqueue a region for notification.
///
/// A no-op while an undelivered entry for the region already exists (the
/// ledger already reflects the latest level, so one notification covers
/// both changes); the partial unique index makes the insert ignorable.
pub async fn enqueue(pool: &SqlitePool, region_id: i64) -> Result<()> {
    sqlx::query(
        r#"
        INSERT OR IGNORE INTO pending_updates (region_id, delivered)
        VALUES (?, 0)
        "#,
    )
    .bind(region_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// All region ids with an undelivered pending update.
///
/// Restartable: calling this again before any `mark_delivered` returns
/// the same set.
pub async fn drain(pool: &SqlitePool) -> Result<Vec<i64>> {
    let region_ids = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT region_id
        FROM pending_updates
        WHERE delivered = 0
        ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(region_ids)
}

/// Mark a region's pending update as delivered.
///
/// Called once per region after fan-out to all resolved subscribers has
/// been attempted, regardless of per-recipient failures.
pub async fn mark_delivered(pool: &SqlitePool, region_id: i64) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE pending_updates
        SET delivered = 1
        WHERE region_id = ? AND delivered = 0
        "#,
    )
    .bind(region_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Count undelivered pending updates.
pub async fn backlog(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM pending_updates WHERE delivered = 0
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}
