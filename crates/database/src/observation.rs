//! Snapshot dedup markers.
//!
//! One row per distinct upstream feed snapshot timestamp. Checked before
//! per-region diffing begins so that re-fetching an already-seen snapshot
//! is a no-op.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};

/// Whether a snapshot timestamp has already been ingested.
pub async fn is_recorded(pool: &SqlitePool, taken_at: &str) -> Result<bool> {
    let row = sqlx::query_scalar::<_, i32>(
        r#"
        SELECT 1
        FROM observations
        WHERE taken_at = ?
        "#,
    )
    .bind(taken_at)
    .fetch_optional(pool)
    .await?;

    Ok(row.is_some())
}

/// Record a snapshot timestamp.
pub async fn record(pool: &SqlitePool, taken_at: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO observations (taken_at)
        VALUES (?)
        "#,
    )
    .bind(taken_at)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "Observation",
                    id: taken_at.to_string(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    Ok(())
}
