//! Subscriber bookkeeping.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::Subscriber;

/// Register a subscriber if not already known.
///
/// Subscribers are created lazily on their first subscription action;
/// repeated calls are no-ops.
pub async fn ensure_subscriber(pool: &SqlitePool, id: &str, name: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT OR IGNORE INTO subscribers (id, name)
        VALUES (?, ?)
        "#,
    )
    .bind(id)
    .bind(name)
    .execute(pool)
    .await?;

    Ok(())
}

/// Get a subscriber by id.
pub async fn get_subscriber(pool: &SqlitePool, id: &str) -> Result<Subscriber> {
    sqlx::query_as::<_, Subscriber>(
        r#"
        SELECT id, name
        FROM subscribers
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Subscriber",
        id: id.to_string(),
    })
}
