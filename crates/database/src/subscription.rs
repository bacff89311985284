//! Subscription index operations.
//!
//! The `(subscriber_id, region_id)` pair is the entire interest relation:
//! created on subscribe, deleted on unsubscribe. Mutated by the command
//! layer, read by the dispatcher.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{Region, Subscriber};

/// Subscribe a subscriber to a region.
///
/// Idempotent: returns `true` when a new subscription was created and
/// `false` when the pair already existed (reported upstream as "already
/// registered").
pub async fn subscribe(pool: &SqlitePool, subscriber_id: &str, region_id: i64) -> Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO subscriptions (subscriber_id, region_id)
        VALUES (?, ?)
        "#,
    )
    .bind(subscriber_id)
    .bind(region_id)
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(true),
        Err(e) => {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.is_unique_violation() {
                    return Ok(false);
                }
            }
            Err(DatabaseError::Sqlx(e))
        }
    }
}

/// Remove one subscription pair.
pub async fn unsubscribe(pool: &SqlitePool, subscriber_id: &str, region_id: i64) -> Result<()> {
    let result = sqlx::query(
        r#"
        DELETE FROM subscriptions
        WHERE subscriber_id = ? AND region_id = ?
        "#,
    )
    .bind(subscriber_id)
    .bind(region_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Subscription",
            id: format!("{}/{}", subscriber_id, region_id),
        });
    }

    Ok(())
}

/// Remove every subscription for a subscriber.
pub async fn unsubscribe_all(pool: &SqlitePool, subscriber_id: &str) -> Result<u64> {
    let result = sqlx::query(
        r#"
        DELETE FROM subscriptions
        WHERE subscriber_id = ?
        "#,
    )
    .bind(subscriber_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// All subscribers interested in a region. Used by the dispatcher.
pub async fn subscribers_of(pool: &SqlitePool, region_id: i64) -> Result<Vec<Subscriber>> {
    let subscribers = sqlx::query_as::<_, Subscriber>(
        r#"
        SELECT u.id, u.name
        FROM subscribers u
        INNER JOIN subscriptions s ON s.subscriber_id = u.id
        WHERE s.region_id = ?
        ORDER BY u.name
        "#,
    )
    .bind(region_id)
    .fetch_all(pool)
    .await?;

    Ok(subscribers)
}

/// All regions a subscriber is interested in. Used by the list command.
pub async fn regions_of(pool: &SqlitePool, subscriber_id: &str) -> Result<Vec<Region>> {
    let regions = sqlx::query_as::<_, Region>(
        r#"
        SELECT r.id, r.kind, r.name
        FROM regions r
        INNER JOIN subscriptions s ON s.region_id = r.id
        WHERE s.subscriber_id = ?
        ORDER BY r.name
        "#,
    )
    .bind(subscriber_id)
    .fetch_all(pool)
    .await?;

    Ok(regions)
}
