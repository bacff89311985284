//! Region registry operations.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::Region;

/// Register a region if it is not already known.
///
/// Looks up the full `(id, kind, name)` triple first; repeated calls with
/// identical data are no-ops. Returns `true` when a new row was inserted.
/// A conflicting insert for an already-taken id surfaces as
/// [`DatabaseError::AlreadyExists`].
pub async fn ensure_registered(
    pool: &SqlitePool,
    id: i64,
    kind: &str,
    name: &str,
) -> Result<bool> {
    let existing = sqlx::query_scalar::<_, i32>(
        r#"
        SELECT 1
        FROM regions
        WHERE id = ? AND kind = ? AND name = ?
        "#,
    )
    .bind(id)
    .bind(kind)
    .bind(name)
    .fetch_optional(pool)
    .await?;

    if existing.is_some() {
        return Ok(false);
    }

    sqlx::query(
        r#"
        INSERT INTO regions (id, kind, name)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(kind)
    .bind(name)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "Region",
                    id: id.to_string(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    tracing::debug!(region_id = id, name = %name, "Registered region");
    Ok(true)
}

/// Get a region by its external code.
pub async fn get_region(pool: &SqlitePool, id: i64) -> Result<Region> {
    sqlx::query_as::<_, Region>(
        r#"
        SELECT id, kind, name
        FROM regions
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Region",
        id: id.to_string(),
    })
}

/// Case-insensitive substring search over region names.
///
/// Used by the command surface to resolve a typed place name to concrete
/// regions before subscribing.
pub async fn search_by_name(pool: &SqlitePool, pattern: &str) -> Result<Vec<Region>> {
    let regions = sqlx::query_as::<_, Region>(
        r#"
        SELECT id, kind, name
        FROM regions
        WHERE name LIKE '%' || ? || '%' COLLATE NOCASE
        ORDER BY name
        "#,
    )
    .bind(pattern)
    .fetch_all(pool)
    .await?;

    Ok(regions)
}

/// Count registered regions.
pub async fn count_regions(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM regions
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}
