//! SQLite persistence layer for the ampel alert tracker.
//!
//! This crate owns the five core relations — regions, warnings,
//! pending_updates, subscribers, subscriptions — plus the snapshot-dedup
//! markers, with async operations through SQLx.
//!
//! # Example
//!
//! ```no_run
//! use database::{warning, Database};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:ampel.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     // Ingest an observation for region 701, week 10, level 2
//!     let outcome = warning::ingest(db.pool(), 701, 10, 2, "").await?;
//!     println!("{:?}", outcome);
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod models;
pub mod observation;
pub mod pending;
pub mod region;
pub mod subscriber;
pub mod subscription;
pub mod warning;

pub use error::{DatabaseError, Result};
pub use models::{PendingUpdate, Region, Subscriber, Subscription, WarningEntry};
pub use warning::IngestOutcome;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    /// Ingestion and dispatch may run concurrently against the same pool.
    const DEFAULT_POOL_SIZE: u32 = 5;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `sqlite::memory:` for tests.
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!("Connected to database: {} (pool size: {})", url, pool_size);

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
