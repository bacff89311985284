//! Feed ingestion cycle for the ampel alert tracker.
//!
//! One cycle pulls the upstream region list and warning snapshots,
//! registers unseen regions, runs the ledger decision per observation and
//! enqueues a pending update for every real change. Failures are
//! contained at the smallest possible scope: a bad region or observation
//! is logged and skipped, the rest of the batch continues, and the next
//! cycle re-fetches the feed in full.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use database::Database;
//! use ingester::Ingester;
//! use region_feed::{FeedConfig, HttpRegionFeed};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::connect("sqlite:ampel.db?mode=rwc").await?;
//! db.migrate().await?;
//!
//! let feed = HttpRegionFeed::new(FeedConfig::default())?;
//! let ingester = Ingester::new(db, feed);
//!
//! let shutdown = async {
//!     tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//! };
//! ingester.run_with_shutdown(Duration::from_secs(3600), shutdown).await?;
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::time::Duration;

use database::{observation, pending, region, warning, Database, DatabaseError, IngestOutcome};
use region_feed::{FeedError, RegionFeed};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Errors that abort a whole ingestion cycle.
///
/// Per-record failures never surface here; they are logged and counted in
/// the [`IngestReport`] instead.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Upstream feed could not be fetched or decoded.
    #[error("feed error: {0}")]
    Feed(#[from] FeedError),

    /// Database failure outside any single-record scope.
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Counters for one ingestion cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Regions newly registered this cycle.
    pub regions_registered: usize,
    /// Snapshots ingested for the first time.
    pub snapshots_ingested: usize,
    /// Snapshots skipped because their timestamp was already recorded.
    pub snapshots_skipped: usize,
    /// Observations that appended a new ledger revision.
    pub changes: usize,
    /// Observations matching the current level (no write).
    pub unchanged: usize,
    /// Single-record failures that were logged and skipped.
    pub failures: usize,
}

/// Runs ingestion cycles against the database.
pub struct Ingester<F: RegionFeed> {
    db: Database,
    feed: F,
}

impl<F: RegionFeed> Ingester<F> {
    /// Create a new ingester.
    pub fn new(db: Database, feed: F) -> Self {
        Self { db, feed }
    }

    /// Get a reference to the feed.
    pub fn feed(&self) -> &F {
        &self.feed
    }

    /// Run one full ingestion cycle.
    pub async fn run_once(&self) -> Result<IngestReport, IngestError> {
        let mut report = IngestReport::default();
        let pool = self.db.pool();

        for record in self.feed.fetch_regions().await? {
            match region::ensure_registered(pool, record.code, &record.kind, &record.name).await {
                Ok(true) => report.regions_registered += 1,
                Ok(false) => {}
                Err(e) => {
                    // A partial-registration run self-heals next cycle.
                    warn!(region_code = record.code, "Failed to register region: {}", e);
                    report.failures += 1;
                }
            }
        }

        for snapshot in self.feed.fetch_warnings().await? {
            if observation::is_recorded(pool, &snapshot.taken_at).await? {
                debug!(taken_at = %snapshot.taken_at, "Snapshot already ingested");
                report.snapshots_skipped += 1;
                continue;
            }
            if let Err(e) = observation::record(pool, &snapshot.taken_at).await {
                // The full feed is re-fetched next cycle.
                warn!(taken_at = %snapshot.taken_at, "Failed to record snapshot: {}", e);
                report.failures += 1;
                continue;
            }
            report.snapshots_ingested += 1;

            for obs in snapshot.entries {
                match warning::ingest(pool, obs.region_code, obs.week, obs.level, &obs.reason).await
                {
                    Ok(IngestOutcome::Changed) => {
                        match pending::enqueue(pool, obs.region_code).await {
                            Ok(()) => report.changes += 1,
                            Err(e) => {
                                error!(region_id = obs.region_code, "Failed to enqueue update: {}", e);
                                report.failures += 1;
                            }
                        }
                    }
                    Ok(IngestOutcome::Unchanged) => report.unchanged += 1,
                    Err(e) => {
                        error!(region_id = obs.region_code, "Failed to ingest observation: {}", e);
                        report.failures += 1;
                    }
                }
            }
        }

        Ok(report)
    }

    /// Run ingestion cycles on an interval until the shutdown signal
    /// completes.
    ///
    /// Cycles never overlap: the next tick is not processed until the
    /// current cycle has finished. A failed cycle is logged and retried
    /// at the next tick.
    pub async fn run_with_shutdown<S>(
        &self,
        poll_interval: Duration,
        shutdown_signal: S,
    ) -> Result<(), IngestError>
    where
        S: Future<Output = ()> + Send,
    {
        info!(poll_interval = ?poll_interval, "Starting ingestion loop");

        let mut ticker = tokio::time::interval(poll_interval);
        tokio::pin!(shutdown_signal);

        loop {
            tokio::select! {
                () = &mut shutdown_signal => {
                    info!("Shutdown signal received, stopping ingestion loop");
                    return Ok(());
                }
                _ = ticker.tick() => {
                    match self.run_once().await {
                        Ok(report) => info!(
                            registered = report.regions_registered,
                            ingested = report.snapshots_ingested,
                            changes = report.changes,
                            failures = report.failures,
                            "Ingestion cycle complete"
                        ),
                        Err(e) => error!("Ingestion cycle failed: {}", e),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use region_feed::{RegionRecord, WarningObservation, WarningSnapshot};

    /// In-memory feed returning fixed documents.
    struct StaticFeed {
        regions: Vec<RegionRecord>,
        snapshots: Vec<WarningSnapshot>,
    }

    #[async_trait]
    impl RegionFeed for StaticFeed {
        async fn fetch_regions(&self) -> Result<Vec<RegionRecord>, FeedError> {
            Ok(self.regions.clone())
        }

        async fn fetch_warnings(&self) -> Result<Vec<WarningSnapshot>, FeedError> {
            Ok(self.snapshots.clone())
        }
    }

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    fn test_region(code: i64, name: &str) -> RegionRecord {
        RegionRecord {
            code,
            kind: "district".to_string(),
            name: name.to_string(),
        }
    }

    fn snapshot(taken_at: &str, entries: Vec<(i64, i64)>) -> WarningSnapshot {
        WarningSnapshot {
            taken_at: taken_at.to_string(),
            entries: entries
                .into_iter()
                .map(|(region_code, level)| WarningObservation {
                    region_code,
                    week: 40,
                    level,
                    reason: String::new(),
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn cycle_registers_regions_and_enqueues_changes() {
        let db = test_db().await;
        let feed = StaticFeed {
            regions: vec![test_region(701, "Innsbruck-Land"), test_region(8, "Wien")],
            snapshots: vec![snapshot("2020-10-01T14:00:00+02:00", vec![(701, 2), (8, 1)])],
        };
        let ingester = Ingester::new(db.clone(), feed);

        let report = ingester.run_once().await.unwrap();
        assert_eq!(report.regions_registered, 2);
        assert_eq!(report.snapshots_ingested, 1);
        assert_eq!(report.changes, 2);
        assert_eq!(report.failures, 0);

        let current = warning::latest(db.pool(), 701).await.unwrap().unwrap();
        assert_eq!(current.revision, 1);
        assert_eq!(current.alert_level, 2);

        let mut backlog = pending::drain(db.pool()).await.unwrap();
        backlog.sort_unstable();
        assert_eq!(backlog, vec![8, 701]);
    }

    #[tokio::test]
    async fn repeated_snapshot_is_a_no_op() {
        let db = test_db().await;
        let feed = StaticFeed {
            regions: vec![test_region(701, "Innsbruck-Land")],
            snapshots: vec![snapshot("2020-10-01T14:00:00+02:00", vec![(701, 2)])],
        };
        let ingester = Ingester::new(db.clone(), feed);

        ingester.run_once().await.unwrap();
        let report = ingester.run_once().await.unwrap();

        assert_eq!(report.snapshots_skipped, 1);
        assert_eq!(report.snapshots_ingested, 0);
        assert_eq!(report.changes, 0);

        // No additional ledger or queue rows.
        assert_eq!(warning::history(db.pool(), 701).await.unwrap().len(), 1);
        assert_eq!(pending::drain(db.pool()).await.unwrap(), vec![701]);
    }

    #[tokio::test]
    async fn level_change_in_new_snapshot_appends_revision() {
        let db = test_db().await;
        let ingester = Ingester::new(
            db.clone(),
            StaticFeed {
                regions: vec![test_region(701, "Innsbruck-Land")],
                snapshots: vec![snapshot("2020-10-01T14:00:00+02:00", vec![(701, 2)])],
            },
        );
        ingester.run_once().await.unwrap();

        let ingester = Ingester::new(
            db.clone(),
            StaticFeed {
                regions: vec![test_region(701, "Innsbruck-Land")],
                snapshots: vec![
                    snapshot("2020-10-01T14:00:00+02:00", vec![(701, 2)]),
                    snapshot("2020-10-08T14:00:00+02:00", vec![(701, 4)]),
                ],
            },
        );
        let report = ingester.run_once().await.unwrap();

        assert_eq!(report.snapshots_skipped, 1);
        assert_eq!(report.snapshots_ingested, 1);
        assert_eq!(report.changes, 1);

        let entries = warning::latest_two(db.pool(), 701).await.unwrap();
        assert_eq!(entries[0].revision, 2);
        assert_eq!(entries[0].alert_level, 4);

        // The change coalesces into the single still-undelivered entry.
        assert_eq!(pending::drain(db.pool()).await.unwrap(), vec![701]);
    }

    #[tokio::test]
    async fn conflicting_region_registration_does_not_abort_cycle() {
        let db = test_db().await;
        region::ensure_registered(db.pool(), 701, "district", "Old Name")
            .await
            .unwrap();

        let feed = StaticFeed {
            // Same code, different name: the triple lookup misses and the
            // insert hits the primary key.
            regions: vec![test_region(701, "New Name"), test_region(8, "Wien")],
            snapshots: vec![],
        };
        let ingester = Ingester::new(db.clone(), feed);

        let report = ingester.run_once().await.unwrap();
        assert_eq!(report.failures, 1);
        assert_eq!(report.regions_registered, 1);
        assert_eq!(region::count_regions(db.pool()).await.unwrap(), 2);
    }
}
