//! The scheduled notification dispatch run.

use std::future::Future;
use std::time::Duration;

use database::models::{Region, Subscriber, WarningEntry};
use database::{pending, region, subscription, warning, Database};
use futures::StreamExt;
use tracing::{debug, error, info, warn};

use crate::error::DispatchError;
use crate::notifier::Notifier;
use crate::presentation;

/// Default per-send timeout so one unreachable subscriber cannot stall
/// the batch.
const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Default bound on concurrent sends per region.
const DEFAULT_MAX_IN_FLIGHT: usize = 8;

/// Configuration for the dispatcher.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Timeout applied to every notifier send.
    pub send_timeout: Duration,
    /// Maximum number of in-flight sends per region.
    pub max_in_flight: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            send_timeout: DEFAULT_SEND_TIMEOUT,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }
}

/// Counters for one dispatch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Regions drained from the pending queue.
    pub regions_drained: usize,
    /// Regions whose subscribers were messaged.
    pub regions_notified: usize,
    /// Regions marked delivered without any subscriber to notify.
    pub regions_without_subscribers: usize,
    /// First-observation regions marked delivered without messaging.
    pub regions_at_baseline: usize,
    /// Regions left pending because their level has no presentation.
    pub regions_left_pending: usize,
    /// Messages successfully handed to the notifier.
    pub messages_sent: usize,
    /// Per-recipient failures (logged, not retried).
    pub delivery_failures: usize,
}

/// Drains the pending-update queue and fans notifications out to
/// subscribers on a schedule.
pub struct Dispatcher<N: Notifier> {
    db: Database,
    notifier: N,
    config: DispatcherConfig,
}

impl<N: Notifier> Dispatcher<N> {
    /// Create a new dispatcher.
    pub fn new(db: Database, notifier: N, config: DispatcherConfig) -> Self {
        Self {
            db,
            notifier,
            config,
        }
    }

    /// Create a dispatcher with default configuration.
    pub fn with_defaults(db: Database, notifier: N) -> Self {
        Self::new(db, notifier, DispatcherConfig::default())
    }

    /// Get a reference to the notifier.
    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Run one dispatch cycle over the current pending backlog.
    pub async fn run_once(&self) -> Result<DispatchReport, DispatchError> {
        let pool = self.db.pool();
        let mut report = DispatchReport::default();

        for region_id in pending::drain(pool).await? {
            report.regions_drained += 1;

            let subscribers = subscription::subscribers_of(pool, region_id).await?;
            if subscribers.is_empty() {
                // Unwatched regions must still leave the backlog.
                pending::mark_delivered(pool, region_id).await?;
                report.regions_without_subscribers += 1;
                continue;
            }

            let entries = warning::latest_two(pool, region_id).await?;
            let (current, previous) = match entries.as_slice() {
                [current, previous] => (current, previous),
                _ => {
                    // First-ever observation: no previous level to diff
                    // against, nothing to announce.
                    debug!(region_id, "Single-revision region, skipping message");
                    pending::mark_delivered(pool, region_id).await?;
                    report.regions_at_baseline += 1;
                    continue;
                }
            };

            let region = region::get_region(pool, region_id).await?;
            let text = match compose_message(&region, previous, current) {
                Ok(text) => text,
                Err(e @ DispatchError::UnknownLevel { .. }) => {
                    // Left pending so the condition stays visible; it
                    // re-drains once the level is back in the domain.
                    error!(region_id, "Cannot render transition: {}", e);
                    report.regions_left_pending += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            let (sent, failed) = self.fan_out(&subscribers, &region, &text).await;
            report.messages_sent += sent;
            report.delivery_failures += failed;

            pending::mark_delivered(pool, region_id).await?;
            report.regions_notified += 1;
        }

        Ok(report)
    }

    /// Deliver one region's message to every subscriber independently.
    ///
    /// Sends are bounded by `max_in_flight` and each carries the
    /// configured timeout; ordering between subscribers is not
    /// guaranteed. Returns `(sent, failed)` counts.
    async fn fan_out(
        &self,
        subscribers: &[Subscriber],
        region: &Region,
        text: &str,
    ) -> (usize, usize) {
        let results: Vec<bool> = futures::stream::iter(subscribers)
            .map(|subscriber| async move {
                debug!(
                    subscriber = %subscriber.name,
                    region = %region.name,
                    "Notifying subscriber"
                );

                let send = self.notifier.send(&subscriber.id, text);
                match tokio::time::timeout(self.config.send_timeout, send).await {
                    Ok(Ok(())) => true,
                    Ok(Err(e)) => {
                        warn!(subscriber = %subscriber.id, "Delivery failed: {}", e);
                        false
                    }
                    Err(_elapsed) => {
                        warn!(
                            subscriber = %subscriber.id,
                            timeout = ?self.config.send_timeout,
                            "Delivery timed out"
                        );
                        false
                    }
                }
            })
            .buffer_unordered(self.config.max_in_flight)
            .collect()
            .await;

        let sent = results.iter().filter(|ok| **ok).count();
        (sent, results.len() - sent)
    }

    /// Run dispatch cycles on an interval until the shutdown signal
    /// completes.
    ///
    /// A run aborted between regions leaves the unmarked remainder
    /// pending; the next cycle picks it up again.
    pub async fn run_with_shutdown<S>(
        &self,
        dispatch_interval: Duration,
        shutdown_signal: S,
    ) -> Result<(), DispatchError>
    where
        S: Future<Output = ()> + Send,
    {
        info!(dispatch_interval = ?dispatch_interval, "Starting dispatch loop");

        let mut ticker = tokio::time::interval(dispatch_interval);
        tokio::pin!(shutdown_signal);

        loop {
            tokio::select! {
                () = &mut shutdown_signal => {
                    info!("Shutdown signal received, stopping dispatch loop");
                    return Ok(());
                }
                _ = ticker.tick() => {
                    match self.run_once().await {
                        Ok(report) => info!(
                            drained = report.regions_drained,
                            notified = report.regions_notified,
                            sent = report.messages_sent,
                            failures = report.delivery_failures,
                            "Dispatch run complete"
                        ),
                        Err(e) => error!("Dispatch run failed: {}", e),
                    }
                }
            }
        }
    }
}

/// Compose the message shared by all subscribers of a region.
///
/// The tone is a plain ordinal comparison of the two most recent levels;
/// no magnitude threshold.
fn compose_message(
    region: &Region,
    previous: &WarningEntry,
    current: &WarningEntry,
) -> Result<String, DispatchError> {
    let before = presentation::level_style(previous.alert_level)?;
    let after = presentation::level_style(current.alert_level)?;

    let headline = if current.alert_level > previous.alert_level {
        format!("⚠️ The alert level for {} has been raised.", region.name)
    } else {
        format!("✅ The alert level for {} has been lowered.", region.name)
    };

    Ok(format!(
        "{}\n{} → {}\nMore information: {}",
        headline, before.badge, after.badge, after.link
    ))
}
