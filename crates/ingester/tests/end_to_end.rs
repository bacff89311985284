//! End-to-end tests: feed snapshots in, subscriber notifications out.

use std::sync::Mutex;

use async_trait::async_trait;
use database::{pending, subscriber, subscription, warning, Database};
use dispatcher::{Dispatcher, Notifier, NotifyError};
use ingester::Ingester;
use region_feed::{FeedError, RegionFeed, RegionRecord, WarningObservation, WarningSnapshot};

/// Feed whose documents can be swapped between cycles.
struct ScriptedFeed {
    regions: Vec<RegionRecord>,
    snapshots: Mutex<Vec<WarningSnapshot>>,
}

impl ScriptedFeed {
    fn new(regions: Vec<RegionRecord>) -> Self {
        Self {
            regions,
            snapshots: Mutex::new(Vec::new()),
        }
    }

    fn publish(&self, taken_at: &str, week: i64, levels: &[(i64, i64)]) {
        self.snapshots.lock().unwrap().push(WarningSnapshot {
            taken_at: taken_at.to_string(),
            entries: levels
                .iter()
                .map(|&(region_code, level)| WarningObservation {
                    region_code,
                    week,
                    level,
                    reason: String::new(),
                })
                .collect(),
        });
    }
}

#[async_trait]
impl RegionFeed for ScriptedFeed {
    async fn fetch_regions(&self) -> Result<Vec<RegionRecord>, FeedError> {
        Ok(self.regions.clone())
    }

    async fn fetch_warnings(&self) -> Result<Vec<WarningSnapshot>, FeedError> {
        Ok(self.snapshots.lock().unwrap().clone())
    }
}

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, subscriber_id: &str, text: &str) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap()
            .push((subscriber_id.to_string(), text.to_string()));
        Ok(())
    }
}

async fn test_db() -> Database {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    db.migrate().await.unwrap();
    db
}

fn district(code: i64, name: &str) -> RegionRecord {
    RegionRecord {
        code,
        kind: "district".to_string(),
        name: name.to_string(),
    }
}

#[tokio::test]
async fn change_flows_from_feed_to_subscriber() {
    let db = test_db().await;
    let feed = ScriptedFeed::new(vec![district(701, "Innsbruck-Land")]);
    feed.publish("2020-10-01T14:00:00+02:00", 40, &[(701, 2)]);

    let ingester = Ingester::new(db.clone(), feed);
    let dispatcher = Dispatcher::with_defaults(db.clone(), RecordingNotifier::default());

    subscriber::ensure_subscriber(db.pool(), "chat-1", "Alice")
        .await
        .unwrap();
    subscription::subscribe(db.pool(), "chat-1", 701).await.unwrap();

    // First sighting enqueues but announces nothing.
    ingester.run_once().await.unwrap();
    let report = dispatcher.run_once().await.unwrap();
    assert_eq!(report.regions_at_baseline, 1);
    assert!(dispatcher.notifier().sent.lock().unwrap().is_empty());

    // A later snapshot raises the level; the subscriber hears about it.
    ingester.feed().publish("2020-10-08T14:00:00+02:00", 41, &[(701, 4)]);
    ingester.run_once().await.unwrap();
    let report = dispatcher.run_once().await.unwrap();

    assert_eq!(report.regions_notified, 1);
    assert_eq!(report.messages_sent, 1);

    let sent = dispatcher.notifier().sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "chat-1");
    assert!(sent[0].1.contains("Innsbruck-Land"));
    assert!(sent[0].1.contains("raised"));

    // Ledger and queue are settled.
    assert_eq!(warning::history(db.pool(), 701).await.unwrap().len(), 2);
    assert!(pending::drain(db.pool()).await.unwrap().is_empty());
}

#[tokio::test]
async fn crashed_run_is_retried_next_cycle() {
    // Delivery is at-least-once: an undelivered region survives a run
    // that never reached it and is picked up by the next one.
    let db = test_db().await;
    let feed = ScriptedFeed::new(vec![district(701, "Innsbruck-Land")]);
    feed.publish("2020-10-01T14:00:00+02:00", 40, &[(701, 2)]);
    feed.publish("2020-10-08T14:00:00+02:00", 41, &[(701, 4)]);

    let ingester = Ingester::new(db.clone(), feed);
    ingester.run_once().await.unwrap();

    subscriber::ensure_subscriber(db.pool(), "chat-1", "Alice")
        .await
        .unwrap();
    subscription::subscribe(db.pool(), "chat-1", 701).await.unwrap();

    // Simulated crash: nothing was marked delivered, so the same region
    // drains again.
    assert_eq!(pending::drain(db.pool()).await.unwrap(), vec![701]);
    assert_eq!(pending::drain(db.pool()).await.unwrap(), vec![701]);

    let dispatcher = Dispatcher::with_defaults(db.clone(), RecordingNotifier::default());
    let report = dispatcher.run_once().await.unwrap();
    assert_eq!(report.regions_notified, 1);
    assert!(pending::drain(db.pool()).await.unwrap().is_empty());
}
