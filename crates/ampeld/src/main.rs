use std::env;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};

use database::Database;
use dispatcher::{Dispatcher, DispatcherConfig, LoggingNotifier};
use ingester::Ingester;
use region_feed::{FeedConfig, HttpRegionFeed};

#[derive(Debug, Parser)]
#[command(name = "ampeld")]
#[command(about = "Track per-region alert levels and notify subscribers on changes")]
struct Args {
    /// SQLite database URL. Falls back to AMPEL_DATABASE_URL env.
    #[arg(long)]
    database_url: Option<String>,

    /// Region list document URL. Falls back to AMPEL_REGIONS_URL env.
    #[arg(long)]
    regions_url: Option<String>,

    /// Warning levels document URL. Falls back to AMPEL_WARNINGS_URL env.
    #[arg(long)]
    warnings_url: Option<String>,

    /// Seconds between ingestion cycles
    #[arg(long, default_value_t = 3600)]
    ingest_interval_secs: u64,

    /// Seconds between dispatch runs
    #[arg(long, default_value_t = 86_400)]
    dispatch_interval_secs: u64,

    /// Per-notification send timeout in seconds
    #[arg(long, default_value_t = 10)]
    send_timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let database_url = args
        .database_url
        .or_else(|| env::var("AMPEL_DATABASE_URL").ok())
        .unwrap_or_else(|| "sqlite:ampel.db?mode=rwc".to_string());

    let db = Database::connect(&database_url).await?;
    db.migrate().await?;

    let mut feed_config = FeedConfig::default();
    if let Some(url) = args.regions_url.or_else(|| env::var("AMPEL_REGIONS_URL").ok()) {
        feed_config.regions_url = url;
    }
    if let Some(url) = args.warnings_url.or_else(|| env::var("AMPEL_WARNINGS_URL").ok()) {
        feed_config.warnings_url = url;
    }
    let feed = HttpRegionFeed::new(feed_config)?;

    let ingester = Ingester::new(db.clone(), feed);
    let dispatcher = Dispatcher::new(
        db.clone(),
        LoggingNotifier,
        DispatcherConfig {
            send_timeout: Duration::from_secs(args.send_timeout_secs),
            ..Default::default()
        },
    );

    // One ctrl-c fans out to both loops.
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
        }
        let _ = shutdown_tx.send(true);
    });

    let ingest_shutdown = {
        let mut rx = shutdown_rx.clone();
        async move {
            let _ = rx.changed().await;
        }
    };
    let dispatch_shutdown = {
        let mut rx = shutdown_rx;
        async move {
            let _ = rx.changed().await;
        }
    };

    info!(
        ingest_interval_secs = args.ingest_interval_secs,
        dispatch_interval_secs = args.dispatch_interval_secs,
        "Starting ampeld"
    );

    let (ingest_result, dispatch_result) = tokio::join!(
        ingester.run_with_shutdown(
            Duration::from_secs(args.ingest_interval_secs),
            ingest_shutdown,
        ),
        dispatcher.run_with_shutdown(
            Duration::from_secs(args.dispatch_interval_secs),
            dispatch_shutdown,
        ),
    );
    ingest_result?;
    dispatch_result?;

    info!("Stopped, closing database connection");
    db.close().await;

    Ok(())
}
