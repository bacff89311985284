//! Scheduled notification fan-out for the ampel alert tracker.
//!
//! On each scheduled run the dispatcher drains the pending-update queue,
//! computes the before/after transition for each region from the warning
//! ledger, resolves interested subscribers and delivers one shared
//! message per region through a [`Notifier`]. Per-recipient failures are
//! logged and swallowed; the region is marked delivered either way, so a
//! single unreachable subscriber can never re-trigger mass
//! re-notification.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use database::Database;
//! use dispatcher::{Dispatcher, LoggingNotifier};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::connect("sqlite:ampel.db?mode=rwc").await?;
//! db.migrate().await?;
//!
//! let dispatcher = Dispatcher::with_defaults(db, LoggingNotifier);
//! let shutdown = async {
//!     tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//! };
//! dispatcher
//!     .run_with_shutdown(Duration::from_secs(86_400), shutdown)
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod dispatcher;
pub mod error;
pub mod notifier;
pub mod presentation;

pub use dispatcher::{DispatchReport, Dispatcher, DispatcherConfig};
pub use error::DispatchError;
pub use notifier::{LoggingNotifier, NoOpNotifier, Notifier, NotifyError};
pub use presentation::{level_style, LevelStyle};

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
