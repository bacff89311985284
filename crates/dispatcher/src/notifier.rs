//! Notifier trait and implementations.

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when delivering one notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The send itself failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// The recipient is unknown to the transport.
    #[error("unknown recipient: {0}")]
    UnknownRecipient(String),
}

/// Capability to deliver a text message to a subscriber identity.
///
/// Fire-and-forget from the dispatcher's perspective: a failure is
/// logged, never retried within the same run, and never blocks delivery
/// to other subscribers. Abstracted to support different transports
/// (chat bot, tests, etc.)
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send a text message to a subscriber.
    async fn send(&self, subscriber_id: &str, text: &str) -> Result<(), NotifyError>;
}

/// A no-op notifier for testing that discards all messages.
#[derive(Debug, Clone, Default)]
pub struct NoOpNotifier;

#[async_trait]
impl Notifier for NoOpNotifier {
    async fn send(&self, _subscriber_id: &str, _text: &str) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// A logging notifier for debugging that logs all deliveries.
#[derive(Debug, Clone, Default)]
pub struct LoggingNotifier;

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn send(&self, subscriber_id: &str, text: &str) -> Result<(), NotifyError> {
        tracing::info!(subscriber = %subscriber_id, "Sending notification: {}", text);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_notifier() {
        let notifier = NoOpNotifier;
        notifier.send("chat-1", "test").await.unwrap();
    }

    #[tokio::test]
    async fn test_logging_notifier() {
        let notifier = LoggingNotifier;
        notifier.send("chat-1", "test").await.unwrap();
    }
}
