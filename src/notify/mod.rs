//! Notification sinks.
//!
//! The agent reports everything worth a human's attention through a
//! `Notifier`. Delivery failures come back as [`DeliveryError`] and are
//! only ever logged by the caller.

pub mod telegram;

pub use telegram::TelegramNotifier;

use async_trait::async_trait;
use tracing::info;

use crate::types::DeliveryError;

/// Destination for plain-text notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `text` to the channel `chat_id`.
    async fn send(&self, chat_id: i64, text: &str) -> Result<(), DeliveryError>;

    /// Sink name for logging.
    fn name(&self) -> &str;
}

/// Writes notifications to the log instead of a messaging channel.
///
/// Used when Telegram delivery is switched off.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, chat_id: i64, text: &str) -> Result<(), DeliveryError> {
        info!(chat_id, text, "Notification");
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}
