//! Notification delivery interface

use crate::error::SignalError;
use crate::models::signal::Signal;
use crate::services::message::MessageFormatter;
use async_trait::async_trait;
use tracing::info;

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one accepted signal. Called once per acceptance, never retried
    /// within the same cycle.
    async fn deliver(&self, signal: &Signal) -> Result<(), SignalError>;

    /// Free-form lifecycle message (start-up announcement)
    async fn announce(&self, _text: &str) -> Result<(), SignalError> {
        Ok(())
    }
}

/// Notifier that only writes the formatted message to the log
pub struct LogNotifier {
    formatter: MessageFormatter,
}

impl LogNotifier {
    pub fn new(formatter: MessageFormatter) -> Self {
        Self { formatter }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn deliver(&self, signal: &Signal) -> Result<(), SignalError> {
        info!(
            symbol = %signal.instrument,
            timeframe = %signal.timeframe,
            direction = %signal.direction,
            price = signal.price,
            "LogNotifier: {}",
            self.formatter.format(signal)
        );
        Ok(())
    }

    async fn announce(&self, text: &str) -> Result<(), SignalError> {
        info!("LogNotifier: {}", text);
        Ok(())
    }
}
