//! Shared dependencies for scan jobs

use crate::services::market_data::MarketDataProvider;
use crate::services::notifier::Notifier;
use crate::signals::cooldown::CooldownGate;
use crate::signals::engine::SignalEngine;
use std::sync::Arc;
use std::time::Duration;

/// Context handed to every scan job.
///
/// The cooldown gate is the only mutable state and is shared by all jobs;
/// everything else is read-only.
pub struct ScanContext {
    pub data_provider: Arc<dyn MarketDataProvider>,
    pub notifier: Arc<dyn Notifier>,
    pub engine: SignalEngine,
    pub gate: CooldownGate,
    pub candle_limit: usize,
    pub fetch_timeout: Duration,
    pub delivery_timeout: Duration,
}

impl ScanContext {
    pub fn new(
        data_provider: Arc<dyn MarketDataProvider>,
        notifier: Arc<dyn Notifier>,
        engine: SignalEngine,
        gate: CooldownGate,
    ) -> Self {
        let candle_limit = engine.params().min_candles().max(100);
        Self {
            data_provider,
            notifier,
            engine,
            gate,
            candle_limit,
            fetch_timeout: Duration::from_secs(30),
            delivery_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_candle_limit(mut self, candle_limit: usize) -> Self {
        self.candle_limit = candle_limit;
        self
    }

    pub fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    pub fn with_delivery_timeout(mut self, delivery_timeout: Duration) -> Self {
        self.delivery_timeout = delivery_timeout;
        self
    }
}
