//! Human-readable signal messages

use crate::config::IndicatorParams;
use crate::models::signal::{Signal, SignalDirection};
use chrono::Duration;

#[derive(Debug, Clone)]
pub struct MessageFormatter {
    params: IndicatorParams,
    expiry: Duration,
    broker_url: String,
}

impl MessageFormatter {
    pub fn new(params: IndicatorParams, expiry: Duration, broker_url: impl Into<String>) -> Self {
        Self {
            params,
            expiry,
            broker_url: broker_url.into(),
        }
    }

    pub fn format(&self, signal: &Signal) -> String {
        let entry_time = signal.timestamp.format("%H:%M:%S UTC");
        let expiry_time = (signal.timestamp + self.expiry).format("%H:%M:%S UTC");

        let (emoji, action, rsi_condition, ema_relation) = match signal.direction {
            SignalDirection::Buy => (
                "🟢",
                "BUY",
                format!("RSI {:.1} < {}", signal.rsi, self.params.rsi_oversold),
                "above",
            ),
            SignalDirection::Sell => (
                "🔴",
                "SELL",
                format!("RSI {:.1} > {}", signal.rsi, self.params.rsi_overbought),
                "below",
            ),
        };

        format!(
            "✅ Entry confirmed\n\
             💹 Asset: {instrument}\n\
             ⏰ Entry: {entry_time}\n\
             ⌛ Expiry: {expiry_time}\n\
             ⏳ Timeframe: {timeframe}\n\
             🧠 Analysis: RSI + EMA + reversal candle\n\
             📘 Details: {rsi_condition} + reversal candle + EMA {fast} {ema_relation} EMA {slow}\n\
             {emoji} Signal: {action}\n\
             💰 Price: ${price:.2}\n\
             🔗 {broker}",
            instrument = signal.instrument,
            timeframe = signal.timeframe,
            fast = self.params.ema_fast,
            slow = self.params.ema_slow,
            price = signal.price,
            broker = self.broker_url,
        )
    }

    /// Start-up announcement listing the tracked instruments
    pub fn startup(&self, instruments: &[String]) -> String {
        format!(
            "🤖 Bot started, monitoring: {}",
            instruments.join(", ")
        )
    }
}
