use crate::models::indicators::{Candle, IndicatorColumns, Series};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalDirection {
    Buy,
    Sell,
}

impl fmt::Display for SignalDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalDirection::Buy => write!(f, "BUY"),
            SignalDirection::Sell => write!(f, "SELL"),
        }
    }
}

/// Trailing window of the source series, kept for chart rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesTail {
    pub candles: Vec<Candle>,
    pub ema_fast: Vec<f64>,
    pub ema_slow: Vec<f64>,
}

impl SeriesTail {
    pub fn from_series(series: &Series, columns: &IndicatorColumns, len: usize) -> Self {
        let start = series.len().saturating_sub(len);
        Self {
            candles: series.candles()[start..].to_vec(),
            ema_fast: columns.ema_fast.get(start..).unwrap_or_default().to_vec(),
            ema_slow: columns.ema_slow.get(start..).unwrap_or_default().to_vec(),
        }
    }
}

/// A directional signal produced by the evaluator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub instrument: String,
    pub timeframe: String,
    pub direction: SignalDirection,
    pub rsi: f64,
    pub ema_fast: f64,
    pub ema_slow: f64,
    pub price: f64,
    pub timestamp: DateTime<Utc>,
    pub tail: SeriesTail,
}
