use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One OHLCV sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub timestamp: DateTime<Utc>,
}

impl Candle {
    pub fn new(
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            open,
            high,
            low,
            close,
            volume,
            timestamp,
        }
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }
}

/// Ordered candles for one (instrument, timeframe) pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub instrument: String,
    pub timeframe: String,
    candles: Vec<Candle>,
}

/// Raised when candles are not in strictly increasing timestamp order
#[derive(Debug, Clone, PartialEq, Error)]
#[error("candle {index} is not newer than its predecessor")]
pub struct UnorderedCandles {
    pub index: usize,
}

impl Series {
    pub fn new(
        instrument: impl Into<String>,
        timeframe: impl Into<String>,
        candles: Vec<Candle>,
    ) -> Result<Self, UnorderedCandles> {
        if let Some(index) = candles
            .windows(2)
            .position(|w| w[1].timestamp <= w[0].timestamp)
        {
            return Err(UnorderedCandles { index: index + 1 });
        }
        Ok(Self {
            instrument: instrument.into(),
            timeframe: timeframe.into(),
            candles,
        })
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }
}

/// Indicator columns aligned index-for-index with a series
///
/// RSI entries inside the warm-up window are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorColumns {
    pub rsi: Vec<Option<f64>>,
    pub ema_fast: Vec<f64>,
    pub ema_slow: Vec<f64>,
}

impl IndicatorColumns {
    pub fn len(&self) -> usize {
        self.rsi.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rsi.is_empty()
    }

    /// True when every column has exactly `len` entries
    pub fn is_aligned_with(&self, len: usize) -> bool {
        self.rsi.len() == len && self.ema_fast.len() == len && self.ema_slow.len() == len
    }

    /// Values at the last index, if all are defined
    pub fn latest(&self) -> Option<IndicatorSnapshot> {
        let rsi = (*self.rsi.last()?)?;
        Some(IndicatorSnapshot {
            rsi,
            ema_fast: *self.ema_fast.last()?,
            ema_slow: *self.ema_slow.last()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub rsi: f64,
    pub ema_fast: f64,
    pub ema_slow: f64,
}
