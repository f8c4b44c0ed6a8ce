//! Signal evaluation engine: RSI extreme + EMA slope + reversal candle.

use crate::config::IndicatorParams;
use crate::error::SignalError;
use crate::indicators::{compute_columns, detect_reversal, Reversal};
use crate::models::indicators::{IndicatorColumns, Series};
use crate::models::signal::{SeriesTail, Signal, SignalDirection};
use chrono::{DateTime, Utc};

/// Candles kept in a signal's tail unless configured otherwise
pub const DEFAULT_TAIL_CANDLES: usize = 50;

pub struct SignalEngine {
    params: IndicatorParams,
    tail_candles: usize,
}

impl SignalEngine {
    pub fn new(params: IndicatorParams) -> Self {
        Self {
            params,
            tail_candles: DEFAULT_TAIL_CANDLES,
        }
    }

    pub fn with_tail_candles(mut self, tail_candles: usize) -> Self {
        self.tail_candles = tail_candles;
        self
    }

    pub fn params(&self) -> &IndicatorParams {
        &self.params
    }

    /// Fails with `InsufficientHistory` when the series is too short to act on
    pub fn check_history(&self, series: &Series) -> Result<(), SignalError> {
        let required = self.params.min_candles();
        if series.len() < required {
            return Err(SignalError::InsufficientHistory {
                required,
                actual: series.len(),
            });
        }
        Ok(())
    }

    /// Evaluate the latest candle of `series`, stamping the signal with the
    /// current time
    pub fn evaluate(&self, series: &Series) -> Option<Signal> {
        self.evaluate_at(series, Utc::now())
    }

    pub fn evaluate_at(&self, series: &Series, now: DateTime<Utc>) -> Option<Signal> {
        self.check_history(series).ok()?;
        let columns = compute_columns(series, &self.params);
        self.decide(series, &columns, now)
    }

    /// Apply the decision rule to precomputed indicator columns.
    ///
    /// BUY needs RSI below oversold, fast EMA above slow EMA and a bullish
    /// reversal on the last candle; SELL is the mirror. Anything else, an
    /// undefined RSI, or misaligned columns yields no signal.
    pub fn decide(
        &self,
        series: &Series,
        columns: &IndicatorColumns,
        now: DateTime<Utc>,
    ) -> Option<Signal> {
        if series.is_empty() || !columns.is_aligned_with(series.len()) {
            return None;
        }

        let latest = columns.latest()?;
        let last = series.len() - 1;
        let reversal = detect_reversal(series.candles(), last);

        let direction = if latest.rsi < self.params.rsi_oversold
            && latest.ema_fast > latest.ema_slow
            && reversal == Reversal::Bullish
        {
            SignalDirection::Buy
        } else if latest.rsi > self.params.rsi_overbought
            && latest.ema_fast < latest.ema_slow
            && reversal == Reversal::Bearish
        {
            SignalDirection::Sell
        } else {
            return None;
        };

        let price = series.last()?.close;
        Some(Signal {
            instrument: series.instrument.clone(),
            timeframe: series.timeframe.clone(),
            direction,
            rsi: latest.rsi,
            ema_fast: latest.ema_fast,
            ema_slow: latest.ema_slow,
            price,
            timestamp: now,
            tail: SeriesTail::from_series(series, columns, self.tail_candles),
        })
    }
}
