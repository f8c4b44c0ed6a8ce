//! Market data provider interface.

use crate::error::SignalError;
use crate::models::indicators::Series;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Fetch the most recent `limit` candles for an instrument/timeframe pair.
    ///
    /// Any failure is reported as `SignalError::DataUnavailable`.
    async fn fetch_series(
        &self,
        instrument: &str,
        timeframe: &str,
        limit: usize,
    ) -> Result<Series, SignalError>;
}

/// Provider serving preloaded series, keyed by (instrument, timeframe)
#[derive(Default)]
pub struct InMemoryMarketDataProvider {
    series: RwLock<HashMap<(String, String), Series>>,
}

impl InMemoryMarketDataProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the series served for its (instrument, timeframe) pair
    pub fn insert(&self, series: Series) {
        let key = (series.instrument.clone(), series.timeframe.clone());
        let mut map = self.series.write().unwrap_or_else(|p| p.into_inner());
        map.insert(key, series);
    }
}

#[async_trait]
impl MarketDataProvider for InMemoryMarketDataProvider {
    async fn fetch_series(
        &self,
        instrument: &str,
        timeframe: &str,
        limit: usize,
    ) -> Result<Series, SignalError> {
        let map = self.series.read().unwrap_or_else(|p| p.into_inner());
        let series = map
            .get(&(instrument.to_string(), timeframe.to_string()))
            .ok_or_else(|| SignalError::unavailable(instrument, timeframe, "no series loaded"))?;

        let start = series.len().saturating_sub(limit);
        Series::new(instrument, timeframe, series.candles()[start..].to_vec())
            .map_err(|e| SignalError::unavailable(instrument, timeframe, e.to_string()))
    }
}
