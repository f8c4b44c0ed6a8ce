//! Binance spot klines provider

use crate::error::SignalError;
use crate::models::indicators::{Candle, Series};
use crate::services::market_data::MarketDataProvider;
use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use chrono::DateTime;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.binance.com";

pub struct BinanceMarketDataProvider {
    client: reqwest::Client,
    base_url: String,
    max_retries: usize,
    retry_delay: Duration,
}

impl BinanceMarketDataProvider {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(base_url, client))
    }

    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_retries: 2,
            retry_delay: Duration::from_millis(500),
        }
    }

    pub fn with_retries(mut self, max_retries: usize, retry_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = retry_delay;
        self
    }

    async fn request_klines(
        &self,
        instrument: &str,
        timeframe: &str,
        limit: usize,
    ) -> Result<Vec<Vec<Value>>, reqwest::Error> {
        let limit = limit.to_string();
        self.client
            .get(format!("{}/api/v3/klines", self.base_url))
            .query(&[
                ("symbol", instrument),
                ("interval", timeframe),
                ("limit", limit.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }
}

/// Timeouts, connection failures, 5xx and 429 are worth another attempt
pub(crate) fn is_transient(error: &reqwest::Error) -> bool {
    if error.is_timeout() || error.is_connect() {
        return true;
    }
    error
        .status()
        .map(|s| s.is_server_error() || s == StatusCode::TOO_MANY_REQUESTS)
        .unwrap_or(false)
}

/// Parse one kline row: `[open_time_ms, "open", "high", "low", "close", "volume", ...]`
pub fn parse_kline(row: &[Value]) -> Option<Candle> {
    let open_time = row.first()?.as_i64()?;
    let field = |i: usize| -> Option<f64> {
        match row.get(i)? {
            Value::String(s) => s.parse().ok(),
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    };

    Some(Candle::new(
        field(1)?,
        field(2)?,
        field(3)?,
        field(4)?,
        field(5)?,
        DateTime::from_timestamp_millis(open_time)?,
    ))
}

#[async_trait]
impl MarketDataProvider for BinanceMarketDataProvider {
    async fn fetch_series(
        &self,
        instrument: &str,
        timeframe: &str,
        limit: usize,
    ) -> Result<Series, SignalError> {
        let backoff = ExponentialBuilder::default()
            .with_min_delay(self.retry_delay)
            .with_max_times(self.max_retries);

        let rows = (move || async move { self.request_klines(instrument, timeframe, limit).await })
            .retry(backoff)
            .when(is_transient)
            .notify(|e: &reqwest::Error, delay: Duration| {
                warn!(
                    symbol = %instrument,
                    timeframe = %timeframe,
                    error = %e,
                    "Binance: klines request failed, retrying in {:?}",
                    delay
                );
            })
            .await
            .map_err(|e| SignalError::unavailable(instrument, timeframe, e.to_string()))?;

        let candles = rows
            .iter()
            .map(|row| parse_kline(row))
            .collect::<Option<Vec<Candle>>>()
            .ok_or_else(|| SignalError::unavailable(instrument, timeframe, "malformed kline row"))?;

        if candles.is_empty() {
            return Err(SignalError::unavailable(instrument, timeframe, "empty kline response"));
        }

        debug!(
            symbol = %instrument,
            timeframe = %timeframe,
            count = candles.len(),
            "Binance: fetched {} candles for {} {}",
            candles.len(),
            instrument,
            timeframe
        );

        Series::new(instrument, timeframe, candles)
            .map_err(|e| SignalError::unavailable(instrument, timeframe, e.to_string()))
    }
}
