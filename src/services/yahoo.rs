//! Yahoo Finance chart provider for equity tickers

use crate::error::SignalError;
use crate::models::indicators::{Candle, Series};
use crate::services::binance::is_transient;
use crate::services::market_data::MarketDataProvider;
use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use chrono::DateTime;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<f64>>,
}

pub struct YahooMarketDataProvider {
    client: reqwest::Client,
    base_url: String,
    max_retries: usize,
    retry_delay: Duration,
}

impl YahooMarketDataProvider {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
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

    async fn request_chart(&self, symbol: &str, timeframe: &str) -> Result<String, reqwest::Error> {
        self.client
            .get(format!("{}/v8/finance/chart/{}", self.base_url, symbol))
            .query(&[("interval", timeframe), ("range", range_for(timeframe))])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }
}

/// Widest lookback Yahoo serves for an intraday interval
pub fn range_for(timeframe: &str) -> &'static str {
    match timeframe {
        "1m" => "5d",
        "2m" | "5m" | "15m" | "30m" => "1mo",
        "60m" | "90m" | "1h" => "3mo",
        "1d" => "1y",
        _ => "5y",
    }
}

/// Parse a chart payload into ordered candles.
///
/// Rows with any missing field are skipped, as are rows that do not advance
/// the timestamp.
pub fn parse_chart(body: &str) -> Result<Vec<Candle>, String> {
    let response: ChartResponse = serde_json::from_str(body).map_err(|e| e.to_string())?;

    if let Some(error) = response.chart.error {
        return Err(format!("{}: {}", error.code, error.description));
    }

    let data = response
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| "no chart result".to_string())?;
    let quote = data
        .indicators
        .quote
        .first()
        .ok_or_else(|| "no quote data".to_string())?;

    let mut candles: Vec<Candle> = Vec::with_capacity(data.timestamp.len());
    for (i, &ts) in data.timestamp.iter().enumerate() {
        let (Some(open), Some(high), Some(low), Some(close)) = (
            value_at(&quote.open, i),
            value_at(&quote.high, i),
            value_at(&quote.low, i),
            value_at(&quote.close, i),
        ) else {
            continue;
        };
        let Some(timestamp) = DateTime::from_timestamp(ts, 0) else {
            continue;
        };
        if candles.last().is_some_and(|c| c.timestamp >= timestamp) {
            continue;
        }
        let volume = value_at(&quote.volume, i).unwrap_or(0.0);
        candles.push(Candle::new(open, high, low, close, volume, timestamp));
    }
    Ok(candles)
}

fn value_at(column: &[Option<f64>], i: usize) -> Option<f64> {
    column.get(i).copied().flatten()
}

#[async_trait]
impl MarketDataProvider for YahooMarketDataProvider {
    async fn fetch_series(
        &self,
        instrument: &str,
        timeframe: &str,
        limit: usize,
    ) -> Result<Series, SignalError> {
        let backoff = ExponentialBuilder::default()
            .with_min_delay(self.retry_delay)
            .with_max_times(self.max_retries);

        let body = (move || async move { self.request_chart(instrument, timeframe).await })
            .retry(backoff)
            .when(is_transient)
            .notify(|e: &reqwest::Error, delay: Duration| {
                warn!(
                    symbol = %instrument,
                    timeframe = %timeframe,
                    error = %e,
                    "Yahoo: chart request failed, retrying in {:?}",
                    delay
                );
            })
            .await
            .map_err(|e| SignalError::unavailable(instrument, timeframe, e.to_string()))?;

        let mut candles = parse_chart(&body)
            .map_err(|reason| SignalError::unavailable(instrument, timeframe, reason))?;
        if candles.is_empty() {
            return Err(SignalError::unavailable(instrument, timeframe, "empty chart response"));
        }
        let start = candles.len().saturating_sub(limit);
        candles.drain(..start);

        debug!(
            symbol = %instrument,
            timeframe = %timeframe,
            count = candles.len(),
            "Yahoo: fetched {} candles for {} {}",
            candles.len(),
            instrument,
            timeframe
        );

        Series::new(instrument, timeframe, candles)
            .map_err(|e| SignalError::unavailable(instrument, timeframe, e.to_string()))
    }
}
