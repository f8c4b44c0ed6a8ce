//! Runtime configuration loaded from environment variables
//!
//! Read once at startup (after `dotenvy` has populated the process
//! environment) and shared read-only afterwards.

use crate::error::ConfigError;
use crate::services::binance;
use crate::services::yahoo;
use chrono::Duration as ChronoDuration;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Indicator and threshold parameters used by the signal evaluator
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorParams {
    pub rsi_period: usize,
    pub ema_fast: usize,
    pub ema_slow: usize,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            ema_fast: 9,
            ema_slow: 21,
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
        }
    }
}

impl IndicatorParams {
    /// Minimum number of candles the evaluator needs before it will act
    pub fn min_candles(&self) -> usize {
        self.rsi_period + 5
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rsi_period == 0 || self.ema_fast == 0 || self.ema_slow == 0 {
            return Err(ConfigError::Inconsistent(
                "indicator periods must be greater than zero".to_string(),
            ));
        }
        if self.ema_fast >= self.ema_slow {
            return Err(ConfigError::Inconsistent(format!(
                "EMA_FAST ({}) must be lower than EMA_SLOW ({})",
                self.ema_fast, self.ema_slow
            )));
        }
        if !(0.0..=100.0).contains(&self.rsi_oversold)
            || !(0.0..=100.0).contains(&self.rsi_overbought)
            || self.rsi_oversold >= self.rsi_overbought
        {
            return Err(ConfigError::Inconsistent(format!(
                "RSI thresholds must satisfy 0 <= oversold ({}) < overbought ({}) <= 100",
                self.rsi_oversold, self.rsi_overbought
            )));
        }
        Ok(())
    }
}

/// Telegram delivery settings; delivery is disabled unless both are set
#[derive(Debug, Clone, PartialEq)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
    pub base_url: String,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub environment: String,
    pub symbols: Vec<String>,
    /// Equity tickers served by the stock provider instead of Binance
    pub stock_symbols: Vec<String>,
    pub timeframes: Vec<String>,
    pub indicators: IndicatorParams,
    pub check_interval: Duration,
    pub cooldown: ChronoDuration,
    pub candle_limit: usize,
    pub fetch_timeout: Duration,
    pub delivery_timeout: Duration,
    pub max_backoff: Duration,
    pub signal_expiry: ChronoDuration,
    pub chart_candles: usize,
    pub binance_base_url: String,
    pub yahoo_base_url: String,
    pub telegram: Option<TelegramConfig>,
    pub broker_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "sandbox".to_string(),
            symbols: vec!["BTCUSDT".to_string(), "ETHUSDT".to_string()],
            stock_symbols: Vec::new(),
            timeframes: vec!["5m".to_string()],
            indicators: IndicatorParams::default(),
            check_interval: Duration::from_secs(60),
            cooldown: ChronoDuration::minutes(5),
            candle_limit: 100,
            fetch_timeout: Duration::from_secs(30),
            delivery_timeout: Duration::from_secs(10),
            max_backoff: Duration::from_secs(300),
            signal_expiry: ChronoDuration::minutes(1),
            chart_candles: 50,
            binance_base_url: binance::DEFAULT_BASE_URL.to_string(),
            yahoo_base_url: yahoo::DEFAULT_BASE_URL.to_string(),
            telegram: None,
            broker_url: "https://www.homebroker.com/pt/invest".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup, falling back to
    /// defaults for unset keys
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let indicators = IndicatorParams {
            rsi_period: parse_or(&get, "RSI_PERIOD", defaults.indicators.rsi_period)?,
            ema_fast: parse_or(&get, "EMA_FAST", defaults.indicators.ema_fast)?,
            ema_slow: parse_or(&get, "EMA_SLOW", defaults.indicators.ema_slow)?,
            rsi_oversold: parse_or(&get, "RSI_OVERSOLD", defaults.indicators.rsi_oversold)?,
            rsi_overbought: parse_or(&get, "RSI_OVERBOUGHT", defaults.indicators.rsi_overbought)?,
        };
        indicators.validate()?;

        let check_interval_secs: u64 =
            parse_or(&get, "CHECK_INTERVAL_SECONDS", defaults.check_interval.as_secs())?;
        if check_interval_secs == 0 {
            return Err(invalid("CHECK_INTERVAL_SECONDS", "0", "must be greater than zero"));
        }

        let cooldown_minutes: i64 =
            parse_or(&get, "COOLDOWN_MINUTES", defaults.cooldown.num_minutes())?;
        if cooldown_minutes < 0 {
            return Err(invalid(
                "COOLDOWN_MINUTES",
                &cooldown_minutes.to_string(),
                "must not be negative",
            ));
        }

        let candle_limit: usize = parse_or(&get, "CANDLE_LIMIT", defaults.candle_limit)?;
        if candle_limit < indicators.min_candles() {
            return Err(ConfigError::Inconsistent(format!(
                "CANDLE_LIMIT ({}) must be at least RSI_PERIOD + 5 ({})",
                candle_limit,
                indicators.min_candles()
            )));
        }

        let fetch_timeout_secs: u64 =
            parse_or(&get, "FETCH_TIMEOUT_SECONDS", defaults.fetch_timeout.as_secs())?;
        if fetch_timeout_secs == 0 {
            return Err(invalid("FETCH_TIMEOUT_SECONDS", "0", "must be greater than zero"));
        }
        let delivery_timeout_secs: u64 = parse_or(
            &get,
            "DELIVERY_TIMEOUT_SECONDS",
            defaults.delivery_timeout.as_secs(),
        )?;
        if delivery_timeout_secs == 0 {
            return Err(invalid("DELIVERY_TIMEOUT_SECONDS", "0", "must be greater than zero"));
        }
        let max_backoff_secs: u64 =
            parse_or(&get, "MAX_BACKOFF_SECONDS", defaults.max_backoff.as_secs())?;
        if max_backoff_secs < check_interval_secs {
            return Err(ConfigError::Inconsistent(format!(
                "MAX_BACKOFF_SECONDS ({}) must be at least CHECK_INTERVAL_SECONDS ({})",
                max_backoff_secs, check_interval_secs
            )));
        }

        let expiry_minutes: i64 =
            parse_or(&get, "SIGNAL_EXPIRY_MINUTES", defaults.signal_expiry.num_minutes())?;
        if expiry_minutes < 0 {
            return Err(invalid(
                "SIGNAL_EXPIRY_MINUTES",
                &expiry_minutes.to_string(),
                "must not be negative",
            ));
        }
        let chart_candles: usize = parse_or(&get, "CHART_CANDLES", defaults.chart_candles)?;
        if chart_candles == 0 {
            return Err(invalid("CHART_CANDLES", "0", "must be greater than zero"));
        }

        let symbols = match lookup("SYMBOLS") {
            Some(raw) => split_list(&raw),
            None => defaults.symbols,
        };
        let stock_symbols = get("SYMBOLS_STOCKS")
            .map(|s| split_list(&s))
            .unwrap_or(defaults.stock_symbols);
        if symbols.is_empty() && stock_symbols.is_empty() {
            return Err(invalid(
                "SYMBOLS",
                "",
                "at least one crypto or stock symbol is required",
            ));
        }
        if let Some(shared) = stock_symbols.iter().find(|s| symbols.contains(s)) {
            return Err(ConfigError::Inconsistent(format!(
                "{} is listed in both SYMBOLS and SYMBOLS_STOCKS",
                shared
            )));
        }
        let timeframes = get("TIMEFRAMES")
            .map(|s| split_list(&s))
            .unwrap_or(defaults.timeframes);
        if timeframes.is_empty() {
            return Err(invalid("TIMEFRAMES", "", "at least one timeframe is required"));
        }

        let telegram = match (get("TELEGRAM_BOT_TOKEN"), get("TELEGRAM_CHAT_ID")) {
            (Some(bot_token), Some(chat_id)) => Some(TelegramConfig {
                bot_token,
                chat_id,
                base_url: get("TELEGRAM_BASE_URL")
                    .unwrap_or_else(|| "https://api.telegram.org".to_string()),
                request_timeout: Duration::from_secs(delivery_timeout_secs),
            }),
            _ => None,
        };

        Ok(Self {
            environment: get("ENVIRONMENT").unwrap_or(defaults.environment),
            symbols,
            stock_symbols,
            timeframes,
            indicators,
            check_interval: Duration::from_secs(check_interval_secs),
            cooldown: ChronoDuration::minutes(cooldown_minutes),
            candle_limit,
            fetch_timeout: Duration::from_secs(fetch_timeout_secs),
            delivery_timeout: Duration::from_secs(delivery_timeout_secs),
            max_backoff: Duration::from_secs(max_backoff_secs),
            signal_expiry: ChronoDuration::minutes(expiry_minutes),
            chart_candles,
            binance_base_url: get("BINANCE_BASE_URL").unwrap_or(defaults.binance_base_url),
            yahoo_base_url: get("YAHOO_BASE_URL").unwrap_or(defaults.yahoo_base_url),
            telegram,
            broker_url: get("BROKER_URL").unwrap_or(defaults.broker_url),
        })
    }

    /// Crypto symbols followed by stock symbols
    pub fn instruments(&self) -> Vec<String> {
        self.symbols
            .iter()
            .chain(self.stock_symbols.iter())
            .cloned()
            .collect()
    }

    /// Every tracked (instrument, timeframe) combination, timeframe-major
    pub fn pairs(&self) -> Vec<(String, String)> {
        let instruments = self.instruments();
        self.timeframes
            .iter()
            .flat_map(|tf| instruments.iter().map(move |s| (s.clone(), tf.clone())))
            .collect()
    }
}

/// Deployment environment, used to pick the log format
pub fn get_environment() -> String {
    env::var("ENVIRONMENT").unwrap_or_else(|_| "sandbox".to_string())
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| invalid(key, &raw, &e.to_string())),
        None => Ok(default),
    }
}

fn invalid(key: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
