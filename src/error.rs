//! Error types shared across the scanner

use thiserror::Error;

/// Errors raised while scanning a single (instrument, timeframe) pair.
///
/// None of these are fatal: the scan loop logs them and moves on to the
/// next pair.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SignalError {
    #[error("market data unavailable for {instrument} {timeframe}: {reason}")]
    DataUnavailable {
        instrument: String,
        timeframe: String,
        reason: String,
    },

    #[error("insufficient history: need {required} candles, got {actual}")]
    InsufficientHistory { required: usize, actual: usize },

    #[error("notification failed: {0}")]
    NotificationFailure(String),

    #[error("scan task failed: {0}")]
    TransientCycleFailure(String),
}

impl SignalError {
    pub fn unavailable(
        instrument: impl Into<String>,
        timeframe: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::DataUnavailable {
            instrument: instrument.into(),
            timeframe: timeframe.into(),
            reason: reason.into(),
        }
    }
}

/// Startup configuration errors. These abort the process.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}' ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("inconsistent configuration: {0}")]
    Inconsistent(String),
}
