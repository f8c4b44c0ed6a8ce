//! Candlewatch: RSI + dual EMA + reversal-candle signal scanner.
//!
//! The scan loop pulls candle series from a market data provider, evaluates
//! the three-factor rule, filters repeats through a cooldown gate and hands
//! accepted signals to a notifier.

pub mod config;
pub mod core;
pub mod error;
pub mod indicators;
pub mod jobs;
pub mod logging;
pub mod models;
pub mod services;
pub mod signals;

pub use error::{ConfigError, SignalError};
