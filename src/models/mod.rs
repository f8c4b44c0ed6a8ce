//! Shared data models spanning the engine layers.

pub mod indicators;
pub mod signal;

pub use indicators::{Candle, IndicatorColumns, IndicatorSnapshot, Series, UnorderedCandles};
pub use signal::{SeriesTail, Signal, SignalDirection};
