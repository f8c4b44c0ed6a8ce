//! Four-candle reversal pattern

use crate::models::indicators::Candle;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reversal {
    Bullish,
    Bearish,
    None,
}

/// Number of candles the pattern spans
pub const REVERSAL_WINDOW: usize = 4;

/// Classify the candle at `index` against its three predecessors.
///
/// Bullish: three strictly falling closes, then a green candle closing above
/// the previous close. Bearish is the mirror image.
pub fn detect_reversal(candles: &[Candle], index: usize) -> Reversal {
    if index < REVERSAL_WINDOW - 1 || index >= candles.len() {
        return Reversal::None;
    }

    let current = &candles[index];
    let prev1 = candles[index - 1].close;
    let prev2 = candles[index - 2].close;
    let prev3 = candles[index - 3].close;

    if prev3 > prev2 && prev2 > prev1 && current.is_bullish() && current.close > prev1 {
        return Reversal::Bullish;
    }
    if prev3 < prev2 && prev2 < prev1 && current.is_bearish() && current.close < prev1 {
        return Reversal::Bearish;
    }
    Reversal::None
}
