pub mod momentum;
pub mod structure;
pub mod trend;

use crate::config::IndicatorParams;
use crate::models::indicators::{IndicatorColumns, Series};

pub use momentum::rsi_series;
pub use structure::{detect_reversal, Reversal};
pub use trend::ema_series;

/// Compute RSI, fast EMA and slow EMA over the whole series
pub fn compute_columns(series: &Series, params: &IndicatorParams) -> IndicatorColumns {
    let closes = series.closes();
    IndicatorColumns {
        rsi: rsi_series(&closes, params.rsi_period),
        ema_fast: ema_series(&closes, params.ema_fast),
        ema_slow: ema_series(&closes, params.ema_slow),
    }
}
