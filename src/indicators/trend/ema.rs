//! EMA (Exponential Moving Average) indicator

/// EMA column over a close series
///
/// Uses alpha = 2 / (period + 1) in the bias-corrected form, so each value is
/// a weighted mean of all closes seen so far and index 0 equals the first
/// close.
pub fn ema_series(closes: &[f64], period: usize) -> Vec<f64> {
    let alpha = 2.0 / (period as f64 + 1.0);
    let decay = 1.0 - alpha;

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    closes
        .iter()
        .map(|&close| {
            numerator = close + decay * numerator;
            denominator = 1.0 + decay * denominator;
            numerator / denominator
        })
        .collect()
}
