//! RSI (Relative Strength Index) indicator

/// RSI column over a close series
///
/// RSI = 100 - (100 / (1 + RS))
/// RS = Average Gain / Average Loss
///
/// Averages are simple means over the trailing `period` price changes, so the
/// first `period` entries are `None`. A window without losses saturates to 100.
pub fn rsi_series(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; closes.len()];
    if period == 0 || closes.len() <= period {
        return out;
    }

    let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();

    // deltas[j] is the change into closes[j + 1]
    for (i, slot) in out.iter_mut().enumerate().skip(period) {
        let window = &deltas[i - period..i];
        let avg_gain = window.iter().map(|d| d.max(0.0)).sum::<f64>() / period as f64;
        let avg_loss = window.iter().map(|d| (-d).max(0.0)).sum::<f64>() / period as f64;
        *slot = Some(rsi_from_averages(avg_gain, avg_loss));
    }
    out
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    (100.0 - (100.0 / (1.0 + rs))).clamp(0.0, 100.0)
}
