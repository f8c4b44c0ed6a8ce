//! Job handler for the scan workflow
//!
//! fetch series → check history → evaluate → cooldown gate → notify

use crate::error::SignalError;
use crate::jobs::context::ScanContext;
use crate::jobs::types::{ScanJob, ScanOutcome};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Scan one pair using the current wall-clock time
pub async fn handle_scan(job: ScanJob, ctx: Arc<ScanContext>) -> ScanOutcome {
    handle_scan_at(job, ctx, Utc::now()).await
}

/// Scan one pair as of `now`
///
/// Never fails: every error is logged and folded into the outcome so one
/// pair cannot abort the cycle.
pub async fn handle_scan_at(
    job: ScanJob,
    ctx: Arc<ScanContext>,
    now: DateTime<Utc>,
) -> ScanOutcome {
    let fetch = ctx
        .data_provider
        .fetch_series(&job.instrument, &job.timeframe, ctx.candle_limit);

    let series = match tokio::time::timeout(ctx.fetch_timeout, fetch).await {
        Ok(Ok(series)) => series,
        Ok(Err(e)) => {
            warn!(
                symbol = %job.instrument,
                timeframe = %job.timeframe,
                error = %e,
                "ScanJob: no market data for {} {}",
                job.instrument,
                job.timeframe
            );
            return ScanOutcome::Unavailable(e);
        }
        Err(_) => {
            let e = SignalError::unavailable(
                &job.instrument,
                &job.timeframe,
                format!("fetch timed out after {:?}", ctx.fetch_timeout),
            );
            warn!(
                symbol = %job.instrument,
                timeframe = %job.timeframe,
                error = %e,
                "ScanJob: market data fetch timed out for {} {}",
                job.instrument,
                job.timeframe
            );
            return ScanOutcome::Unavailable(e);
        }
    };

    if let Err(e) = ctx.engine.check_history(&series) {
        debug!(
            symbol = %job.instrument,
            timeframe = %job.timeframe,
            error = %e,
            "ScanJob: not enough candles for {} {}",
            job.instrument,
            job.timeframe
        );
        return ScanOutcome::Unavailable(e);
    }

    let Some(signal) = ctx.engine.evaluate_at(&series, now) else {
        debug!(
            symbol = %job.instrument,
            timeframe = %job.timeframe,
            count = series.len(),
            "ScanJob: no signal for {} {}",
            job.instrument,
            job.timeframe
        );
        return ScanOutcome::NoSignal;
    };

    if !ctx.gate.should_accept(&signal, now) {
        debug!(
            symbol = %signal.instrument,
            timeframe = %signal.timeframe,
            direction = %signal.direction,
            "ScanJob: {} {} {} suppressed by cooldown",
            signal.instrument,
            signal.direction,
            signal.timeframe
        );
        return ScanOutcome::Suppressed(signal.direction);
    }

    info!(
        symbol = %signal.instrument,
        timeframe = %signal.timeframe,
        direction = %signal.direction,
        rsi = signal.rsi,
        ema_fast = signal.ema_fast,
        ema_slow = signal.ema_slow,
        price = signal.price,
        "ScanJob: signal accepted for {} - {} at {:.2} (RSI {:.1})",
        signal.instrument,
        signal.direction,
        signal.price,
        signal.rsi
    );

    // The gate has already recorded the acceptance; a failed delivery keeps it.
    let delivery = tokio::time::timeout(ctx.delivery_timeout, ctx.notifier.deliver(&signal))
        .await
        .unwrap_or_else(|_| {
            Err(SignalError::NotificationFailure(format!(
                "delivery timed out after {:?}",
                ctx.delivery_timeout
            )))
        });

    match delivery {
        Ok(()) => ScanOutcome::Delivered(signal.direction),
        Err(e) => {
            error!(
                symbol = %signal.instrument,
                timeframe = %signal.timeframe,
                direction = %signal.direction,
                error = %e,
                "ScanJob: failed to deliver {} signal for {}",
                signal.direction,
                signal.instrument
            );
            ScanOutcome::DeliveryFailed(signal.direction, e)
        }
    }
}
