//! Integration tests for the Worker
//!
//! Tests the per-pair scan handler and the polling scheduler.


use crate::common::{base_time, reversal_series, series_from};
use candlewatch::core::scheduler::ScanScheduler;
use candlewatch::error::SignalError;
use candlewatch::jobs::handlers::handle_scan_at;
use candlewatch::jobs::types::{ScanJob, ScanOutcome};
use candlewatch::models::signal::SignalDirection;
use candlewatch::services::{
    InMemoryMarketDataProvider, MarketDataProvider, RoutingMarketDataProvider,
};
use chrono::Duration as ChronoDuration;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use test_utils::{
    context, CountingProvider, HangingNotifier, PanickingProvider, RecordingNotifier,
    SlowProvider,
};

fn quiet_bars() -> Vec<(f64, f64)> {
    (0..60)
        .map(|i| {
            let close = 100.0 + i as f64 * 0.25;
            (close - 0.1, close)
        })
        .collect()
}

fn provider_with_buy() -> Arc<InMemoryMarketDataProvider> {
    let provider = Arc::new(InMemoryMarketDataProvider::new());
    provider.insert(reversal_series("BTCUSDT", "5m", SignalDirection::Buy));
    provider
}

#[tokio::test]
async fn scan_delivers_signal_once_per_cooldown() {
    let notifier = Arc::new(RecordingNotifier::default());
    let ctx = context(provider_with_buy(), notifier.clone());
    let job = ScanJob::new("BTCUSDT", "5m");
    let t0 = base_time();

    let first = handle_scan_at(job.clone(), ctx.clone(), t0).await;
    assert_eq!(first, ScanOutcome::Delivered(SignalDirection::Buy));

    let second = handle_scan_at(job.clone(), ctx.clone(), t0 + ChronoDuration::seconds(30)).await;
    assert_eq!(second, ScanOutcome::Suppressed(SignalDirection::Buy));

    let third = handle_scan_at(job, ctx, t0 + ChronoDuration::minutes(5)).await;
    assert_eq!(third, ScanOutcome::Delivered(SignalDirection::Buy));

    let delivered = notifier.delivered();
    assert_eq!(delivered.len(), 2);
    assert_eq!(delivered[0].instrument, "BTCUSDT");
    assert_eq!(delivered[0].timestamp, t0);
}

#[tokio::test]
async fn failed_delivery_still_consumes_cooldown() {
    let notifier = Arc::new(RecordingNotifier::failing());
    let ctx = context(provider_with_buy(), notifier.clone());
    let job = ScanJob::new("BTCUSDT", "5m");
    let t0 = base_time();

    let first = handle_scan_at(job.clone(), ctx.clone(), t0).await;
    assert!(matches!(
        first,
        ScanOutcome::DeliveryFailed(SignalDirection::Buy, SignalError::NotificationFailure(_))
    ));
    assert!(first.is_accepted());

    let second = handle_scan_at(job, ctx, t0 + ChronoDuration::minutes(1)).await;
    assert_eq!(second, ScanOutcome::Suppressed(SignalDirection::Buy));
    assert_eq!(notifier.delivered().len(), 1);
}

#[tokio::test]
async fn missing_series_is_unavailable() {
    let notifier = Arc::new(RecordingNotifier::default());
    let ctx = context(provider_with_buy(), notifier.clone());

    let outcome = handle_scan_at(ScanJob::new("ETHUSDT", "5m"), ctx, base_time()).await;
    assert!(matches!(
        outcome,
        ScanOutcome::Unavailable(SignalError::DataUnavailable { .. })
    ));
    assert!(notifier.delivered().is_empty());
}

#[tokio::test]
async fn short_series_is_insufficient_history() {
    let provider = Arc::new(InMemoryMarketDataProvider::new());
    provider.insert(series_from("BTCUSDT", "5m", &[(100.0, 101.0); 1]));
    let ctx = context(provider, Arc::new(RecordingNotifier::default()));

    let outcome = handle_scan_at(ScanJob::new("BTCUSDT", "5m"), ctx, base_time()).await;
    assert_eq!(
        outcome,
        ScanOutcome::Unavailable(SignalError::InsufficientHistory {
            required: 19,
            actual: 1
        })
    );
}

#[tokio::test]
async fn quiet_market_yields_no_signal() {
    let provider = Arc::new(InMemoryMarketDataProvider::new());
    provider.insert(series_from("BTCUSDT", "5m", &quiet_bars()));
    let ctx = context(provider, Arc::new(RecordingNotifier::default()));

    let outcome = handle_scan_at(ScanJob::new("BTCUSDT", "5m"), ctx, base_time()).await;
    assert_eq!(outcome, ScanOutcome::NoSignal);
}

#[tokio::test]
async fn slow_provider_times_out() {
    let ctx = context(Arc::new(SlowProvider), Arc::new(RecordingNotifier::default()));

    let outcome = tokio::time::timeout(
        Duration::from_secs(5),
        handle_scan_at(ScanJob::new("BTCUSDT", "5m"), ctx, base_time()),
    )
    .await
    .expect("handler returns after fetch timeout");

    match outcome {
        ScanOutcome::Unavailable(SignalError::DataUnavailable { reason, .. }) => {
            assert!(reason.contains("timed out"));
        }
        other => panic!("expected timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn cycle_scans_every_pair() {
    let provider = Arc::new(InMemoryMarketDataProvider::new());
    provider.insert(reversal_series("BTCUSDT", "5m", SignalDirection::Buy));
    provider.insert(reversal_series("ETHUSDT", "5m", SignalDirection::Sell));
    let notifier = Arc::new(RecordingNotifier::default());
    let ctx = context(provider, notifier.clone());

    let jobs = vec![
        ScanJob::new("BTCUSDT", "5m"),
        ScanJob::new("ETHUSDT", "5m"),
        ScanJob::new("SOLUSDT", "5m"),
    ];
    let scheduler = ScanScheduler::new(ctx, jobs, Duration::from_secs(60));

    let report = scheduler.run_cycle().await;
    assert_eq!(report.total(), 3);
    assert_eq!(report.accepted(), 2);
    assert_eq!(report.delivered(), 2);
    assert!(report.failures.is_empty());
    assert!(!report.is_degraded());
    assert_eq!(
        report.outcomes[2].1,
        ScanOutcome::Unavailable(SignalError::unavailable("SOLUSDT", "5m", "no series loaded"))
    );

    let mut directions: Vec<_> = notifier.delivered().iter().map(|s| s.direction).collect();
    directions.sort_by_key(|d| d.to_string());
    assert_eq!(directions, vec![SignalDirection::Buy, SignalDirection::Sell]);

    // Same setup on the next tick is still inside the cooldown
    let report = scheduler.run_cycle().await;
    assert_eq!(report.accepted(), 0);
    assert_eq!(notifier.delivered().len(), 2);
}

#[tokio::test]
async fn panicking_pair_does_not_abort_cycle() {
    let inner = InMemoryMarketDataProvider::new();
    inner.insert(reversal_series("BTCUSDT", "5m", SignalDirection::Buy));
    let provider = Arc::new(PanickingProvider {
        instrument: "ETHUSDT".to_string(),
        inner,
    });
    let notifier = Arc::new(RecordingNotifier::default());
    let ctx = context(provider, notifier.clone());

    let jobs = vec![ScanJob::new("BTCUSDT", "5m"), ScanJob::new("ETHUSDT", "5m")];
    let report = ScanScheduler::new(ctx, jobs, Duration::from_secs(60))
        .run_cycle()
        .await;

    assert_eq!(report.total(), 2);
    assert_eq!(report.delivered(), 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].0, ScanJob::new("ETHUSDT", "5m"));
    assert!(matches!(
        report.failures[0].1,
        SignalError::TransientCycleFailure(_)
    ));
}

#[tokio::test]
async fn cycle_without_data_is_degraded() {
    let ctx = context(
        Arc::new(InMemoryMarketDataProvider::new()),
        Arc::new(RecordingNotifier::default()),
    );
    let jobs = vec![ScanJob::new("BTCUSDT", "5m"), ScanJob::new("ETHUSDT", "1h")];
    let report = ScanScheduler::new(ctx, jobs, Duration::from_secs(60))
        .run_cycle()
        .await;

    assert_eq!(report.total(), 2);
    assert!(report.is_degraded());
}

#[tokio::test]
async fn scheduler_stops_when_cancelled() {
    let notifier = Arc::new(RecordingNotifier::default());
    let ctx = context(provider_with_buy(), notifier.clone());
    let scheduler = ScanScheduler::new(
        ctx,
        vec![ScanJob::new("BTCUSDT", "5m")],
        Duration::from_secs(3600),
    );

    let shutdown = CancellationToken::new();
    let handle = tokio::spawn(scheduler.run(shutdown.clone()));

    // First cycle runs immediately, then the scheduler sleeps for an hour
    tokio::time::sleep(Duration::from_millis(200)).await;
    shutdown.cancel();

    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("scheduler exits promptly")
        .expect("scheduler task did not panic");
    assert_eq!(notifier.delivered().len(), 1);
}

#[tokio::test]
async fn scheduler_does_not_start_when_already_cancelled() {
    let notifier = Arc::new(RecordingNotifier::default());
    let ctx = context(provider_with_buy(), notifier.clone());
    let scheduler = ScanScheduler::new(
        ctx,
        vec![ScanJob::new("BTCUSDT", "5m")],
        Duration::from_secs(1),
    );

    let shutdown = CancellationToken::new();
    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(5), scheduler.run(shutdown))
        .await
        .expect("scheduler returns");
    assert!(notifier.delivered().is_empty());
}

#[tokio::test]
async fn hanging_delivery_times_out_and_keeps_cooldown() {
    let notifier = Arc::new(HangingNotifier::default());
    let ctx = context(provider_with_buy(), notifier.clone());
    let job = ScanJob::new("BTCUSDT", "5m");
    let t0 = base_time();

    let outcome = tokio::time::timeout(
        Duration::from_secs(5),
        handle_scan_at(job.clone(), ctx.clone(), t0),
    )
    .await
    .expect("handler returns after delivery timeout");

    match outcome {
        ScanOutcome::DeliveryFailed(SignalDirection::Buy, SignalError::NotificationFailure(r)) => {
            assert!(r.contains("timed out"));
        }
        other => panic!("expected delivery timeout, got {:?}", other),
    }

    let again = handle_scan_at(job, ctx, t0 + ChronoDuration::seconds(30)).await;
    assert_eq!(again, ScanOutcome::Suppressed(SignalDirection::Buy));
    assert_eq!(notifier.attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn hanging_notifier_does_not_block_shutdown() {
    let notifier = Arc::new(HangingNotifier::default());
    let ctx = context(provider_with_buy(), notifier.clone());
    let scheduler = ScanScheduler::new(
        ctx,
        vec![ScanJob::new("BTCUSDT", "5m")],
        Duration::from_secs(3600),
    );

    let shutdown = CancellationToken::new();
    let handle = tokio::spawn(scheduler.run(shutdown.clone()));

    tokio::time::sleep(Duration::from_millis(200)).await;
    shutdown.cancel();

    tokio::time::timeout(Duration::from_secs(3), handle)
        .await
        .expect("scheduler exits after cancel")
        .expect("scheduler task did not panic");
    assert_eq!(notifier.attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn degraded_cycles_back_off_and_recover() {
    let provider = Arc::new(CountingProvider::default());
    provider
        .inner
        .insert(series_from("BTCUSDT", "5m", &quiet_bars()));
    let ctx = context(provider.clone(), Arc::new(RecordingNotifier::default()));
    let scheduler = ScanScheduler::new(
        ctx,
        vec![ScanJob::new("BTCUSDT", "5m")],
        Duration::from_secs(10),
    )
    .with_max_backoff(Duration::from_secs(40));

    let start = tokio::time::Instant::now();
    let at = |secs: u64| tokio::time::sleep_until(start + Duration::from_secs(secs));
    let shutdown = CancellationToken::new();
    let handle = tokio::spawn(scheduler.run(shutdown.clone()));

    // Failing: cycles at 0, 20, 60, 100 (wait 20, then capped at 40)
    at(1).await;
    assert_eq!(provider.calls(), 1);
    at(19).await;
    assert_eq!(provider.calls(), 1);
    at(21).await;
    assert_eq!(provider.calls(), 2);
    at(59).await;
    assert_eq!(provider.calls(), 2);
    at(61).await;
    assert_eq!(provider.calls(), 3);
    at(99).await;
    assert_eq!(provider.calls(), 3);
    at(101).await;
    assert_eq!(provider.calls(), 4);

    // Healthy again: the cycle at 140 resets the wait to the interval
    provider.set_healthy(true);
    at(139).await;
    assert_eq!(provider.calls(), 4);
    at(141).await;
    assert_eq!(provider.calls(), 5);
    at(151).await;
    assert_eq!(provider.calls(), 6);
    at(161).await;
    assert_eq!(provider.calls(), 7);

    shutdown.cancel();
    handle.await.expect("scheduler task did not panic");
}

#[tokio::test]
async fn stock_symbols_are_routed_to_stock_provider() {
    let crypto = Arc::new(InMemoryMarketDataProvider::new());
    crypto.insert(reversal_series("BTCUSDT", "5m", SignalDirection::Buy));
    let stocks = Arc::new(InMemoryMarketDataProvider::new());
    stocks.insert(reversal_series("AAPL", "5m", SignalDirection::Sell));

    let router = RoutingMarketDataProvider::new(crypto, stocks, vec!["AAPL".to_string()]);
    assert!(router.is_stock("AAPL"));
    assert!(!router.is_stock("BTCUSDT"));

    assert!(router.fetch_series("AAPL", "5m", 100).await.is_ok());
    assert!(router.fetch_series("BTCUSDT", "5m", 100).await.is_ok());
    // Each provider only knows its own instruments
    assert!(router.fetch_series("ETHUSDT", "5m", 100).await.is_err());

    let notifier = Arc::new(RecordingNotifier::default());
    let ctx = context(Arc::new(router), notifier.clone());
    let jobs = vec![ScanJob::new("BTCUSDT", "5m"), ScanJob::new("AAPL", "5m")];
    let report = ScanScheduler::new(ctx, jobs, Duration::from_secs(60))
        .run_cycle()
        .await;

    assert_eq!(report.delivered(), 2);
    let aapl = notifier
        .delivered()
        .into_iter()
        .find(|s| s.instrument == "AAPL")
        .expect("AAPL signal");
    assert_eq!(aapl.direction, SignalDirection::Sell);
}
