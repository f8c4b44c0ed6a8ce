//! Candlewatch Worker
//!
//! Polls market data for every configured pair, evaluates the RSI/EMA/reversal
//! rule and delivers accepted signals until interrupted.

use candlewatch::config::Config;
use candlewatch::core::scheduler::ScanScheduler;
use candlewatch::jobs::context::ScanContext;
use candlewatch::jobs::types::ScanJob;
use candlewatch::logging;
use candlewatch::services::{
    BinanceMarketDataProvider, LogNotifier, MarketDataProvider, MessageFormatter, Notifier,
    RoutingMarketDataProvider, TelegramNotifier, YahooMarketDataProvider,
};
use candlewatch::signals::{CooldownGate, SignalEngine};
use dotenvy::dotenv;
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env if present
    dotenv().ok();

    logging::init_logging();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };

    info!("Starting Candlewatch Worker");
    info!(environment = %config.environment, "Environment");
    info!(symbols = ?config.symbols, "Symbols: {}", config.symbols.join(", "));
    info!(timeframes = ?config.timeframes, "Timeframes: {}", config.timeframes.join(", "));
    info!(
        rsi_period = config.indicators.rsi_period,
        ema_fast = config.indicators.ema_fast,
        ema_slow = config.indicators.ema_slow,
        oversold = config.indicators.rsi_oversold,
        overbought = config.indicators.rsi_overbought,
        "Indicators: RSI {} + EMA {}/{}",
        config.indicators.rsi_period,
        config.indicators.ema_fast,
        config.indicators.ema_slow
    );

    let formatter = MessageFormatter::new(
        config.indicators.clone(),
        config.signal_expiry,
        config.broker_url.clone(),
    );

    let notifier: Arc<dyn Notifier> = match config.telegram.clone() {
        Some(telegram) => {
            info!("Telegram delivery enabled");
            Arc::new(TelegramNotifier::new(telegram, formatter.clone())?)
        }
        None => {
            warn!("TELEGRAM_BOT_TOKEN/TELEGRAM_CHAT_ID not set - signals will only be logged");
            Arc::new(LogNotifier::new(formatter.clone()))
        }
    };

    let crypto: Arc<dyn MarketDataProvider> = Arc::new(BinanceMarketDataProvider::new(
        config.binance_base_url.clone(),
        config.fetch_timeout,
    )?);
    let provider: Arc<dyn MarketDataProvider> = if config.stock_symbols.is_empty() {
        crypto
    } else {
        info!(stocks = ?config.stock_symbols, "Stock symbols routed to Yahoo Finance");
        let stocks = Arc::new(YahooMarketDataProvider::new(
            config.yahoo_base_url.clone(),
            config.fetch_timeout,
        )?);
        Arc::new(RoutingMarketDataProvider::new(
            crypto,
            stocks,
            config.stock_symbols.clone(),
        ))
    };

    let engine =
        SignalEngine::new(config.indicators.clone()).with_tail_candles(config.chart_candles);
    let context = Arc::new(
        ScanContext::new(provider, notifier.clone(), engine, CooldownGate::new(config.cooldown))
            .with_candle_limit(config.candle_limit)
            .with_fetch_timeout(config.fetch_timeout)
            .with_delivery_timeout(config.delivery_timeout),
    );

    let jobs: Vec<ScanJob> = config
        .pairs()
        .into_iter()
        .map(|(instrument, timeframe)| ScanJob::new(instrument, timeframe))
        .collect();

    let announcement = formatter.startup(&config.instruments());
    let announce = tokio::time::timeout(config.delivery_timeout, notifier.announce(&announcement));
    tokio::select! {
        result = announce => {
            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "Failed to send start-up announcement"),
                Err(_) => warn!("Start-up announcement timed out"),
            }
        }
        _ = signal::ctrl_c() => {
            info!("Shutdown requested during start-up");
            return Ok(());
        }
    }

    let shutdown = CancellationToken::new();
    let scheduler = ScanScheduler::new(context, jobs, config.check_interval)
        .with_max_backoff(config.max_backoff);
    let handle = tokio::spawn(scheduler.run(shutdown.clone()));

    info!("Worker started, waiting for shutdown signal...");
    signal::ctrl_c().await?;

    info!("Shutting down worker...");
    shutdown.cancel();
    if let Err(e) = handle.await {
        error!(error = %e, "Scheduler task ended abnormally");
    }
    info!("Worker stopped");

    Ok(())
}
