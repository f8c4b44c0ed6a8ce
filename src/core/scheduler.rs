//! Polling scheduler driving scan cycles

use crate::error::SignalError;
use crate::jobs::context::ScanContext;
use crate::jobs::handlers;
use crate::jobs::types::{ScanJob, ScanOutcome};
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Result of one pass over every tracked pair
#[derive(Debug, Default)]
pub struct CycleReport {
    pub outcomes: Vec<(ScanJob, ScanOutcome)>,
    /// Jobs whose task panicked or was cancelled
    pub failures: Vec<(ScanJob, SignalError)>,
}

impl CycleReport {
    pub fn total(&self) -> usize {
        self.outcomes.len() + self.failures.len()
    }

    pub fn accepted(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| o.is_accepted()).count()
    }

    pub fn delivered(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, ScanOutcome::Delivered(_)))
            .count()
    }

    /// True when every pair either failed or got no data from the provider
    pub fn is_degraded(&self) -> bool {
        self.total() > 0
            && self.outcomes.iter().all(|(_, o)| {
                matches!(o, ScanOutcome::Unavailable(SignalError::DataUnavailable { .. }))
            })
    }
}

/// Scheduler that scans every pair once per interval until cancelled
pub struct ScanScheduler {
    context: Arc<ScanContext>,
    jobs: Vec<ScanJob>,
    interval: Duration,
    max_backoff: Duration,
}

impl ScanScheduler {
    pub fn new(context: Arc<ScanContext>, jobs: Vec<ScanJob>, interval: Duration) -> Self {
        info!(
            pairs = jobs.len(),
            interval_secs = interval.as_secs(),
            "ScanScheduler: created for {} pairs every {:?}",
            jobs.len(),
            interval
        );
        Self {
            context,
            jobs,
            interval,
            max_backoff: interval.max(Duration::from_secs(300)),
        }
    }

    pub fn with_max_backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff = max_backoff.max(self.interval);
        self
    }

    pub fn jobs(&self) -> &[ScanJob] {
        &self.jobs
    }

    /// Scan all pairs concurrently and wait for every one to finish
    pub async fn run_cycle(&self) -> CycleReport {
        let handles: Vec<_> = self
            .jobs
            .iter()
            .cloned()
            .map(|job| {
                let ctx = self.context.clone();
                tokio::spawn(handlers::handle_scan(job, ctx))
            })
            .collect();

        let mut report = CycleReport::default();
        for (job, result) in self.jobs.iter().cloned().zip(join_all(handles).await) {
            match result {
                Ok(outcome) => report.outcomes.push((job, outcome)),
                Err(e) => {
                    let err = SignalError::TransientCycleFailure(e.to_string());
                    error!(
                        symbol = %job.instrument,
                        timeframe = %job.timeframe,
                        error = %err,
                        "ScanScheduler: scan task for {} {} failed",
                        job.instrument,
                        job.timeframe
                    );
                    report.failures.push((job, err));
                }
            }
        }

        info!(
            pairs = report.total(),
            accepted = report.accepted(),
            delivered = report.delivered(),
            failures = report.failures.len(),
            "ScanScheduler: cycle complete, {} signals accepted",
            report.accepted()
        );
        report
    }

    /// Run cycles until `shutdown` is cancelled.
    ///
    /// Cancellation is observed only between cycles; the wait between cycles
    /// returns immediately on cancel. A degraded cycle doubles the wait, up
    /// to `max_backoff`.
    pub async fn run(self, shutdown: CancellationToken) {
        info!("ScanScheduler: started");
        let mut wait = self.interval;

        while !shutdown.is_cancelled() {
            let report = self.run_cycle().await;

            wait = if report.is_degraded() {
                let next = (wait * 2).min(self.max_backoff);
                warn!(
                    backoff_secs = next.as_secs(),
                    "ScanScheduler: no pair succeeded, backing off for {:?}",
                    next
                );
                next
            } else {
                self.interval
            };

            debug!("ScanScheduler: waiting {:?} for next cycle", wait);
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(wait) => {}
            }
        }

        info!("ScanScheduler: stopped");
    }
}
