//! Job and outcome types for the scan workflow

use crate::error::SignalError;
use crate::models::signal::SignalDirection;
use serde::{Deserialize, Serialize};

/// One (instrument, timeframe) pair to scan per cycle
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScanJob {
    pub instrument: String,
    pub timeframe: String,
}

impl ScanJob {
    pub fn new(instrument: impl Into<String>, timeframe: impl Into<String>) -> Self {
        Self {
            instrument: instrument.into(),
            timeframe: timeframe.into(),
        }
    }
}

/// What happened to one pair during a cycle
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    /// No usable series: provider failure, timeout, or too little history
    Unavailable(SignalError),
    NoSignal,
    /// Signal found but still inside its cooldown window
    Suppressed(SignalDirection),
    Delivered(SignalDirection),
    /// Accepted by the gate, but the notifier failed
    DeliveryFailed(SignalDirection, SignalError),
}

impl ScanOutcome {
    /// Whether the gate accepted a signal, regardless of delivery
    pub fn is_accepted(&self) -> bool {
        matches!(
            self,
            ScanOutcome::Delivered(_) | ScanOutcome::DeliveryFailed(_, _)
        )
    }
}
