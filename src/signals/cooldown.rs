//! Duplicate suppression for signals that stay true across scan cycles.
//!
//! The scan loop re-evaluates the full window every tick, so the same setup
//! keeps producing the same signal until price moves on. The gate lets one
//! through per (instrument, timeframe, direction) per cooldown window.

use crate::models::signal::{Signal, SignalDirection};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CooldownKey {
    pub instrument: String,
    pub timeframe: String,
    pub direction: SignalDirection,
}

impl CooldownKey {
    pub fn for_signal(signal: &Signal) -> Self {
        Self {
            instrument: signal.instrument.clone(),
            timeframe: signal.timeframe.clone(),
            direction: signal.direction,
        }
    }
}

/// Keyed store of last-acceptance times
pub trait CooldownStore: Send + Sync {
    /// Atomically accept-and-record, or reject without touching the entry
    fn check_and_record(&self, key: &CooldownKey, now: DateTime<Utc>, window: Duration) -> bool;

    fn last_accepted(&self, key: &CooldownKey) -> Option<DateTime<Utc>>;
}

#[derive(Default)]
pub struct InMemoryCooldownStore {
    entries: Mutex<HashMap<CooldownKey, DateTime<Utc>>>,
}

impl InMemoryCooldownStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CooldownStore for InMemoryCooldownStore {
    fn check_and_record(&self, key: &CooldownKey, now: DateTime<Utc>, window: Duration) -> bool {
        // Entries stay valid even if a previous holder panicked
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());

        if let Some(recorded) = entries.get(key) {
            if now.signed_duration_since(*recorded) < window {
                return false;
            }
        }
        entries.insert(key.clone(), now);
        true
    }

    fn last_accepted(&self, key: &CooldownKey) -> Option<DateTime<Utc>> {
        let entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        entries.get(key).copied()
    }
}

/// Cooldown gate in front of the notifier
#[derive(Clone)]
pub struct CooldownGate {
    store: Arc<dyn CooldownStore>,
    window: Duration,
}

impl CooldownGate {
    pub fn new(window: Duration) -> Self {
        Self::with_store(Arc::new(InMemoryCooldownStore::new()), window)
    }

    pub fn with_store(store: Arc<dyn CooldownStore>, window: Duration) -> Self {
        Self { store, window }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Accept `signal` if its key has not fired within the window ending at `now`
    pub fn should_accept(&self, signal: &Signal, now: DateTime<Utc>) -> bool {
        self.store
            .check_and_record(&CooldownKey::for_signal(signal), now, self.window)
    }

    pub fn last_accepted(&self, key: &CooldownKey) -> Option<DateTime<Utc>> {
        self.store.last_accepted(key)
    }
}
