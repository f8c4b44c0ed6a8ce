//! Signal evaluation and duplicate suppression.

pub mod cooldown;
pub mod engine;

pub use cooldown::{CooldownGate, CooldownKey, CooldownStore, InMemoryCooldownStore};
pub use engine::SignalEngine;
