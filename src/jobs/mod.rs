//! Per-pair scan jobs driven by the scheduler

pub mod context;
pub mod handlers;
pub mod types;

pub use context::ScanContext;
pub use types::{ScanJob, ScanOutcome};
