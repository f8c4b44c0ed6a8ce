//! Core application primitives (scheduler)

pub mod scheduler;

pub use scheduler::*;
