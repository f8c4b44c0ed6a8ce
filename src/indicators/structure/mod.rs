//! Price-action structure: reversal candles

pub mod reversal;

pub use reversal::*;
