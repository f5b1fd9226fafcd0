//! Candlestick pattern detection.
//!
//! Patterns look at the current bar and the one before it only. They never
//! depend on indicator state, so they can run on any pair of bars.

pub mod engulfing;

pub use engulfing::{bearish_engulfing, bullish_engulfing, detect_engulfing, EngulfingFlags};
