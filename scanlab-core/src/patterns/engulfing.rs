//! Two-bar engulfing patterns.
//!
//! Bullish: a down bar followed by an up bar that opens below the prior close
//! and closes above the prior open. Bearish is the mirror image.
//! Both comparisons are strict; equal prices never form a pattern.

use crate::domain::PriceBar;
use serde::Serialize;

/// Independent bullish / bearish flags for one bar pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EngulfingFlags {
    pub bullish: bool,
    pub bearish: bool,
}

pub fn bullish_engulfing(open: f64, close: f64, prev_open: f64, prev_close: f64) -> bool {
    prev_open > prev_close && close > open && close > prev_open && open < prev_close
}

pub fn bearish_engulfing(open: f64, close: f64, prev_open: f64, prev_close: f64) -> bool {
    prev_open < prev_close && close < open && close < prev_open && open > prev_close
}

/// Evaluate both patterns for `current` against `previous`.
pub fn detect_engulfing(previous: &PriceBar, current: &PriceBar) -> EngulfingFlags {
    EngulfingFlags {
        bullish: bullish_engulfing(current.open, current.close, previous.open, previous.close),
        bearish: bearish_engulfing(current.open, current.close, previous.open, previous.close),
    }
}
