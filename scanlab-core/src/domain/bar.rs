//! PriceBar — the fundamental market data unit.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Volume assigned to bars whose provider reports none (FX pairs, metals, indices).
///
/// Never zero: downstream indicator math may divide by or take the log of volume.
pub const VOLUME_SENTINEL: f64 = 0.01;

/// OHLCV bar for a single instrument at a single bar interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    /// Build a bar, substituting [`VOLUME_SENTINEL`] for missing or non-positive volume.
    pub fn new(
        timestamp: NaiveDateTime,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: Option<f64>,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume: normalize_volume(volume),
        }
    }

    /// Name of the first OHLC field that is NaN or infinite, if any.
    pub fn non_finite_field(&self) -> Option<&'static str> {
        [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ]
        .into_iter()
        .find(|(_, v)| !v.is_finite())
        .map(|(name, _)| name)
    }

    /// Closes above its open.
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// Closes below its open.
    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }
}

/// Replace absent, non-finite, zero or negative volume with [`VOLUME_SENTINEL`].
pub fn normalize_volume(volume: Option<f64>) -> f64 {
    match volume {
        Some(v) if v.is_finite() && v > 0.0 => v,
        _ => VOLUME_SENTINEL,
    }
}
