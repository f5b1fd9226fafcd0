//! Concrete indicator implementations and the per-bar indicator frame.
//!
//! Every indicator is a pure function of the bar history: series in, series
//! of the same length out. Warm-up positions are `None`, never NaN and never
//! zero, so "not yet computable" cannot be mistaken for a real reading.

pub mod atr;
pub mod ema;
pub mod frame;
pub mod macd;
pub mod rsi;
pub mod volatility;

pub use atr::{true_range, Atr};
pub use ema::{ema_of_series, Ema};
pub use frame::{IndicatorConfig, IndicatorEngine, IndicatorFrame, IndicatorRow, IndicatorSnapshot};
pub use macd::{Macd, MacdLines};
pub use rsi::Rsi;
pub use volatility::{elevated_volatility, VolatilityRegime};

use crate::domain::PriceBar;

/// Trait for single-series indicators.
///
/// # Look-ahead contamination guard
/// No value at bar t may depend on price data from bar t+1 or later.
/// Every indicator must pass the truncated-vs-full series test.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "ema_20", "atr_14").
    fn name(&self) -> &str;

    /// Index of the first bar with a defined value.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    ///
    /// Returns one entry per bar; the first `lookback()` entries are `None`.
    fn compute(&self, bars: &[PriceBar]) -> Vec<Option<f64>>;
}

/// Create synthetic bars from close prices for testing.
///
/// Generates plausible OHLC: open = prev_close (or close for first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<PriceBar> {
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            PriceBar::new(
                base + chrono::Duration::minutes(30 * i as i64),
                open,
                open.max(close) + 1.0,
                open.min(close) - 1.0,
                close,
                Some(1000.0),
            )
        })
        .collect()
}

/// Assert an optional value is defined and approximately equal to `expected`.
#[cfg(test)]
pub fn assert_approx(actual: Option<f64>, expected: f64, epsilon: f64) {
    let actual = actual.unwrap_or_else(|| panic!("expected {expected}, got undefined"));
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
