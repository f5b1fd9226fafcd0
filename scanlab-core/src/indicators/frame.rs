//! Per-bar indicator frame: every bar of a series annotated with the values
//! the scorer reads.

use super::{Atr, Ema, Indicator, Macd, Rsi, VolatilityRegime};
use crate::domain::{PriceBar, PriceSeries, SwingRange};
use crate::error::EngineConfigError;
use serde::{Deserialize, Serialize};

/// Periods and thresholds of the indicator set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    pub ema_fast: usize,
    pub ema_slow: usize,
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub atr_period: usize,
    pub volatility_window: usize,
    pub volatility_factor: f64,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            ema_fast: 20,
            ema_slow: 50,
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            atr_period: 14,
            volatility_window: 10,
            volatility_factor: 0.8,
        }
    }
}

impl IndicatorConfig {
    /// Index of the first row on which every indicator is defined.
    pub fn first_complete_index(&self) -> usize {
        let ema = self.ema_fast.max(self.ema_slow) - 1;
        let rsi = self.rsi_period;
        let macd = self.macd_slow + self.macd_signal - 2;
        let volatility = self.atr_period + self.volatility_window - 2;
        ema.max(rsi).max(macd).max(volatility)
    }

    /// Bars needed before the frame has its first complete row.
    pub fn warmup_bars(&self) -> usize {
        self.first_complete_index() + 1
    }

    pub fn validate(&self) -> Result<(), EngineConfigError> {
        let periods = [
            ("ema_fast", self.ema_fast),
            ("ema_slow", self.ema_slow),
            ("rsi_period", self.rsi_period),
            ("macd_fast", self.macd_fast),
            ("macd_slow", self.macd_slow),
            ("macd_signal", self.macd_signal),
            ("atr_period", self.atr_period),
            ("volatility_window", self.volatility_window),
        ];
        if let Some((name, _)) = periods.iter().find(|(_, p)| *p == 0) {
            return Err(EngineConfigError::ZeroPeriod { name: *name });
        }
        if self.ema_fast >= self.ema_slow {
            return Err(EngineConfigError::InvertedPeriods {
                fast: "ema_fast",
                fast_period: self.ema_fast,
                slow: "ema_slow",
                slow_period: self.ema_slow,
            });
        }
        if self.macd_fast >= self.macd_slow {
            return Err(EngineConfigError::InvertedPeriods {
                fast: "macd_fast",
                fast_period: self.macd_fast,
                slow: "macd_slow",
                slow_period: self.macd_slow,
            });
        }
        if !self.volatility_factor.is_finite() || self.volatility_factor <= 0.0 {
            return Err(EngineConfigError::VolatilityFactor(self.volatility_factor));
        }
        Ok(())
    }
}

/// One bar plus its indicator values. `None` marks a warm-up position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorRow {
    pub bar: PriceBar,
    pub ema_fast: Option<f64>,
    pub ema_slow: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_hist: Option<f64>,
    pub atr: Option<f64>,
    pub elevated_volatility: Option<bool>,
}

/// A complete row with every value defined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IndicatorSnapshot {
    pub bar: PriceBar,
    pub ema_fast: f64,
    pub ema_slow: f64,
    pub rsi: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub macd_hist: f64,
    pub atr: f64,
    pub elevated_volatility: bool,
}

impl IndicatorRow {
    /// A row with no indicator values, as produced for the first bar.
    pub fn empty(bar: PriceBar) -> Self {
        Self {
            bar,
            ema_fast: None,
            ema_slow: None,
            rsi: None,
            macd: None,
            macd_signal: None,
            macd_hist: None,
            atr: None,
            elevated_volatility: None,
        }
    }

    pub fn snapshot(&self) -> Option<IndicatorSnapshot> {
        Some(IndicatorSnapshot {
            bar: self.bar,
            ema_fast: self.ema_fast?,
            ema_slow: self.ema_slow?,
            rsi: self.rsi?,
            macd: self.macd?,
            macd_signal: self.macd_signal?,
            macd_hist: self.macd_hist?,
            atr: self.atr?,
            elevated_volatility: self.elevated_volatility?,
        })
    }

    pub fn is_complete(&self) -> bool {
        self.snapshot().is_some()
    }
}

/// Indicator rows aligned one-to-one with the bars they were computed from.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct IndicatorFrame {
    rows: Vec<IndicatorRow>,
}

impl IndicatorFrame {
    /// Wrap hand-built rows. Rows must already be in chronological order.
    pub fn from_rows(rows: Vec<IndicatorRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[IndicatorRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn last(&self) -> Option<&IndicatorRow> {
        self.rows.last()
    }

    /// The last `n` rows (or all of them if fewer).
    pub fn tail(&self, n: usize) -> &[IndicatorRow] {
        &self.rows[self.rows.len().saturating_sub(n)..]
    }

    /// High/low over the trailing `window` bars, including the last bar.
    pub fn swing_range(&self, window: usize) -> Option<SwingRange> {
        if window == 0 || self.rows.len() < window {
            return None;
        }
        let bars: Vec<PriceBar> = self.tail(window).iter().map(|r| r.bar).collect();
        SwingRange::of(&bars)
    }
}

/// Computes an [`IndicatorFrame`] from a price series.
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    config: IndicatorConfig,
}

impl IndicatorEngine {
    pub fn new(config: IndicatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &IndicatorConfig {
        &self.config
    }

    pub fn compute(&self, series: &PriceSeries) -> IndicatorFrame {
        self.compute_bars(series.bars())
    }

    /// Same as [`compute`](Self::compute) for a raw slice already known to be
    /// ascending and finite.
    pub fn compute_bars(&self, bars: &[PriceBar]) -> IndicatorFrame {
        let c = &self.config;
        let ema_fast = Ema::new(c.ema_fast).compute(bars);
        let ema_slow = Ema::new(c.ema_slow).compute(bars);
        let rsi = Rsi::new(c.rsi_period).compute(bars);
        let macd = Macd::new(c.macd_fast, c.macd_slow, c.macd_signal).compute_lines(bars);
        let atr = Atr::new(c.atr_period).compute(bars);
        let elevated = VolatilityRegime::new(c.volatility_window, c.volatility_factor).classify(&atr);

        let rows = bars
            .iter()
            .enumerate()
            .map(|(i, bar)| IndicatorRow {
                bar: *bar,
                ema_fast: ema_fast[i],
                ema_slow: ema_slow[i],
                rsi: rsi[i],
                macd: macd.macd[i],
                macd_signal: macd.signal[i],
                macd_hist: macd.hist[i],
                atr: atr[i],
                elevated_volatility: elevated[i],
            })
            .collect();

        IndicatorFrame { rows }
    }
}

impl Default for IndicatorEngine {
    fn default() -> Self {
        Self::new(IndicatorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    fn wave(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + 3.0 * (i as f64 * 0.25).sin() + i as f64 * 0.05)
            .collect()
    }

    #[test]
    fn default_warmup() {
        let config = IndicatorConfig::default();
        assert_eq!(config.first_complete_index(), 49);
        assert_eq!(config.warmup_bars(), 50);
    }

    #[test]
    fn frame_matches_series_length() {
        let bars = make_bars(&wave(80));
        let frame = IndicatorEngine::default().compute_bars(&bars);
        assert_eq!(frame.len(), 80);
        for (row, bar) in frame.rows().iter().zip(&bars) {
            assert_eq!(row.bar, *bar);
        }
    }

    #[test]
    fn first_complete_row_is_49() {
        let frame = IndicatorEngine::default().compute_bars(&make_bars(&wave(80)));
        assert!(!frame.rows()[48].is_complete());
        assert!(frame.rows()[49].is_complete());
        assert!(frame.rows()[49..].iter().all(IndicatorRow::is_complete));
    }

    #[test]
    fn short_series_has_no_complete_row() {
        let frame = IndicatorEngine::default().compute_bars(&make_bars(&wave(40)));
        assert!(frame.rows().iter().all(|r| !r.is_complete()));
        assert!(frame.last().and_then(IndicatorRow::snapshot).is_none());
    }

    #[test]
    fn swing_range_over_trailing_window() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let frame = IndicatorEngine::default().compute_bars(&make_bars(&closes));
        let swing = frame.swing_range(10).unwrap();
        // Bars 10..20: highs reach close 119 + 1, lows reach open 109 - 1
        assert_eq!(swing.high, 120.0);
        assert_eq!(swing.low, 108.0);
        assert!(frame.swing_range(21).is_none());
        assert!(frame.swing_range(0).is_none());
    }

    #[test]
    fn validate_rejects_bad_config() {
        assert!(IndicatorConfig::default().validate().is_ok());

        let zero = IndicatorConfig {
            rsi_period: 0,
            ..IndicatorConfig::default()
        };
        assert_eq!(
            zero.validate().unwrap_err(),
            EngineConfigError::ZeroPeriod { name: "rsi_period" }
        );

        let inverted = IndicatorConfig {
            ema_fast: 50,
            ema_slow: 20,
            ..IndicatorConfig::default()
        };
        assert!(matches!(
            inverted.validate(),
            Err(EngineConfigError::InvertedPeriods { fast: "ema_fast", .. })
        ));

        let flat = IndicatorConfig {
            volatility_factor: f64::NAN,
            ..IndicatorConfig::default()
        };
        assert!(matches!(
            flat.validate(),
            Err(EngineConfigError::VolatilityFactor(_))
        ));
    }

    #[test]
    fn config_fills_missing_fields() {
        let config: IndicatorConfig = serde_json::from_str(r#"{"ema_fast": 9}"#).unwrap();
        assert_eq!(config.ema_fast, 9);
        assert_eq!(config.ema_slow, 50);
    }
}
