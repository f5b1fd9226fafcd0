//! Multi-factor signal scoring.
//!
//! Reads the final two rows of an [`IndicatorFrame`] and the trailing swing
//! range, evaluates seven factors per direction and turns the two scores
//! into a [`Signal`]. Scoring never looks at anything but the frame.

pub mod factors;

pub use factors::{FactorSet, FACTOR_COUNT};

use crate::domain::{Signal, SwingRange};
use crate::error::{EngineConfigError, InsufficientData};
use crate::indicators::{IndicatorFrame, IndicatorSnapshot};
use crate::patterns::detect_engulfing;
use serde::{Deserialize, Serialize};

/// Open RSI interval; both edges are excluded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RsiBand {
    pub lower: f64,
    pub upper: f64,
}

impl RsiBand {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    pub fn contains(&self, rsi: f64) -> bool {
        self.lower < rsi && rsi < self.upper
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub buy_rsi: RsiBand,
    pub sell_rsi: RsiBand,
    /// Fractional distance from the swing extreme that still counts as a breakout.
    pub breakout_tolerance: f64,
    /// Bars in the trailing swing range, including the last bar.
    pub swing_window: usize,
    /// Score a direction needs to produce a signal.
    pub min_score: u8,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            buy_rsi: RsiBand::new(40.0, 70.0),
            sell_rsi: RsiBand::new(30.0, 60.0),
            breakout_tolerance: 0.003,
            swing_window: 10,
            min_score: FACTOR_COUNT,
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<(), EngineConfigError> {
        if self.min_score == 0 || self.min_score > FACTOR_COUNT {
            return Err(EngineConfigError::MinScoreOutOfRange {
                min_score: self.min_score,
                max: FACTOR_COUNT,
            });
        }
        for (name, band) in [("buy_rsi", self.buy_rsi), ("sell_rsi", self.sell_rsi)] {
            if band.lower >= band.upper {
                return Err(EngineConfigError::BadBand {
                    name,
                    lower: band.lower,
                    upper: band.upper,
                });
            }
        }
        if !(0.0..1.0).contains(&self.breakout_tolerance) {
            return Err(EngineConfigError::BreakoutTolerance(self.breakout_tolerance));
        }
        if self.swing_window == 0 {
            return Err(EngineConfigError::ZeroSwingWindow);
        }
        Ok(())
    }
}

/// Both directions' factor breakdowns and the resulting signal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreCard {
    pub buy: FactorSet,
    pub sell: FactorSet,
    pub swing: SwingRange,
    pub signal: Signal,
}

impl ScoreCard {
    pub fn buy_score(&self) -> u8 {
        self.buy.score()
    }

    pub fn sell_score(&self) -> u8 {
        self.sell.score()
    }
}

/// Pick the signal for a pair of scores. BUY is checked first and wins a tie.
pub fn decide(buy_score: u8, sell_score: u8, min_score: u8) -> Signal {
    if buy_score >= min_score {
        Signal::buy(buy_score)
    } else if sell_score >= min_score {
        Signal::sell(sell_score)
    } else {
        Signal::NONE
    }
}

#[derive(Debug, Clone, Default)]
pub struct SignalScorer {
    config: ScoringConfig,
}

impl SignalScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score the last bar of `frame`.
    ///
    /// Needs at least two rows, a full swing window, and complete last and
    /// previous rows.
    pub fn score(&self, frame: &IndicatorFrame) -> Result<ScoreCard, InsufficientData> {
        let n = frame.len();
        let required = self.config.swing_window.max(2);
        if n < required {
            return Err(InsufficientData::TooFewBars {
                required,
                actual: n,
            });
        }

        let rows = frame.rows();
        let last = rows[n - 1]
            .snapshot()
            .ok_or(InsufficientData::IncompleteIndicators { index: n - 1 })?;
        let prev = rows[n - 2]
            .snapshot()
            .ok_or(InsufficientData::IncompleteIndicators { index: n - 2 })?;
        let swing = frame
            .swing_range(self.config.swing_window)
            .ok_or(InsufficientData::TooFewBars {
                required,
                actual: n,
            })?;

        let buy = self.buy_factors(&last, &prev, &swing);
        let sell = self.sell_factors(&last, &prev, &swing);
        let signal = decide(buy.score(), sell.score(), self.config.min_score);

        Ok(ScoreCard {
            buy,
            sell,
            swing,
            signal,
        })
    }

    fn buy_factors(
        &self,
        last: &IndicatorSnapshot,
        prev: &IndicatorSnapshot,
        swing: &SwingRange,
    ) -> FactorSet {
        let bar = &last.bar;
        FactorSet {
            trend: last.ema_fast > last.ema_slow,
            momentum: self.config.buy_rsi.contains(last.rsi),
            macd: last.macd_hist > 0.0,
            rejection: bar.is_bullish() && bar.low < prev.bar.low,
            breakout: bar.close >= swing.high * (1.0 - self.config.breakout_tolerance),
            volatility: last.elevated_volatility,
            pattern: detect_engulfing(&prev.bar, bar).bullish,
        }
    }

    fn sell_factors(
        &self,
        last: &IndicatorSnapshot,
        prev: &IndicatorSnapshot,
        swing: &SwingRange,
    ) -> FactorSet {
        let bar = &last.bar;
        FactorSet {
            trend: last.ema_fast < last.ema_slow,
            momentum: self.config.sell_rsi.contains(last.rsi),
            macd: last.macd_hist < 0.0,
            rejection: bar.is_bearish() && bar.high > prev.bar.high,
            breakout: bar.close <= swing.low * (1.0 + self.config.breakout_tolerance),
            volatility: last.elevated_volatility,
            pattern: detect_engulfing(&prev.bar, bar).bearish,
        }
    }
}
