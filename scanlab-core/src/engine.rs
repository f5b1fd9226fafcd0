//! Decision engine: price series in, scored signal with levels out.
//!
//! Pure and synchronous. The same series always yields the same decision.

use crate::domain::{PriceSeries, SignalDirection};
use crate::error::{EngineConfigError, InsufficientData, ScanError};
use crate::indicators::{IndicatorConfig, IndicatorEngine, IndicatorFrame};
use crate::levels::{DegeneracyGuard, LevelCalculator, LevelConfig, LevelPair};
use crate::scoring::{ScoreCard, ScoringConfig, SignalScorer, FACTOR_COUNT};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub indicators: IndicatorConfig,
    pub scoring: ScoringConfig,
    pub levels: LevelConfig,
}

impl EngineConfig {
    /// Bars a series needs so that both the last and the previous row are complete.
    pub fn min_bars(&self) -> usize {
        (self.indicators.warmup_bars() + 1)
            .max(self.scoring.swing_window)
            .max(2)
    }

    pub fn validate(&self) -> Result<(), EngineConfigError> {
        self.indicators.validate()?;
        self.scoring.validate()?;
        self.levels.validate()
    }
}

/// Outcome of the decision, after levels were checked.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    NoSignal,
    Signal {
        direction: SignalDirection,
        score: u8,
        levels: LevelPair,
    },
}

/// Full decision for the last bar of a series.
#[derive(Debug, Clone)]
pub struct Decision {
    pub card: ScoreCard,
    /// Close of the last bar.
    pub entry: f64,
    pub timestamp: NaiveDateTime,
    pub frame: IndicatorFrame,
    pub verdict: Verdict,
}

impl Decision {
    /// Direction, score and levels when a signal fired.
    pub fn signal(&self) -> Option<(SignalDirection, u8, LevelPair)> {
        match self.verdict {
            Verdict::Signal {
                direction,
                score,
                levels,
            } => Some((direction, score, levels)),
            Verdict::NoSignal => None,
        }
    }
}

/// Seam between the scanner and the decision logic.
pub trait Decider: Send + Sync {
    /// Shortest series `decide` accepts.
    fn min_bars(&self) -> usize;

    /// Maximum attainable score.
    fn max_score(&self) -> u8 {
        FACTOR_COUNT
    }

    /// Decide on the last bar of `series`. `guard` overrides the configured
    /// degeneracy guard for this call.
    fn decide(
        &self,
        series: &PriceSeries,
        guard: Option<&DegeneracyGuard>,
    ) -> Result<Decision, ScanError>;
}

#[derive(Debug, Clone)]
pub struct DecisionEngine {
    config: EngineConfig,
    indicators: IndicatorEngine,
    scorer: SignalScorer,
    levels: LevelCalculator,
}

impl DecisionEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            indicators: IndicatorEngine::new(config.indicators.clone()),
            scorer: SignalScorer::new(config.scoring.clone()),
            levels: LevelCalculator::new(config.levels.clone()),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl Default for DecisionEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Decider for DecisionEngine {
    fn min_bars(&self) -> usize {
        self.config.min_bars()
    }

    fn decide(
        &self,
        series: &PriceSeries,
        guard: Option<&DegeneracyGuard>,
    ) -> Result<Decision, ScanError> {
        let required = self.min_bars();
        let last = match series.last() {
            Some(bar) if series.len() >= required => *bar,
            _ => {
                return Err(InsufficientData::TooFewBars {
                    required,
                    actual: series.len(),
                }
                .into())
            }
        };

        let frame = self.indicators.compute(series);
        let card = self.scorer.score(&frame)?;
        debug!(
            buy_score = card.buy_score(),
            sell_score = card.sell_score(),
            buy_failing = ?card.buy.failing(),
            sell_failing = ?card.sell.failing(),
            "factor breakdown"
        );

        let entry = last.close;
        let verdict = match card.signal.direction {
            None => Verdict::NoSignal,
            Some(direction) => {
                match self.levels.compute(direction, entry, &card.swing, guard) {
                    Some(levels) => Verdict::Signal {
                        direction,
                        score: card.signal.score,
                        levels,
                    },
                    None => {
                        let raw = self.levels.raw_levels(direction, &card.swing);
                        return Err(ScanError::DegenerateLevels {
                            direction,
                            score: card.signal.score,
                            entry,
                            stop_loss: raw.stop_loss,
                            take_profit: raw.take_profit,
                        });
                    }
                }
            }
        };

        Ok(Decision {
            card,
            entry,
            timestamp: last.timestamp,
            frame,
            verdict,
        })
    }
}
