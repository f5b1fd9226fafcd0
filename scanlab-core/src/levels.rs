//! Stop-loss / take-profit derivation from the trailing swing range.
//!
//! BUY:  stop = swing low,  target = swing high + range × extension
//! SELL: stop = swing high, target = swing low  − range × extension
//!
//! A pair whose stop or target sits closer to the entry than the degeneracy
//! guard allows is rejected.

use crate::domain::{SignalDirection, SwingRange};
use crate::error::EngineConfigError;
use serde::{Deserialize, Serialize};

/// Extension ratio applied to the swing range for the take-profit.
pub const FIBONACCI_EXTENSION: f64 = 0.618;

/// Retracement ratios drawn on charts, measured down from the swing high.
pub const RETRACEMENT_RATIOS: [f64; 6] = [0.0, 0.236, 0.382, 0.5, 0.618, 1.0];

/// Minimum distance a level must keep from the entry price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DegeneracyGuard {
    /// Fixed distance in price units.
    Absolute { min_distance: f64 },
    /// Fraction of the entry price.
    Relative { min_fraction: f64 },
}

impl DegeneracyGuard {
    pub fn min_distance(&self, entry: f64) -> f64 {
        match *self {
            DegeneracyGuard::Absolute { min_distance } => min_distance,
            DegeneracyGuard::Relative { min_fraction } => entry.abs() * min_fraction,
        }
    }

    pub fn validate(&self) -> Result<(), EngineConfigError> {
        match *self {
            DegeneracyGuard::Absolute { min_distance } => {
                if !min_distance.is_finite() || min_distance < 0.0 {
                    return Err(EngineConfigError::BadGuard {
                        field: "min_distance",
                        value: min_distance,
                    });
                }
            }
            DegeneracyGuard::Relative { min_fraction } => {
                if !(0.0..1.0).contains(&min_fraction) {
                    return Err(EngineConfigError::BadGuard {
                        field: "min_fraction",
                        value: min_fraction,
                    });
                }
            }
        }
        Ok(())
    }
}

impl Default for DegeneracyGuard {
    fn default() -> Self {
        DegeneracyGuard::Absolute { min_distance: 0.2 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    pub extension_ratio: f64,
    pub guard: DegeneracyGuard,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            extension_ratio: FIBONACCI_EXTENSION,
            guard: DegeneracyGuard::default(),
        }
    }
}

impl LevelConfig {
    pub fn validate(&self) -> Result<(), EngineConfigError> {
        if !self.extension_ratio.is_finite() || self.extension_ratio < 0.0 {
            return Err(EngineConfigError::ExtensionRatio(self.extension_ratio));
        }
        self.guard.validate()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelPair {
    pub stop_loss: f64,
    pub take_profit: f64,
}

/// One horizontal retracement line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FibLevel {
    pub ratio: f64,
    pub price: f64,
}

/// `high − range × r` for every ratio in [`RETRACEMENT_RATIOS`].
pub fn fibonacci_retracements(swing: &SwingRange) -> Vec<FibLevel> {
    RETRACEMENT_RATIOS
        .iter()
        .map(|&ratio| FibLevel {
            ratio,
            price: swing.high - swing.diff() * ratio,
        })
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct LevelCalculator {
    config: LevelConfig,
}

impl LevelCalculator {
    pub fn new(config: LevelConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LevelConfig {
        &self.config
    }

    /// Levels before the degeneracy check.
    pub fn raw_levels(&self, direction: SignalDirection, swing: &SwingRange) -> LevelPair {
        let extension = swing.diff() * self.config.extension_ratio;
        match direction {
            SignalDirection::Buy => LevelPair {
                stop_loss: swing.low,
                take_profit: swing.high + extension,
            },
            SignalDirection::Sell => LevelPair {
                stop_loss: swing.high,
                take_profit: swing.low - extension,
            },
        }
    }

    /// Either level closer to `entry` than the guard's minimum distance.
    pub fn is_degenerate(pair: &LevelPair, entry: f64, guard: &DegeneracyGuard) -> bool {
        let min = guard.min_distance(entry);
        (pair.take_profit - entry).abs() < min || (pair.stop_loss - entry).abs() < min
    }

    /// Usable levels for a signal at `entry`, or `None` when degenerate.
    ///
    /// `guard` overrides the configured guard (per-instrument settings).
    pub fn compute(
        &self,
        direction: SignalDirection,
        entry: f64,
        swing: &SwingRange,
        guard: Option<&DegeneracyGuard>,
    ) -> Option<LevelPair> {
        let pair = self.raw_levels(direction, swing);
        let guard = guard.unwrap_or(&self.config.guard);
        if Self::is_degenerate(&pair, entry, guard) {
            None
        } else {
            Some(pair)
        }
    }
}
