//! Error kinds for a single-instrument scan.
//!
//! No variant is fatal to a scan cycle: the cycle runner records the error
//! against the instrument and moves on to the next one.

use crate::alert::AlertError;
use crate::data::DataError;
use crate::domain::SignalDirection;
use chrono::NaiveDateTime;
use thiserror::Error;

/// Why a series cannot be evaluated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InsufficientData {
    #[error("need at least {required} bars, got {actual}")]
    TooFewBars { required: usize, actual: usize },

    #[error("bar {index} at {timestamp} does not follow {previous} (timestamps must strictly increase)")]
    NotAscending {
        index: usize,
        previous: NaiveDateTime,
        timestamp: NaiveDateTime,
    },

    #[error("bar {index} has a non-finite {field}")]
    NonFinite { index: usize, field: &'static str },

    #[error("indicators at bar {index} are still warming up")]
    IncompleteIndicators { index: usize },
}

/// Rejected engine settings. Field paths are relative to the engine section.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineConfigError {
    #[error("indicators.{name} must be >= 1")]
    ZeroPeriod { name: &'static str },

    #[error("indicators.{fast} ({fast_period}) must be shorter than {slow} ({slow_period})")]
    InvertedPeriods {
        fast: &'static str,
        fast_period: usize,
        slow: &'static str,
        slow_period: usize,
    },

    #[error("indicators.volatility_factor must be positive, got {0}")]
    VolatilityFactor(f64),

    #[error("scoring.min_score must be in 1..={max}, got {min_score}")]
    MinScoreOutOfRange { min_score: u8, max: u8 },

    #[error("scoring.{name}: lower ({lower}) must be below upper ({upper})")]
    BadBand {
        name: &'static str,
        lower: f64,
        upper: f64,
    },

    #[error("scoring.breakout_tolerance must be in [0, 1), got {0}")]
    BreakoutTolerance(f64),

    #[error("scoring.swing_window must be >= 1")]
    ZeroSwingWindow,

    #[error("levels.extension_ratio must be a non-negative number, got {0}")]
    ExtensionRatio(f64),

    #[error("degeneracy guard {field} out of range: {value}")]
    BadGuard { field: &'static str, value: f64 },
}

/// Failure of one instrument's scan.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Series too short or malformed. No state is mutated; retried next cycle.
    #[error("insufficient data: {0}")]
    DataInsufficient(#[from] InsufficientData),

    /// A signal fired but its levels sit too close to the entry to be usable.
    /// The state tracker is not updated, so the signal re-evaluates next cycle.
    #[error(
        "degenerate levels for {direction} (score {score}): entry {entry}, stop {stop_loss}, target {take_profit}"
    )]
    DegenerateLevels {
        direction: SignalDirection,
        score: u8,
        entry: f64,
        stop_loss: f64,
        take_profit: f64,
    },

    /// The quote source failed or returned nothing usable.
    #[error("upstream failure: {0}")]
    UpstreamFailure(#[from] DataError),

    /// The alert could not be handed to the alert sink.
    #[error("alert delivery failed: {0}")]
    AlertFailed(#[from] AlertError),
}

impl ScanError {
    /// Short machine-friendly tag for logs and cycle reports.
    pub fn kind(&self) -> &'static str {
        match self {
            ScanError::DataInsufficient(_) => "data_insufficient",
            ScanError::DegenerateLevels { .. } => "degenerate_levels",
            ScanError::UpstreamFailure(_) => "upstream_failure",
            ScanError::AlertFailed(_) => "alert_failed",
        }
    }
}
