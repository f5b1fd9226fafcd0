//! Directional trade signals emitted by the scorer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of an actionable signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalDirection {
    Buy,
    Sell,
}

impl SignalDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalDirection::Buy => "BUY",
            SignalDirection::Sell => "SELL",
        }
    }
}

impl fmt::Display for SignalDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scored signal: BUY, SELL, or NONE (`direction == None`).
///
/// NONE always carries a score of 0, regardless of how many factors held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    pub direction: Option<SignalDirection>,
    pub score: u8,
}

impl Signal {
    pub const NONE: Signal = Signal {
        direction: None,
        score: 0,
    };

    pub fn buy(score: u8) -> Self {
        Self {
            direction: Some(SignalDirection::Buy),
            score,
        }
    }

    pub fn sell(score: u8) -> Self {
        Self {
            direction: Some(SignalDirection::Sell),
            score,
        }
    }

    pub fn is_none(&self) -> bool {
        self.direction.is_none()
    }

    pub fn label(&self) -> &'static str {
        self.direction.map_or("NONE", |d| d.as_str())
    }
}

impl Default for Signal {
    fn default() -> Self {
        Self::NONE
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            Some(direction) => write!(f, "{direction} ({})", self.score),
            None => f.write_str("NONE"),
        }
    }
}
