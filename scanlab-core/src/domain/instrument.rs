//! Instrument metadata used by the scanner.

use crate::levels::DegeneracyGuard;
use serde::{Deserialize, Serialize};

fn default_price_decimals() -> usize {
    2
}

/// A scanned instrument (e.g. `"EUR/USD"`, `"BTC/USD"`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Instrument {
    pub symbol: String,

    /// Trades around the clock; bypasses the market calendar.
    #[serde(default)]
    pub always_open: bool,

    /// Decimal places used when formatting prices in alerts.
    #[serde(default = "default_price_decimals")]
    pub price_decimals: usize,

    /// Per-instrument override of the engine's level degeneracy guard.
    #[serde(default)]
    pub degeneracy: Option<DegeneracyGuard>,
}

impl Instrument {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            always_open: false,
            price_decimals: default_price_decimals(),
            degeneracy: None,
        }
    }

    pub fn always_open(mut self) -> Self {
        self.always_open = true;
        self
    }

    pub fn with_price_decimals(mut self, decimals: usize) -> Self {
        self.price_decimals = decimals;
        self
    }

    pub fn with_degeneracy(mut self, guard: DegeneracyGuard) -> Self {
        self.degeneracy = Some(guard);
        self
    }

    /// Symbol with separators removed, safe for file names (`"EUR/USD"` → `"EURUSD"`).
    pub fn file_stem(&self) -> String {
        self.symbol
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect()
    }
}
