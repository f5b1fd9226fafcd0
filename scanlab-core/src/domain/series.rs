//! PriceSeries — a validated, chronologically ascending run of bars.

use crate::domain::bar::{normalize_volume, PriceBar};
use crate::error::InsufficientData;
use serde::{Deserialize, Serialize};

/// Highest high and lowest low over a trailing window of bars.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwingRange {
    pub high: f64,
    pub low: f64,
}

impl SwingRange {
    /// Swing range of `bars`, or `None` for an empty slice.
    pub fn of(bars: &[PriceBar]) -> Option<Self> {
        if bars.is_empty() {
            return None;
        }
        let high = bars.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
        let low = bars.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
        Some(Self { high, low })
    }

    /// Height of the range (`high - low`).
    pub fn diff(&self) -> f64 {
        self.high - self.low
    }
}

/// Ordered bar history for one instrument, most recent bar last.
///
/// Invariants enforced by [`PriceSeries::new`]:
/// - timestamps strictly increase (no duplicates, no descending runs)
/// - open/high/low/close are finite
/// - volume is positive (the sentinel replaces anything else)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn new(mut bars: Vec<PriceBar>) -> Result<Self, InsufficientData> {
        for (index, bar) in bars.iter_mut().enumerate() {
            if let Some(field) = bar.non_finite_field() {
                return Err(InsufficientData::NonFinite { index, field });
            }
            bar.volume = normalize_volume(Some(bar.volume));
        }

        if let Some(index) = bars
            .windows(2)
            .position(|w| w[1].timestamp <= w[0].timestamp)
        {
            return Err(InsufficientData::NotAscending {
                index: index + 1,
                previous: bars[index].timestamp,
                timestamp: bars[index + 1].timestamp,
            });
        }

        Ok(Self { bars })
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Most recent bar.
    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    /// The trailing `n` bars (or all of them when fewer exist).
    pub fn tail(&self, n: usize) -> &[PriceBar] {
        &self.bars[self.bars.len().saturating_sub(n)..]
    }
}
