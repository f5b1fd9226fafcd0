//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = alpha * close[t] + (1 - alpha) * EMA[t-1], alpha = 2 / (period + 1)
//! Seed: EMA[0] = close[0] (no SMA seed); the recursion runs from the first bar.
//! Values before index period - 1 are undefined even though the recursion has started.
//! Lookback: period - 1.

use super::Indicator;
use crate::domain::PriceBar;

#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    name: String,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "EMA period must be >= 1");
        Self {
            period,
            name: format!("ema_{period}"),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<Option<f64>> {
        let closes: Vec<Option<f64>> = bars.iter().map(|b| Some(b.close)).collect();
        ema_of_series(&closes, self.period)
    }
}

/// EMA of an arbitrary optional series.
///
/// Leading `None`s are skipped; the first defined value seeds the recursion and
/// output becomes defined once `period` values have been observed. A `None`
/// after seeding taints every later value. Used directly by MACD for the
/// signal line.
pub fn ema_of_series(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; values.len()];
    if period == 0 {
        return result;
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    let mut prev: Option<f64> = None;
    let mut observed = 0usize;

    for (i, value) in values.iter().enumerate() {
        let Some(v) = *value else {
            if prev.is_some() {
                break;
            }
            continue;
        };
        let ema = match prev {
            None => v,
            Some(p) => alpha * v + (1.0 - alpha) * p,
        };
        prev = Some(ema);
        observed += 1;
        if observed >= period {
            result[i] = Some(ema);
        }
    }

    result
}
