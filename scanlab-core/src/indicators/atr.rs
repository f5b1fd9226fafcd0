//! Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|)
//! Seed: ATR[period-1] = mean(TR[0..period]).
//! Then Wilder smoothing: ATR[t] = (ATR[t-1] * (period-1) + TR[t]) / period.
//! Lookback: period - 1.

use super::Indicator;
use crate::domain::PriceBar;

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    name: String,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self {
            period,
            name: format!("atr_{period}"),
        }
    }
}

/// Compute the True Range series from bars.
/// TR[0] = high[0] - low[0] (no previous close).
/// TR[t] = max(high[t]-low[t], |high[t]-close[t-1]|, |low[t]-close[t-1]|).
pub fn true_range(bars: &[PriceBar]) -> Vec<f64> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            let hl = bar.high - bar.low;
            if i == 0 {
                return hl;
            }
            let prev_close = bars[i - 1].close;
            hl.max((bar.high - prev_close).abs())
                .max((bar.low - prev_close).abs())
        })
        .collect()
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<Option<f64>> {
        let n = bars.len();
        let mut result = vec![None; n];
        if n < self.period {
            return result;
        }

        let tr = true_range(bars);
        let p = self.period as f64;
        let mut atr = tr[..self.period].iter().sum::<f64>() / p;
        result[self.period - 1] = Some(atr);

        for i in self.period..n {
            atr = (atr * (p - 1.0) + tr[i]) / p;
            result[i] = Some(atr);
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};
    use chrono::NaiveDate;

    fn bar(day: u32, open: f64, high: f64, low: f64, close: f64) -> PriceBar {
        let ts = NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        PriceBar::new(ts, open, high, low, close, None)
    }

    #[test]
    fn true_range_uses_previous_close() {
        let bars = vec![
            bar(1, 10.0, 12.0, 9.0, 11.0),
            // Gap up: |high - prev_close| = 16 - 11 = 5 > high-low = 2
            bar(2, 15.0, 16.0, 14.0, 15.5),
            // Gap down: |low - prev_close| = |10 - 15.5| = 5.5
            bar(3, 11.0, 12.0, 10.0, 11.5),
        ];
        let tr = true_range(&bars);
        assert_eq!(tr, vec![3.0, 5.0, 5.5]);
    }

    #[test]
    fn atr_seed_is_mean_of_first_period() {
        let bars = vec![
            bar(1, 10.0, 12.0, 9.0, 11.0),
            bar(2, 15.0, 16.0, 14.0, 15.5),
            bar(3, 11.0, 12.0, 10.0, 11.5),
            bar(4, 11.5, 13.0, 11.0, 12.0),
        ];
        let result = Atr::new(3).compute(&bars);
        assert_eq!(result[0], None);
        assert_eq!(result[1], None);
        // mean(3, 5, 5.5) = 4.5
        assert_approx(result[2], 4.5, DEFAULT_EPSILON);
        // TR[3] = max(2, 1.5, 0.5) = 2 → (4.5*2 + 2)/3 = 11/3
        assert_approx(result[3], 11.0 / 3.0, DEFAULT_EPSILON);
    }

    #[test]
    fn atr_constant_range() {
        // make_bars on a flat series: every TR is exactly 2.0
        let result = Atr::new(14).compute(&make_bars(&[100.0; 30]));
        assert!(result[..13].iter().all(Option::is_none));
        assert_approx(result[13], 2.0, DEFAULT_EPSILON);
        assert_approx(result[29], 2.0, DEFAULT_EPSILON);
    }

    #[test]
    fn atr_short_series_is_undefined() {
        let result = Atr::new(14).compute(&make_bars(&[100.0; 10]));
        assert!(result.iter().all(Option::is_none));
    }

    #[test]
    fn atr_lookback() {
        assert_eq!(Atr::new(14).lookback(), 13);
        assert_eq!(Atr::new(14).name(), "atr_14");
    }
}
