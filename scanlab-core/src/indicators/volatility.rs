//! Elevated-volatility regime flag.
//!
//! Flag[t] = ATR[t] > factor * mean(ATR[t-window+1..=t])
//! Undefined until `window` consecutive ATR values exist.

/// Window and factor of the elevated-volatility comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolatilityRegime {
    pub window: usize,
    pub factor: f64,
}

impl VolatilityRegime {
    pub fn new(window: usize, factor: f64) -> Self {
        assert!(window >= 1, "volatility window must be >= 1");
        Self { window, factor }
    }

    /// Index of the first defined flag given the ATR's own lookback.
    pub fn lookback(&self, atr_lookback: usize) -> usize {
        atr_lookback + self.window - 1
    }

    pub fn classify(&self, atr: &[Option<f64>]) -> Vec<Option<bool>> {
        elevated_volatility(atr, self.window, self.factor)
    }
}

impl Default for VolatilityRegime {
    fn default() -> Self {
        Self::new(10, 0.8)
    }
}

/// Flag each bar whose ATR exceeds `factor` times its trailing `window` mean.
pub fn elevated_volatility(atr: &[Option<f64>], window: usize, factor: f64) -> Vec<Option<bool>> {
    let mut result = vec![None; atr.len()];
    if window == 0 {
        return result;
    }

    for i in (window - 1)..atr.len() {
        let trailing = &atr[i + 1 - window..=i];
        let sum: Option<f64> = trailing.iter().copied().sum();
        if let (Some(sum), Some(current)) = (sum, atr[i]) {
            result[i] = Some(current > factor * (sum / window as f64));
        }
    }

    result
}
