//! The seven confirmation factors evaluated for each direction.

use serde::Serialize;

/// Number of factors; the maximum attainable score.
pub const FACTOR_COUNT: u8 = 7;

/// Pass/fail outcome of every factor for one direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FactorSet {
    /// EMA fast above (BUY) or below (SELL) EMA slow.
    pub trend: bool,
    /// RSI strictly inside the direction's band.
    pub momentum: bool,
    /// MACD histogram positive (BUY) or negative (SELL).
    pub macd: bool,
    /// Directional candle that pierced the previous bar's low (BUY) or high (SELL).
    pub rejection: bool,
    /// Close within the breakout tolerance of the swing high (BUY) or low (SELL).
    pub breakout: bool,
    /// Elevated volatility. Shared by both directions.
    pub volatility: bool,
    /// Bullish (BUY) or bearish (SELL) engulfing.
    pub pattern: bool,
}

impl FactorSet {
    fn entries(&self) -> [(&'static str, bool); FACTOR_COUNT as usize] {
        [
            ("trend", self.trend),
            ("momentum", self.momentum),
            ("macd", self.macd),
            ("rejection", self.rejection),
            ("breakout", self.breakout),
            ("volatility", self.volatility),
            ("pattern", self.pattern),
        ]
    }

    /// Number of passing factors, `0..=7`.
    pub fn score(&self) -> u8 {
        self.entries().iter().filter(|(_, pass)| *pass).count() as u8
    }

    /// Names of the factors that did not pass, in evaluation order.
    pub fn failing(&self) -> Vec<&'static str> {
        self.entries()
            .iter()
            .filter(|(_, pass)| !*pass)
            .map(|(name, _)| *name)
            .collect()
    }

    pub fn all_pass() -> Self {
        Self {
            trend: true,
            momentum: true,
            macd: true,
            rejection: true,
            breakout: true,
            volatility: true,
            pattern: true,
        }
    }
}
