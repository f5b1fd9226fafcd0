//! ScanLab Core — indicators, signal scoring, levels and the scan orchestrator.
//!
//! This crate contains the decision engine of the scanner:
//! - Domain types (bars, validated series, signals, instruments)
//! - Indicator frame (EMA, RSI, MACD, ATR, volatility regime)
//! - Engulfing pattern detection
//! - Seven-factor signal scorer and take-profit / stop-loss levels
//! - Per-instrument signal tracker for duplicate suppression
//! - Collaborator traits (quote source, alert sink, chart renderer) and the
//!   single-instrument scan that wires them together

pub mod alert;
pub mod chart;
pub mod data;
pub mod domain;
pub mod engine;
pub mod error;
pub mod indicators;
pub mod levels;
pub mod patterns;
pub mod scan;
pub mod scoring;
pub mod state;

pub use engine::{Decider, Decision, DecisionEngine, EngineConfig, Verdict};
pub use error::{EngineConfigError, InsufficientData, ScanError};
pub use scan::{ScanOutcome, Scanner};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything a parallel scan cycle shares is Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::PriceBar>();
        require_sync::<domain::PriceBar>();
        require_send::<domain::PriceSeries>();
        require_sync::<domain::PriceSeries>();
        require_send::<domain::Instrument>();
        require_sync::<domain::Instrument>();
        require_send::<indicators::IndicatorFrame>();
        require_sync::<indicators::IndicatorFrame>();
        require_send::<DecisionEngine>();
        require_sync::<DecisionEngine>();
        require_send::<state::SignalStateTracker>();
        require_sync::<state::SignalStateTracker>();
        require_send::<alert::Alert>();
        require_sync::<alert::Alert>();
        require_send::<ScanError>();
        require_sync::<ScanError>();
        require_sync::<Scanner>();
    }
}
