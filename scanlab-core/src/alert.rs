//! Alert payload and the sink trait alerts are handed to.

use crate::chart::ChartRef;
use crate::domain::{Instrument, SignalDirection};
use crate::levels::LevelPair;
use chrono::NaiveDateTime;
use serde::Serialize;
use thiserror::Error;

/// A confirmed, de-duplicated signal ready for delivery.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub symbol: String,
    pub direction: SignalDirection,
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub score: u8,
    pub max_score: u8,
    /// Timestamp of the bar the signal was computed on.
    pub timestamp: NaiveDateTime,
    pub price_decimals: usize,
    pub chart: Option<ChartRef>,
}

impl Alert {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        instrument: &Instrument,
        direction: SignalDirection,
        entry: f64,
        levels: LevelPair,
        score: u8,
        max_score: u8,
        timestamp: NaiveDateTime,
        chart: Option<ChartRef>,
    ) -> Self {
        Self {
            symbol: instrument.symbol.clone(),
            direction,
            entry,
            stop_loss: levels.stop_loss,
            take_profit: levels.take_profit,
            score,
            max_score,
            timestamp,
            price_decimals: instrument.price_decimals,
            chart,
        }
    }

    /// Format a price with the instrument's precision.
    fn price(&self, value: f64) -> String {
        format!("{value:.prec$}", prec = self.price_decimals)
    }

    /// Human-readable alert text, shared by every sink.
    pub fn message(&self) -> String {
        format!(
            "📊 {direction} SIGNAL - {symbol}\n\
             🕐 {time}\n\
             Entry: {entry}\n\
             TP: {tp}\n\
             SL: {sl}\n\
             📌 Triple Indicator + Multi-Candle Confirmed\n\
             📈 Signal Strength: {score}/{max} 🔥",
            direction = self.direction,
            symbol = self.symbol,
            time = self.timestamp.format("%Y-%m-%d %H:%M"),
            entry = self.price(self.entry),
            tp = self.price(self.take_profit),
            sl = self.price(self.stop_loss),
            score = self.score,
            max = self.max_score,
        )
    }
}

#[derive(Debug, Error)]
pub enum AlertError {
    #[error("alert sink is not configured: {0}")]
    NotConfigured(String),

    #[error("alert queue is closed")]
    Disconnected,

    #[error("alert endpoint rejected the message (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Destination for alerts (chat bot, log, queue).
///
/// `deliver` should return quickly; slow transports sit behind a queue.
pub trait AlertSink: Send + Sync {
    fn name(&self) -> &str;

    fn deliver(&self, alert: Alert) -> Result<(), AlertError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn alert() -> Alert {
        let ts = NaiveDate::from_ymd_opt(2024, 6, 3)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        Alert::new(
            &Instrument::new("EUR/USD").with_price_decimals(5),
            SignalDirection::Buy,
            1.0845,
            LevelPair {
                stop_loss: 1.08,
                take_profit: 1.0912,
            },
            7,
            7,
            ts,
            None,
        )
    }

    #[test]
    fn message_format() {
        let text = alert().message();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "📊 BUY SIGNAL - EUR/USD");
        assert_eq!(lines[1], "🕐 2024-06-03 09:30");
        assert_eq!(lines[2], "Entry: 1.08450");
        assert_eq!(lines[3], "TP: 1.09120");
        assert_eq!(lines[4], "SL: 1.08000");
        assert_eq!(lines[6], "📈 Signal Strength: 7/7 🔥");
    }

    #[test]
    fn alert_copies_instrument_precision() {
        let a = alert();
        assert_eq!(a.symbol, "EUR/USD");
        assert_eq!(a.price_decimals, 5);
        assert!(a.chart.is_none());
    }

    #[test]
    fn default_precision_rounds_to_cents() {
        let ts = NaiveDate::from_ymd_opt(2024, 6, 3)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        let gold = Alert::new(
            &Instrument::new("XAU/USD"),
            SignalDirection::Sell,
            2034.567,
            LevelPair {
                stop_loss: 2040.0,
                take_profit: 2020.125,
            },
            7,
            7,
            ts,
            None,
        );
        let text = gold.message();
        assert!(text.contains("Entry: 2034.57"));
        assert!(text.contains("SL: 2040.00"));
    }
}
