//! One scan cycle over the configured instruments.
//!
//! Every instrument gets an entry in the report. A failing instrument never
//! stops the cycle; its error kind and message are recorded instead.

use crate::calendar::MarketCalendar;
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use scanlab_core::domain::{Instrument, SignalDirection};
use scanlab_core::{ScanOutcome, Scanner};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InstrumentStatus {
    NoSignal {
        buy_score: u8,
        sell_score: u8,
    },
    Duplicate {
        direction: SignalDirection,
        score: u8,
    },
    Alerted {
        direction: SignalDirection,
        score: u8,
        entry: f64,
        stop_loss: f64,
        take_profit: f64,
        chart: Option<String>,
    },
    MarketClosed,
    Failed {
        kind: &'static str,
        message: String,
    },
}

impl From<ScanOutcome> for InstrumentStatus {
    fn from(outcome: ScanOutcome) -> Self {
        match outcome {
            ScanOutcome::NoSignal {
                buy_score,
                sell_score,
            } => InstrumentStatus::NoSignal {
                buy_score,
                sell_score,
            },
            ScanOutcome::Duplicate { direction, score } => {
                InstrumentStatus::Duplicate { direction, score }
            }
            ScanOutcome::Alerted(alert) => InstrumentStatus::Alerted {
                direction: alert.direction,
                score: alert.score,
                entry: alert.entry,
                stop_loss: alert.stop_loss,
                take_profit: alert.take_profit,
                chart: alert.chart.map(|c| c.path().display().to_string()),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstrumentReport {
    pub symbol: String,
    #[serde(flatten)]
    pub status: InstrumentStatus,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CycleSummary {
    pub scanned: usize,
    pub alerted: usize,
    pub duplicates: usize,
    pub no_signal: usize,
    pub market_closed: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub instruments: Vec<InstrumentReport>,
}

impl CycleReport {
    pub fn summary(&self) -> CycleSummary {
        let mut s = CycleSummary::default();
        for entry in &self.instruments {
            match entry.status {
                InstrumentStatus::MarketClosed => {
                    s.market_closed += 1;
                    continue;
                }
                InstrumentStatus::NoSignal { .. } => s.no_signal += 1,
                InstrumentStatus::Duplicate { .. } => s.duplicates += 1,
                InstrumentStatus::Alerted { .. } => s.alerted += 1,
                InstrumentStatus::Failed { .. } => s.failed += 1,
            }
            s.scanned += 1;
        }
        s
    }
}

fn scan_one(
    scanner: &Scanner,
    calendar: &MarketCalendar,
    instrument: &Instrument,
    now: DateTime<Utc>,
) -> InstrumentReport {
    let status = if !calendar.is_open(instrument, now) {
        info!(symbol = %instrument.symbol, "market closed, skipping");
        InstrumentStatus::MarketClosed
    } else {
        match scanner.scan(instrument) {
            Ok(outcome) => outcome.into(),
            Err(err) => {
                warn!(symbol = %instrument.symbol, kind = err.kind(), error = %err, "scan failed");
                InstrumentStatus::Failed {
                    kind: err.kind(),
                    message: err.to_string(),
                }
            }
        }
    };
    InstrumentReport {
        symbol: instrument.symbol.clone(),
        status,
    }
}

/// Scan every instrument once. Report order matches `instruments`.
pub fn run_cycle(
    scanner: &Scanner,
    calendar: &MarketCalendar,
    instruments: &[Instrument],
    parallel: bool,
    now: DateTime<Utc>,
) -> CycleReport {
    let local = now.with_timezone(&calendar.timezone());
    info!(
        at = %local.format("%Y-%m-%d %H:%M %Z"),
        instruments = instruments.len(),
        parallel,
        "scan cycle started"
    );

    let entries: Vec<InstrumentReport> = if parallel {
        instruments
            .par_iter()
            .map(|inst| scan_one(scanner, calendar, inst, now))
            .collect()
    } else {
        instruments
            .iter()
            .map(|inst| scan_one(scanner, calendar, inst, now))
            .collect()
    };

    let report = CycleReport {
        started_at: now,
        instruments: entries,
    };
    let s = report.summary();
    info!(
        scanned = s.scanned,
        alerted = s.alerted,
        duplicates = s.duplicates,
        no_signal = s.no_signal,
        market_closed = s.market_closed,
        failed = s.failed,
        "scan cycle finished"
    );
    report
}
