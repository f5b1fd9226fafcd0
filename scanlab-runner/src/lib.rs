//! ScanLab Runner — configuration, quote sources, alert sinks, charts and
//! the scheduled scan loop.
//!
//! This crate builds on `scanlab-core` to provide:
//! - TOML configuration with secrets resolved from the environment
//! - Twelve Data (HTTP, with retry and circuit breaker) and CSV quote sources
//! - Telegram and log alert sinks behind a bounded delivery queue
//! - SVG signal charts
//! - Market calendar, scan cycles and the fixed-interval scheduler

pub mod alerts;
pub mod calendar;
pub mod chart;
pub mod config;
pub mod cycle;
pub mod quotes;
pub mod schedule;
pub mod setup;

pub use calendar::MarketCalendar;
pub use config::{ConfigError, ScannerConfig};
pub use cycle::{run_cycle, CycleReport, CycleSummary, InstrumentReport, InstrumentStatus};
pub use schedule::{run_scheduled, Schedule};
pub use setup::{build_scanner, SetupError};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn shared_components_are_send_sync() {
        assert_send::<alerts::QueuedAlertSink>();
        assert_sync::<alerts::QueuedAlertSink>();
        assert_sync::<quotes::TwelveDataSource>();
        assert_sync::<quotes::CsvQuoteSource>();
        assert_sync::<MarketCalendar>();
        assert_send::<CycleReport>();
    }
}
