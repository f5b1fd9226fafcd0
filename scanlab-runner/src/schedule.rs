//! Fixed-interval scheduler loop.
//!
//! The first cycle runs immediately, later cycles every `interval` measured
//! from the start of the previous one. A cycle that overruns the interval
//! is followed directly by the next. The stop flag is polled in short ticks
//! so Ctrl-C takes effect within one tick.

use crate::calendar::MarketCalendar;
use crate::config::ScheduleConfig;
use crate::cycle::{run_cycle, CycleReport};
use chrono::Utc;
use scanlab_core::domain::Instrument;
use scanlab_core::Scanner;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub interval: Duration,
    pub parallel: bool,
    /// How often the stop flag is checked while waiting.
    pub tick: Duration,
}

impl Schedule {
    pub fn from_config(config: &ScheduleConfig) -> Self {
        Self {
            interval: Duration::from_secs(config.interval_minutes * 60),
            parallel: config.parallel,
            tick: Duration::from_millis(250),
        }
    }
}

/// Run cycles until `stop` is set. Returns the number of cycles completed.
pub fn run_scheduled<F>(
    scanner: &Scanner,
    calendar: &MarketCalendar,
    instruments: &[Instrument],
    schedule: Schedule,
    stop: &AtomicBool,
    mut on_cycle: F,
) -> usize
where
    F: FnMut(&CycleReport),
{
    info!(
        interval_secs = schedule.interval.as_secs(),
        instruments = instruments.len(),
        "scheduler started"
    );
    let mut cycles = 0;

    while !stop.load(Ordering::SeqCst) {
        let started = Instant::now();
        let report = run_cycle(scanner, calendar, instruments, schedule.parallel, Utc::now());
        cycles += 1;
        on_cycle(&report);

        let next = started + schedule.interval;
        while !stop.load(Ordering::SeqCst) {
            let now = Instant::now();
            if now >= next {
                break;
            }
            std::thread::sleep(schedule.tick.min(next - now));
        }
    }

    info!(cycles, "scheduler stopped");
    cycles
}
