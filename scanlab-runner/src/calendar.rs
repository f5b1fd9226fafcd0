//! Market-hours gate.
//!
//! Trading days are judged in the configured time zone, so a Friday-night
//! cycle in New York can already be Saturday in Kolkata. Instruments marked
//! `always_open` skip the gate.

use crate::config::{CalendarConfig, ConfigError};
use chrono::{DateTime, Datelike, Utc, Weekday};
use chrono_tz::Tz;
use scanlab_core::domain::Instrument;

#[derive(Debug, Clone)]
pub struct MarketCalendar {
    tz: Tz,
    trading_days: Vec<Weekday>,
}

impl MarketCalendar {
    pub fn new(tz: Tz, trading_days: Vec<Weekday>) -> Self {
        Self { tz, trading_days }
    }

    pub fn from_config(config: &CalendarConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(config.tz()?, config.trading_days.clone()))
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn is_trading_day(&self, now: DateTime<Utc>) -> bool {
        let local = now.with_timezone(&self.tz);
        self.trading_days.contains(&local.weekday())
    }

    pub fn is_open(&self, instrument: &Instrument, now: DateTime<Utc>) -> bool {
        instrument.always_open || self.is_trading_day(now)
    }
}

impl Default for MarketCalendar {
    fn default() -> Self {
        Self::new(
            chrono_tz::Asia::Kolkata,
            CalendarConfig::default().trading_days,
        )
    }
}
