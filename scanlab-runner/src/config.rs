//! Scanner configuration loaded from TOML.
//!
//! Secrets are never stored in the file; the file names the environment
//! variables that hold them.

use chrono::Weekday;
use chrono_tz::Tz;
use scanlab_core::domain::Instrument;
use scanlab_core::{EngineConfig, EngineConfigError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("invalid config: engine.{0}")]
    Engine(#[from] EngineConfigError),

    #[error("invalid config: instrument {symbol}: {source}")]
    Guard {
        symbol: String,
        #[source]
        source: EngineConfigError,
    },

    #[error("environment variable {name} is not set")]
    MissingEnv { name: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub interval_minutes: u64,
    /// Scan instruments of one cycle in parallel.
    pub parallel: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_minutes: 30,
            parallel: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteProvider {
    TwelveData,
    Csv,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotesConfig {
    pub provider: QuoteProvider,
    /// Bar interval passed to the provider, e.g. `"30min"`.
    pub interval: String,
    pub output_size: usize,
    pub api_key_env: String,
    pub csv_dir: PathBuf,
}

impl Default for QuotesConfig {
    fn default() -> Self {
        Self {
            provider: QuoteProvider::TwelveData,
            interval: "30min".into(),
            output_size: 100,
            api_key_env: "TWELVE_DATA_API_KEY".into(),
            csv_dir: PathBuf::from("data"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    /// IANA time zone name used to decide the current weekday.
    pub timezone: String,
    pub trading_days: Vec<Weekday>,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            timezone: "Asia/Kolkata".into(),
            trading_days: vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ],
        }
    }
}

impl CalendarConfig {
    pub fn tz(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| ConfigError::Invalid(format!("unknown time zone '{}'", self.timezone)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkKind {
    Telegram,
    Log,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertsConfig {
    pub sink: SinkKind,
    pub bot_token_env: String,
    pub chat_id_env: String,
    /// Alerts buffered ahead of the delivery thread.
    pub queue_capacity: usize,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            sink: SinkKind::Log,
            bot_token_env: "TELEGRAM_BOT_TOKEN".into(),
            chat_id_env: "TELEGRAM_CHAT_ID".into(),
            queue_capacity: 64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartsConfig {
    pub enabled: bool,
    pub output_dir: PathBuf,
    /// Trailing bars drawn on each chart.
    pub bars: usize,
}

impl Default for ChartsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            output_dir: PathBuf::from("charts"),
            bars: 30,
        }
    }
}

/// Top-level scanner configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScannerConfig {
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub quotes: QuotesConfig,
    #[serde(default)]
    pub calendar: CalendarConfig,
    #[serde(default)]
    pub alerts: AlertsConfig,
    #[serde(default)]
    pub charts: ChartsConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    pub instruments: Vec<Instrument>,
}

impl ScannerConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.instruments.is_empty() {
            return Err(ConfigError::Invalid("no instruments configured".into()));
        }

        let mut seen = HashSet::new();
        for inst in &self.instruments {
            if inst.symbol.trim().is_empty() {
                return Err(ConfigError::Invalid("instrument with empty symbol".into()));
            }
            if !seen.insert(inst.symbol.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate instrument '{}'",
                    inst.symbol
                )));
            }
            if let Some(guard) = &inst.degeneracy {
                guard.validate().map_err(|source| ConfigError::Guard {
                    symbol: inst.symbol.clone(),
                    source,
                })?;
            }
        }

        if self.schedule.interval_minutes == 0 {
            return Err(ConfigError::Invalid(
                "schedule.interval_minutes must be >= 1".into(),
            ));
        }

        self.engine.validate()?;

        let min_bars = self.engine.min_bars();
        if self.quotes.output_size < min_bars {
            return Err(ConfigError::Invalid(format!(
                "quotes.output_size ({}) is below the engine warm-up of {min_bars} bars",
                self.quotes.output_size
            )));
        }
        if self.quotes.interval.trim().is_empty() {
            return Err(ConfigError::Invalid("quotes.interval is empty".into()));
        }

        self.calendar.tz()?;

        if self.alerts.queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "alerts.queue_capacity must be >= 1".into(),
            ));
        }
        if self.charts.enabled && self.charts.bars < 2 {
            return Err(ConfigError::Invalid("charts.bars must be >= 2".into()));
        }

        Ok(())
    }
}

/// Read a required secret from the environment.
pub fn env_secret(name: &str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingEnv {
            name: name.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanlab_core::levels::DegeneracyGuard;

    const FULL: &str = r#"
[schedule]
interval_minutes = 15
parallel = true

[quotes]
provider = "csv"
interval = "15min"
output_size = 120
csv_dir = "fixtures"

[calendar]
timezone = "Europe/London"
trading_days = ["Mon", "Tue", "Wed"]

[alerts]
sink = "telegram"
bot_token_env = "BOT"
chat_id_env = "CHAT"

[charts]
enabled = true
output_dir = "out"
bars = 40

[engine.scoring]
min_score = 6

[engine.levels.guard]
mode = "absolute"
min_distance = 0.5

[[instruments]]
symbol = "BTC/USD"
always_open = true

[[instruments]]
symbol = "EUR/USD"
price_decimals = 5
degeneracy = { mode = "relative", min_fraction = 0.0005 }
"#;

    #[test]
    fn parses_full_config() {
        let config = ScannerConfig::from_toml(FULL).unwrap();
        assert_eq!(config.schedule.interval_minutes, 15);
        assert!(config.schedule.parallel);
        assert_eq!(config.quotes.provider, QuoteProvider::Csv);
        assert_eq!(config.quotes.output_size, 120);
        assert_eq!(
            config.calendar.trading_days,
            vec![Weekday::Mon, Weekday::Tue, Weekday::Wed]
        );
        assert_eq!(config.alerts.sink, SinkKind::Telegram);
        assert_eq!(config.alerts.bot_token_env, "BOT");
        assert_eq!(config.charts.bars, 40);
        assert_eq!(config.engine.scoring.min_score, 6);
        assert_eq!(config.engine.scoring.swing_window, 10);
        assert_eq!(
            config.engine.levels.guard,
            DegeneracyGuard::Absolute { min_distance: 0.5 }
        );
        assert!(config.instruments[0].always_open);
        assert_eq!(config.instruments[1].price_decimals, 5);
        assert_eq!(
            config.instruments[1].degeneracy,
            Some(DegeneracyGuard::Relative {
                min_fraction: 0.0005
            })
        );
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let config = ScannerConfig::from_toml(
            r#"
[[instruments]]
symbol = "XAU/USD"
"#,
        )
        .unwrap();
        assert_eq!(config.schedule, ScheduleConfig::default());
        assert_eq!(config.quotes.provider, QuoteProvider::TwelveData);
        assert_eq!(config.alerts.sink, SinkKind::Log);
        assert_eq!(config.engine, EngineConfig::default());
        assert_eq!(config.instruments[0].price_decimals, 2);
    }

    #[test]
    fn rejects_empty_instruments() {
        let err = ScannerConfig::from_toml("instruments = []").unwrap_err();
        assert!(err.to_string().contains("no instruments"));
    }

    #[test]
    fn rejects_duplicate_symbols() {
        let err = ScannerConfig::from_toml(
            r#"
[[instruments]]
symbol = "EUR/USD"
[[instruments]]
symbol = "EUR/USD"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("duplicate instrument 'EUR/USD'"));
    }

    #[test]
    fn rejects_short_output_size() {
        let err = ScannerConfig::from_toml(
            r#"
[quotes]
output_size = 40
[[instruments]]
symbol = "EUR/USD"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("warm-up of 51 bars"));
    }

    #[test]
    fn rejects_unknown_timezone() {
        let err = ScannerConfig::from_toml(
            r#"
[calendar]
timezone = "Mars/Olympus"
[[instruments]]
symbol = "EUR/USD"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Mars/Olympus"));
    }

    #[test]
    fn rejects_bad_engine_section() {
        let err = ScannerConfig::from_toml(
            r#"
[engine.scoring]
min_score = 9
[[instruments]]
symbol = "EUR/USD"
"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Engine(EngineConfigError::MinScoreOutOfRange { min_score: 9, max: 7 })
        ));
        assert!(err.to_string().contains("engine.scoring.min_score"));
    }

    #[test]
    fn rejects_bad_instrument_guard() {
        let err = ScannerConfig::from_toml(
            r#"
[[instruments]]
symbol = "XAU/USD"
degeneracy = { mode = "absolute", min_distance = -1.0 }
"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Guard { ref symbol, source: EngineConfigError::BadGuard { field: "min_distance", .. } }
                if symbol == "XAU/USD"
        ));
    }

    #[test]
    fn from_file_reports_missing_path() {
        let err = ScannerConfig::from_file(Path::new("/nonexistent/scanlab.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn from_file_reads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scanlab.toml");
        std::fs::write(&path, FULL).unwrap();
        let config = ScannerConfig::from_file(&path).unwrap();
        assert_eq!(config.instruments.len(), 2);
    }

    #[test]
    fn missing_env_secret() {
        let err = env_secret("SCANLAB_TEST_SURELY_UNSET_VARIABLE").unwrap_err();
        assert_eq!(
            err.to_string(),
            "environment variable SCANLAB_TEST_SURELY_UNSET_VARIABLE is not set"
        );
    }
}
