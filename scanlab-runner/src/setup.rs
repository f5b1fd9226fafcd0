//! Builds a ready-to-run [`Scanner`] from a [`ScannerConfig`].
//!
//! Secrets are resolved here, once, so a missing API key or bot token fails
//! at startup rather than on the first alert.

use crate::alerts::{LogSink, QueuedAlertSink, TelegramSink};
use crate::chart::SvgChartRenderer;
use crate::config::{env_secret, ConfigError, QuoteProvider, ScannerConfig, SinkKind};
use crate::quotes::{CircuitBreaker, CsvQuoteSource, TwelveDataSource};
use scanlab_core::alert::{AlertError, AlertSink};
use scanlab_core::data::{DataError, QuoteSource};
use scanlab_core::{DecisionEngine, Scanner};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("quote source: {0}")]
    Quotes(#[from] DataError),

    #[error("alert sink: {0}")]
    Alerts(#[from] AlertError),

    #[error("failed to start alert dispatcher: {0}")]
    Io(#[from] std::io::Error),
}

pub fn build_quote_source(config: &ScannerConfig) -> Result<Box<dyn QuoteSource>, SetupError> {
    match config.quotes.provider {
        QuoteProvider::TwelveData => {
            let api_key = env_secret(&config.quotes.api_key_env)?;
            let breaker = Arc::new(CircuitBreaker::default_provider());
            Ok(Box::new(TwelveDataSource::new(api_key, breaker)?))
        }
        QuoteProvider::Csv => Ok(Box::new(CsvQuoteSource::new(&config.quotes.csv_dir))),
    }
}

/// The configured sink behind a bounded delivery queue.
pub fn build_alert_sink(config: &ScannerConfig) -> Result<Box<dyn AlertSink>, SetupError> {
    let inner: Box<dyn AlertSink> = match config.alerts.sink {
        SinkKind::Telegram => {
            let token = env_secret(&config.alerts.bot_token_env)?;
            let chat_id = env_secret(&config.alerts.chat_id_env)?;
            Box::new(TelegramSink::new(token, chat_id)?)
        }
        SinkKind::Log => Box::new(LogSink),
    };
    Ok(Box::new(QueuedAlertSink::spawn(
        inner,
        config.alerts.queue_capacity,
    )?))
}

pub fn build_scanner(config: &ScannerConfig) -> Result<Scanner, SetupError> {
    let quotes = build_quote_source(config)?;
    let alerts = build_alert_sink(config)?;
    let engine = DecisionEngine::new(config.engine.clone());

    let mut scanner = Scanner::new(Box::new(engine), quotes, alerts)
        .with_interval(config.quotes.interval.as_str())
        .with_output_size(config.quotes.output_size)
        .with_chart_bars(config.charts.bars);
    if config.charts.enabled {
        scanner = scanner.with_charts(Box::new(SvgChartRenderer::new(&config.charts.output_dir)));
    }

    info!(
        quotes = scanner.quote_source().name(),
        alerts = scanner.alert_sink().name(),
        charts = config.charts.enabled,
        instruments = config.instruments.len(),
        "scanner ready"
    );
    Ok(scanner)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(extra: &str) -> ScannerConfig {
        ScannerConfig::from_toml(&format!(
            "{extra}\n[[instruments]]\nsymbol = \"EUR/USD\"\n"
        ))
        .unwrap()
    }

    #[test]
    fn csv_and_log_need_no_secrets() {
        let scanner = build_scanner(&config(
            "[quotes]\nprovider = \"csv\"\ncsv_dir = \"fixtures\"\n",
        ))
        .unwrap();
        assert_eq!(scanner.quote_source().name(), "csv");
        assert_eq!(scanner.alert_sink().name(), "queued(log)");
    }

    #[test]
    fn twelve_data_requires_api_key() {
        let cfg = config("[quotes]\napi_key_env = \"SCANLAB_TEST_UNSET_API_KEY\"\n");
        let err = build_quote_source(&cfg).err().unwrap();
        assert!(err.to_string().contains("SCANLAB_TEST_UNSET_API_KEY"));
    }

    #[test]
    fn telegram_requires_token() {
        let cfg = config(
            "[alerts]\nsink = \"telegram\"\nbot_token_env = \"SCANLAB_TEST_UNSET_BOT\"\n",
        );
        let err = build_alert_sink(&cfg).err().unwrap();
        assert!(matches!(
            err,
            SetupError::Config(ConfigError::MissingEnv { ref name }) if name == "SCANLAB_TEST_UNSET_BOT"
        ));
    }
}
