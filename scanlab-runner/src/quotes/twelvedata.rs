//! Twelve Data quote source.
//!
//! Fetches intraday bars from the `/time_series` endpoint. Values arrive as
//! strings, newest first; they are parsed and returned oldest first. Twelve
//! Data reports most errors inside an HTTP 200 body (`"status": "error"`),
//! so the body is inspected before the bars are trusted.

use super::circuit_breaker::CircuitBreaker;
use chrono::{NaiveDate, NaiveDateTime};
use reqwest::StatusCode;
use scanlab_core::data::{DataError, QuoteRequest, QuoteSource};
use scanlab_core::domain::PriceBar;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.twelvedata.com";

/// Upper bound on the pause between two retries.
pub const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Exponential backoff before retry `attempt` (1-based), capped at [`MAX_BACKOFF`].
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    2u32.checked_pow(attempt.saturating_sub(1))
        .and_then(|factor| base.checked_mul(factor))
        .map_or(MAX_BACKOFF, |delay| delay.min(MAX_BACKOFF))
}

#[derive(Debug, Deserialize)]
struct TimeSeriesResponse {
    status: Option<String>,
    code: Option<u16>,
    message: Option<String>,
    values: Option<Vec<RawValue>>,
}

#[derive(Debug, Deserialize)]
struct RawValue {
    datetime: String,
    open: String,
    high: String,
    low: String,
    close: String,
    volume: Option<String>,
}

/// Parse a `datetime` field: `"2024-06-03 09:30:00"` intraday, `"2024-06-03"` daily.
pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn parse_price(field: &str, value: &str, datetime: &str) -> Result<f64, DataError> {
    value.trim().parse::<f64>().map_err(|_| {
        DataError::ResponseFormatChanged(format!("bad {field} '{value}' at {datetime}"))
    })
}

/// Map an error payload to a [`DataError`].
fn payload_error(symbol: &str, code: Option<u16>, message: String) -> DataError {
    match code {
        Some(401) | Some(403) => DataError::AuthenticationRequired(message),
        Some(404) => DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        },
        Some(429) => DataError::RateLimited {
            retry_after_secs: 60,
        },
        _ => DataError::Provider {
            symbol: symbol.to_string(),
            message,
        },
    }
}

/// Parse a `/time_series` body into ascending bars.
pub fn parse_response(symbol: &str, body: &str) -> Result<Vec<PriceBar>, DataError> {
    let resp: TimeSeriesResponse = serde_json::from_str(body).map_err(|e| {
        DataError::ResponseFormatChanged(format!("failed to parse response for {symbol}: {e}"))
    })?;

    if resp.status.as_deref() == Some("error") {
        let message = resp
            .message
            .unwrap_or_else(|| "provider returned an error without a message".into());
        return Err(payload_error(symbol, resp.code, message));
    }

    let values = resp
        .values
        .ok_or_else(|| DataError::ResponseFormatChanged(format!("no values for {symbol}")))?;

    let mut bars = Vec::with_capacity(values.len());
    for raw in values {
        let timestamp = parse_datetime(&raw.datetime).ok_or_else(|| {
            DataError::ResponseFormatChanged(format!("bad datetime '{}'", raw.datetime))
        })?;
        let volume = raw
            .volume
            .as_deref()
            .and_then(|v| v.trim().parse::<f64>().ok());
        bars.push(PriceBar::new(
            timestamp,
            parse_price("open", &raw.open, &raw.datetime)?,
            parse_price("high", &raw.high, &raw.datetime)?,
            parse_price("low", &raw.low, &raw.datetime)?,
            parse_price("close", &raw.close, &raw.datetime)?,
            volume,
        ));
    }

    bars.sort_by_key(|b| b.timestamp);
    Ok(bars)
}

pub struct TwelveDataSource {
    client: reqwest::blocking::Client,
    api_key: String,
    base_url: String,
    circuit_breaker: Arc<CircuitBreaker>,
    max_retries: u32,
    base_delay: Duration,
}

impl TwelveDataSource {
    pub fn new(
        api_key: impl Into<String>,
        circuit_breaker: Arc<CircuitBreaker>,
    ) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            circuit_breaker,
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_retries(mut self, max_retries: u32, base_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.base_delay = base_delay;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/time_series", self.base_url.trim_end_matches('/'))
    }

    /// Execute the request with retry and circuit breaker logic.
    fn fetch_with_retry(&self, request: &QuoteRequest) -> Result<Vec<PriceBar>, DataError> {
        let symbol = request.symbol.as_str();
        let output_size = request.output_size.to_string();
        let query = [
            ("symbol", symbol),
            ("interval", request.interval.as_str()),
            ("outputsize", output_size.as_str()),
            ("apikey", self.api_key.as_str()),
        ];
        let url = self.endpoint();
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = backoff_delay(self.base_delay, attempt);
                debug!(symbol = %symbol, attempt, delay_ms = delay.as_millis() as u64, "retrying quote request");
                std::thread::sleep(delay);
            }

            if !self.circuit_breaker.is_allowed() {
                return Err(DataError::CircuitBreakerTripped);
            }

            let resp = match self.client.get(&url).query(&query).send() {
                Ok(resp) => resp,
                Err(e) if e.is_connect() || e.is_timeout() => {
                    last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                    continue;
                }
                Err(e) => return Err(DataError::NetworkUnreachable(e.to_string())),
            };

            let status = resp.status();
            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                self.circuit_breaker.trip();
                return Err(DataError::AuthenticationRequired(format!(
                    "Twelve Data rejected the API key (HTTP {status})"
                )));
            }
            if status == StatusCode::TOO_MANY_REQUESTS {
                self.circuit_breaker.record_failure();
                let retry_after = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                last_error = Some(DataError::RateLimited {
                    retry_after_secs: retry_after,
                });
                continue;
            }
            if !status.is_success() {
                self.circuit_breaker.record_failure();
                last_error = Some(DataError::Other(format!("HTTP {status} for {symbol}")));
                continue;
            }

            let body = resp.text().map_err(|e| {
                DataError::ResponseFormatChanged(format!("failed to read body for {symbol}: {e}"))
            })?;

            match parse_response(symbol, &body) {
                Ok(bars) => {
                    self.circuit_breaker.record_success();
                    return Ok(bars);
                }
                Err(err @ DataError::RateLimited { .. }) => {
                    self.circuit_breaker.record_failure();
                    warn!(symbol = %symbol, "Twelve Data credit limit reached");
                    last_error = Some(err);
                }
                Err(err @ DataError::AuthenticationRequired(_)) => {
                    self.circuit_breaker.trip();
                    return Err(err);
                }
                Err(err) => return Err(err),
            }
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }
}

impl QuoteSource for TwelveDataSource {
    fn name(&self) -> &str {
        "twelve_data"
    }

    fn fetch(&self, request: &QuoteRequest) -> Result<Vec<PriceBar>, DataError> {
        self.fetch_with_retry(request)
    }

    fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }
}
