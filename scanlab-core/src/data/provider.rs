//! Quote source trait and structured error types.
//!
//! The QuoteSource trait abstracts over price-history providers (Twelve Data,
//! CSV import) so the scanner can swap implementations and mock them in tests.

use crate::domain::PriceBar;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What to fetch: `output_size` bars of `interval` (e.g. `"30min"`) for `symbol`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub symbol: String,
    pub interval: String,
    pub output_size: usize,
}

impl QuoteRequest {
    pub fn new(symbol: impl Into<String>, interval: impl Into<String>, output_size: usize) -> Self {
        Self {
            symbol: symbol.into(),
            interval: interval.into(),
            output_size,
        }
    }
}

/// Structured error types for quote fetching.
#[derive(Debug, Clone, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("provider rejected request for {symbol}: {message}")]
    Provider { symbol: String, message: String },

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("no usable bars returned for {symbol}")]
    NoData { symbol: String },

    #[error("hard stop: quote provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("quote source {provider} is not accepting requests")]
    Unavailable { provider: String },

    #[error("I/O error: {0}")]
    Io(String),

    #[error("data error: {0}")]
    Other(String),
}

/// Trait for quote sources.
///
/// Implementations return bars in ascending chronological order (most recent
/// last). The scanner validates the order and rejects malformed series.
pub trait QuoteSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Fetch the most recent bars described by `request`.
    fn fetch(&self, request: &QuoteRequest) -> Result<Vec<PriceBar>, DataError>;

    /// Whether the source is currently accepting requests (not rate-limited, not blocked).
    fn is_available(&self) -> bool {
        true
    }
}
