//! CSV quote source for offline scans and replays.
//!
//! One file per instrument at `<dir>/<STEM>.csv` (`EUR/USD` → `EURUSD.csv`)
//! with a header row `datetime,open,high,low,close[,volume]`.

use super::twelvedata::parse_datetime;
use scanlab_core::data::{DataError, QuoteRequest, QuoteSource};
use scanlab_core::domain::{Instrument, PriceBar};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct CsvRow {
    datetime: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: Option<f64>,
}

/// Read every bar in a CSV file, sorted ascending by timestamp.
pub fn read_bars(path: &Path) -> Result<Vec<PriceBar>, DataError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| DataError::Io(format!("{}: {e}", path.display())))?;

    let mut bars = Vec::new();
    for (line, record) in reader.deserialize::<CsvRow>().enumerate() {
        let row = record.map_err(|e| {
            DataError::ResponseFormatChanged(format!("{} row {}: {e}", path.display(), line + 1))
        })?;
        let timestamp = parse_datetime(&row.datetime).ok_or_else(|| {
            DataError::ResponseFormatChanged(format!(
                "{} row {}: bad datetime '{}'",
                path.display(),
                line + 1,
                row.datetime
            ))
        })?;
        bars.push(PriceBar::new(
            timestamp, row.open, row.high, row.low, row.close, row.volume,
        ));
    }

    bars.sort_by_key(|b| b.timestamp);
    Ok(bars)
}

pub struct CsvQuoteSource {
    dir: PathBuf,
}

impl CsvQuoteSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir
            .join(format!("{}.csv", Instrument::new(symbol).file_stem()))
    }
}

impl QuoteSource for CsvQuoteSource {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(&self, request: &QuoteRequest) -> Result<Vec<PriceBar>, DataError> {
        let path = self.path_for(&request.symbol);
        if !path.exists() {
            return Err(DataError::SymbolNotFound {
                symbol: request.symbol.clone(),
            });
        }
        let mut bars = read_bars(&path)?;
        let start = bars.len().saturating_sub(request.output_size);
        Ok(bars.split_off(start))
    }
}
