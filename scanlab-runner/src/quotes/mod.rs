//! Quote source implementations: Twelve Data over HTTP and local CSV files.

pub mod circuit_breaker;
pub mod csv_source;
pub mod twelvedata;

pub use circuit_breaker::CircuitBreaker;
pub use csv_source::{read_bars, CsvQuoteSource};
pub use twelvedata::TwelveDataSource;
