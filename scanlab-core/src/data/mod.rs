//! Quote source abstraction

pub mod provider;

pub use provider::{DataError, QuoteRequest, QuoteSource};
