//! Domain types for ScanLab

pub mod bar;
pub mod instrument;
pub mod series;
pub mod signal;

pub use bar::{normalize_volume, PriceBar, VOLUME_SENTINEL};
pub use instrument::Instrument;
pub use series::{PriceSeries, SwingRange};
pub use signal::{Signal, SignalDirection};
