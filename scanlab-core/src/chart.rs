//! Chart rendering seam.
//!
//! The scanner asks for a chart only when an alert is about to fire. A
//! renderer failure is logged and the alert goes out without an attachment.

use crate::domain::SignalDirection;
use crate::indicators::IndicatorRow;
use crate::levels::{FibLevel, LevelPair};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Everything a renderer needs to draw one signal.
#[derive(Debug, Clone)]
pub struct ChartRequest {
    pub symbol: String,
    /// File-name-safe form of the symbol.
    pub file_stem: String,
    pub direction: SignalDirection,
    /// Trailing rows, oldest first.
    pub rows: Vec<IndicatorRow>,
    pub entry: f64,
    pub levels: LevelPair,
    pub retracements: Vec<FibLevel>,
}

impl ChartRequest {
    /// `<STEM>_<SIGNAL>.<extension>`, e.g. `EURUSD_BUY.svg`.
    pub fn file_name(&self, extension: &str) -> String {
        format!("{}_{}.{extension}", self.file_stem, self.direction)
    }
}

/// Opaque handle to a rendered chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartRef(PathBuf);

impl ChartRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("nothing to draw: {0}")]
    Empty(String),

    #[error("failed to write chart: {0}")]
    Io(#[from] std::io::Error),
}

pub trait ChartRenderer: Send + Sync {
    fn render(&self, request: &ChartRequest) -> Result<ChartRef, ChartError>;
}
