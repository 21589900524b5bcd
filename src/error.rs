//! Error types for reading classification, configuration and storage.

use std::path::PathBuf;

use thiserror::Error;

/// Why a single reading produced no record.
///
/// Every variant is local to one classification call. Callers report it as an
/// "invalid or unreliable reading" and move on to the next input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Rejection {
    #[error("no reliable PM2.5 value in text")]
    NoReading,

    #[error("PM2.5 {0} µg/m³ outside valid range")]
    Pm25OutOfRange(f64),

    #[error("AQI {0} outside valid range 0-500")]
    AqiOutOfRange(i64),

    #[error("PM2.5 {0} µg/m³ not covered by any breakpoint band")]
    TableLookupMiss(f64),

    #[error("malformed entry: {0}")]
    Malformed(String),

    #[error("unreadable input: {0}")]
    Unreadable(String),
}

/// Invalid breakpoint tables, schemes or settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("breakpoint table is empty")]
    EmptyTable,

    #[error("table resolution of {decimals} decimal places exceeds the maximum of {max}")]
    Resolution { decimals: u32, max: u32 },

    #[error("breakpoint band {index} is malformed: {message}")]
    MalformedBand { index: usize, message: String },

    #[error("breakpoint bands {left} and {right} overlap or are out of order")]
    BandOrder { left: usize, right: usize },

    #[error("gap of {gap:.3} between breakpoint bands {left} and {right} exceeds table resolution")]
    BandGap { left: usize, right: usize, gap: f64 },

    #[error("PM2.5 ceiling {ceiling} not covered by breakpoint table (max {table_max})")]
    CeilingNotCovered { ceiling: f64, table_max: f64 },

    #[error("classification scheme '{0}' has no bands")]
    EmptyScheme(String),

    #[error("classification scheme '{name}' repeats upper bound {bound}")]
    DuplicateBound { name: String, bound: u16 },

    #[error("failed to load settings: {0}")]
    Settings(#[from] config::ConfigError),
}

/// Failures of the CSV record store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unexpected header in {}: {found:?}", .path.display())]
    BadHeader { path: PathBuf, found: String },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}
