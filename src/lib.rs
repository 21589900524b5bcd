//! PM2.5 reading classification: OCR/manual text in, AQI-classified records out.
//!
//! The [`parser`] pipeline is pure and holds no shared state, so a single
//! [`PipelineConfig`] can be used from any number of threads at once.

pub mod aqi;
pub mod error;
pub mod parser;
pub mod reading;
pub mod settings;
pub mod storage;

pub use aqi::{Aqi, BreakpointTable, Category, ClassificationScheme, SchemeKind};
pub use error::{ConfigError, Rejection, StoreError};
pub use parser::{
    evaluate, evaluate_file, filter_and_validate, parse_manual, OcrCorrection, PipelineConfig,
};
pub use reading::{ClassifiedReading, StoredReading};
pub use settings::Settings;
pub use storage::CsvStore;
