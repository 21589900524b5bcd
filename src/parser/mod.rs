pub mod extract;
pub mod manual;
pub mod normalize;

use std::path::Path;

use chrono::NaiveDateTime;

use crate::aqi::{Aqi, BreakpointTable, ClassificationScheme};
use crate::error::{ConfigError, Rejection};
use crate::reading::{self, ClassifiedReading};
pub use extract::extract_pm25;
pub use manual::parse_manual;
pub use normalize::{normalize, OcrCorrection};

/// Nominal PM2.5 validity ceiling in µg/m³.
pub const PM25_CEILING: f64 = 500.0;

/// Everything a classification call depends on. Immutable, so one value can
/// be shared across threads.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub table: BreakpointTable,
    pub scheme: ClassificationScheme,
    pub correction: OcrCorrection,
    pub pm25_ceiling: f64,
}

impl PipelineConfig {
    /// Rejects a ceiling the table cannot convert.
    pub fn new(
        table: BreakpointTable,
        scheme: ClassificationScheme,
        correction: OcrCorrection,
        pm25_ceiling: f64,
    ) -> Result<Self, ConfigError> {
        if !(pm25_ceiling.is_finite() && pm25_ceiling >= 0.0)
            || table.compute_aqi(pm25_ceiling).is_none()
        {
            return Err(ConfigError::CeilingNotCovered {
                ceiling: pm25_ceiling,
                table_max: table.max_concentration(),
            });
        }
        Ok(Self {
            table,
            scheme,
            correction,
            pm25_ceiling,
        })
    }

    pub fn with_scheme(mut self, scheme: ClassificationScheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// PM2.5 gate: finite and within `0..=pm25_ceiling`.
    pub fn check_pm25(&self, pm25: f64) -> Result<f64, Rejection> {
        if pm25.is_finite() && (0.0..=self.pm25_ceiling).contains(&pm25) {
            Ok(pm25)
        } else {
            Err(Rejection::Pm25OutOfRange(pm25))
        }
    }

    /// Breakpoint lookup followed by the AQI gate.
    pub fn convert(&self, pm25: f64) -> Result<Aqi, Rejection> {
        let raw = self
            .table
            .interpolate(pm25)
            .ok_or(Rejection::TableLookupMiss(pm25))?;
        Aqi::new(raw).ok_or(Rejection::AqiOutOfRange(raw))
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            table: BreakpointTable::epa_pm25(),
            scheme: ClassificationScheme::six_level(),
            correction: OcrCorrection::DigitLookalikes,
            pm25_ceiling: PM25_CEILING,
        }
    }
}

/// normalize → extract → range gate → convert → AQI gate → classify.
pub fn evaluate(
    raw: &str,
    config: &PipelineConfig,
    at: NaiveDateTime,
) -> Result<ClassifiedReading, Rejection> {
    let text = normalize(raw, config.correction);
    let pm25 = extract_pm25(&text).ok_or(Rejection::NoReading)?;
    let pm25 = config.check_pm25(pm25)?;
    let aqi = config.convert(pm25)?;
    let status = config.scheme.classify(Some(aqi));
    Ok(ClassifiedReading::new(at, pm25, aqi, status))
}

/// [`evaluate`] on the contents of one OCR dump. A file that cannot be read
/// or is not UTF-8 is rejected like any other unreliable input.
pub fn evaluate_file(
    path: &Path,
    config: &PipelineConfig,
    at: NaiveDateTime,
) -> Result<ClassifiedReading, Rejection> {
    let bytes = std::fs::read(path)
        .map_err(|e| Rejection::Unreadable(format!("{}: {}", path.display(), e)))?;
    let raw = String::from_utf8(bytes)
        .map_err(|e| Rejection::Unreadable(format!("{}: {}", path.display(), e)))?;
    evaluate(&raw, config, at)
}

/// [`evaluate`] stamped with the current local time, rejection reason dropped.
pub fn filter_and_validate(raw: &str, config: &PipelineConfig) -> Option<ClassifiedReading> {
    evaluate(raw, config, reading::now()).ok()
}

// ── Tests ──
