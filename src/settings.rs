use std::path::PathBuf;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use serde::Deserialize;

use crate::aqi::{Breakpoint, BreakpointTable, SchemeKind};
use crate::error::ConfigError;
use crate::parser::{OcrCorrection, PipelineConfig, PM25_CEILING};

/// Optional settings file, looked up in the working directory.
pub const SETTINGS_FILE: &str = "aqi_reader";
pub const ENV_PREFIX: &str = "AQI";
pub const DEFAULT_CSV_PATH: &str = "aqi_readings.csv";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub csv_path: PathBuf,
    pub scheme: SchemeKind,
    pub ocr_correction: OcrCorrection,
    pub pm25_ceiling: f64,
    /// Replaces the EPA table when set.
    #[serde(default)]
    pub breakpoints: Option<Vec<Breakpoint>>,
    #[serde(default = "default_decimals")]
    pub breakpoint_decimals: u32,
    /// Readings per parallel chunk in batch mode.
    pub batch_chunk: usize,
}

fn default_decimals() -> u32 {
    1
}

impl Settings {
    /// Defaults, then `aqi_reader.{toml,json,..}` if present, then `AQI_*`
    /// environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::builder()?
            .add_source(File::with_name(SETTINGS_FILE).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?
            .try_deserialize()
            .map_err(ConfigError::from)
    }

    fn builder() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Ok(Config::builder()
            .set_default("csv_path", DEFAULT_CSV_PATH)?
            .set_default("scheme", "six-level")?
            .set_default("ocr_correction", "digit-lookalikes")?
            .set_default("pm25_ceiling", PM25_CEILING)?
            .set_default("batch_chunk", 500_i64)?)
    }

    pub fn pipeline(&self) -> Result<PipelineConfig, ConfigError> {
        let table = match &self.breakpoints {
            Some(bands) => BreakpointTable::new(bands.clone(), self.breakpoint_decimals)?,
            None => BreakpointTable::epa_pm25(),
        };
        PipelineConfig::new(
            table,
            self.scheme.scheme(),
            self.ocr_correction,
            self.pm25_ceiling,
        )
    }
}
