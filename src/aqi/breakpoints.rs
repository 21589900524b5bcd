use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Upper bound of the AQI scale.
pub const AQI_MAX: i64 = 500;

/// Finest table resolution accepted, in decimal places.
pub const MAX_DECIMALS: u32 = 6;

/// An AQI value known to lie in `0..=500`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Aqi(u16);

impl Aqi {
    /// Returns `None` for anything outside `0..=500`.
    pub fn new(value: i64) -> Option<Self> {
        if (0..=AQI_MAX).contains(&value) {
            Some(Aqi(value as u16))
        } else {
            None
        }
    }

    pub fn value(self) -> u16 {
        self.0
    }
}

impl std::fmt::Display for Aqi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One concentration band `(c_low, c_high)` mapped onto `(i_low, i_high)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Breakpoint {
    pub c_low: f64,
    pub c_high: f64,
    pub i_low: i64,
    pub i_high: i64,
}

impl Breakpoint {
    pub const fn new(c_low: f64, c_high: f64, i_low: i64, i_high: i64) -> Self {
        Self {
            c_low,
            c_high,
            i_low,
            i_high,
        }
    }

    pub fn contains(&self, c: f64) -> bool {
        self.c_low <= c && c <= self.c_high
    }

    /// Linear interpolation inside the band, rounded half away from zero.
    /// Concentrations in the seam just past `c_high` stay at `i_high`.
    pub fn interpolate(&self, c: f64) -> i64 {
        let slope = (self.i_high - self.i_low) as f64 / (self.c_high - self.c_low);
        let raw = (slope * (c - self.c_low) + self.i_low as f64).round() as i64;
        raw.max(self.i_low).min(self.i_high)
    }
}

const EPA_PM25: [Breakpoint; 6] = [
    Breakpoint::new(0.0, 12.0, 0, 50),
    Breakpoint::new(12.1, 35.4, 51, 100),
    Breakpoint::new(35.5, 55.4, 101, 150),
    Breakpoint::new(55.5, 150.4, 151, 200),
    Breakpoint::new(150.5, 250.4, 201, 300),
    Breakpoint::new(250.5, 500.4, 301, 500),
];

/// Ordered, validated set of breakpoint bands.
///
/// Concentrations are truncated to `decimals` places for the band lookup only,
/// which is how the seams between bands (12.0 → 12.1) are tiled. The
/// interpolation itself runs on the untruncated value.
#[derive(Debug, Clone, PartialEq)]
pub struct BreakpointTable {
    bands: Vec<Breakpoint>,
    decimals: u32,
}

impl BreakpointTable {
    pub fn new(bands: Vec<Breakpoint>, decimals: u32) -> Result<Self, ConfigError> {
        let table = Self { bands, decimals };
        table.validate()?;
        Ok(table)
    }

    /// US EPA PM2.5 table, one decimal place of resolution.
    pub fn epa_pm25() -> Self {
        Self {
            bands: EPA_PM25.to_vec(),
            decimals: 1,
        }
    }

    pub fn bands(&self) -> &[Breakpoint] {
        &self.bands
    }

    pub fn decimals(&self) -> u32 {
        self.decimals
    }

    /// Highest concentration any band covers.
    pub fn max_concentration(&self) -> f64 {
        self.bands.last().map(|b| b.c_high).unwrap_or(0.0)
    }

    fn step(&self) -> f64 {
        10f64.powi(-(self.decimals as i32))
    }

    fn truncate(&self, c: f64) -> f64 {
        let scale = 10f64.powi(self.decimals as i32);
        // nudge so 35.4 * 10 = 353.99999.. still floors to 354
        ((c * scale) + 1e-9).floor() / scale
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.decimals > MAX_DECIMALS {
            return Err(ConfigError::Resolution {
                decimals: self.decimals,
                max: MAX_DECIMALS,
            });
        }
        if self.bands.is_empty() {
            return Err(ConfigError::EmptyTable);
        }
        for (index, band) in self.bands.iter().enumerate() {
            if !(band.c_low.is_finite() && band.c_high.is_finite()) || band.c_low >= band.c_high {
                return Err(ConfigError::MalformedBand {
                    index,
                    message: format!("c_low {} must be below c_high {}", band.c_low, band.c_high),
                });
            }
            if band.i_low > band.i_high {
                return Err(ConfigError::MalformedBand {
                    index,
                    message: format!("i_low {} above i_high {}", band.i_low, band.i_high),
                });
            }
        }
        let tolerance = self.step() + 1e-9;
        for (left, pair) in self.bands.windows(2).enumerate() {
            let gap = pair[1].c_low - pair[0].c_high;
            if gap <= 0.0 {
                return Err(ConfigError::BandOrder {
                    left,
                    right: left + 1,
                });
            }
            if gap > tolerance {
                return Err(ConfigError::BandGap {
                    left,
                    right: left + 1,
                    gap,
                });
            }
        }
        Ok(())
    }

    /// Band containing `c` after truncation to the table resolution.
    pub fn band_for(&self, c: f64) -> Option<&Breakpoint> {
        if !c.is_finite() {
            return None;
        }
        let c = self.truncate(c);
        self.bands.iter().find(|b| b.contains(c))
    }

    /// PM2.5 concentration to AQI. `None` when no band covers the value or the
    /// interpolated index falls outside `0..=500`.
    pub fn compute_aqi(&self, pm25: f64) -> Option<Aqi> {
        self.interpolate(pm25).and_then(Aqi::new)
    }

    /// Like [`compute_aqi`](Self::compute_aqi) but without the AQI range
    /// check, so the gate can report the offending value.
    pub fn interpolate(&self, pm25: f64) -> Option<i64> {
        self.band_for(pm25).map(|b| b.interpolate(pm25))
    }
}

impl Default for BreakpointTable {
    fn default() -> Self {
        Self::epa_pm25()
    }
}
