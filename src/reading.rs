use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::aqi::{Aqi, Category};

/// Timestamp layout used in records and in the CSV store.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// A fully validated reading, ready for the record store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedReading {
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
    #[serde(rename = "PM2.5")]
    pub pm25: f64,
    #[serde(rename = "AQI")]
    pub aqi: Aqi,
    #[serde(rename = "Status")]
    pub status: Category,
}

impl ClassifiedReading {
    pub fn new(at: NaiveDateTime, pm25: f64, aqi: Aqi, status: Category) -> Self {
        Self {
            timestamp: at.format(TIMESTAMP_FORMAT).to_string(),
            pm25,
            aqi,
            status,
        }
    }
}

/// A row read back from the store. The status stays a plain label since the
/// file may hold rows written with any scheme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredReading {
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
    #[serde(rename = "PM2.5")]
    pub pm25: f64,
    #[serde(rename = "AQI")]
    pub aqi: i64,
    #[serde(rename = "Status")]
    pub status: String,
}

impl StoredReading {
    pub fn category(&self) -> Option<Category> {
        Category::from_label(&self.status)
    }
}

impl From<&ClassifiedReading> for StoredReading {
    fn from(r: &ClassifiedReading) -> Self {
        Self {
            timestamp: r.timestamp.clone(),
            pm25: r.pm25,
            aqi: i64::from(r.aqi.value()),
            status: r.status.label().to_string(),
        }
    }
}
