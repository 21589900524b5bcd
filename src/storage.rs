use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::reading::{ClassifiedReading, StoredReading};

pub const HEADER: [&str; 4] = ["Timestamp", "PM2.5", "AQI", "Status"];

/// Append-only CSV file of classified readings.
#[derive(Debug, Clone)]
pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    /// Open the store, writing the header row if the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }
        if !path.exists() {
            let mut f = File::create(&path).map_err(|e| StoreError::io(&path, e))?;
            writeln!(f, "{}", HEADER.join(",")).map_err(|e| StoreError::io(&path, e))?;
            info!(path = %path.display(), "Created reading store");
        } else {
            check_header(&path)?;
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, reading: &ClassifiedReading) -> Result<(), StoreError> {
        let row = [
            reading.timestamp.clone(),
            format_pm25(reading.pm25),
            reading.aqi.to_string(),
            reading.status.label().to_string(),
        ];
        self.append_row(&row)?;
        debug!(
            timestamp = %reading.timestamp,
            pm25 = reading.pm25,
            aqi = reading.aqi.value(),
            status = %reading.status,
            "Stored reading"
        );
        Ok(())
    }

    /// Appends several readings through one file handle.
    pub fn append_all(&self, readings: &[ClassifiedReading]) -> Result<usize, StoreError> {
        if readings.is_empty() {
            return Ok(0);
        }
        let mut f = self.open_append()?;
        for r in readings {
            let row = [
                r.timestamp.clone(),
                format_pm25(r.pm25),
                r.aqi.to_string(),
                r.status.label().to_string(),
            ];
            writeln!(f, "{}", encode_row(&row)).map_err(|e| StoreError::io(&self.path, e))?;
        }
        Ok(readings.len())
    }

    fn append_row(&self, row: &[String]) -> Result<(), StoreError> {
        let mut f = self.open_append()?;
        writeln!(f, "{}", encode_row(row)).map_err(|e| StoreError::io(&self.path, e))
    }

    fn open_append(&self) -> Result<File, StoreError> {
        OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| StoreError::io(&self.path, e))
    }

    /// Every parseable row after the header. Malformed rows are skipped.
    pub fn read_all(&self) -> Result<Vec<StoredReading>, StoreError> {
        let f = File::open(&self.path).map_err(|e| StoreError::io(&self.path, e))?;
        let mut rows = Vec::new();
        for (idx, line) in BufReader::new(f).lines().enumerate().skip(1) {
            let line = line.map_err(|e| StoreError::io(&self.path, e))?;
            if line.trim().is_empty() {
                continue;
            }
            match parse_row(&line) {
                Some(row) => rows.push(row),
                None => warn!(path = %self.path.display(), line = idx + 1, "Skipping malformed row"),
            }
        }
        Ok(rows)
    }

    /// Most recent row, for the dashboard.
    pub fn latest(&self) -> Result<Option<StoredReading>, StoreError> {
        Ok(self.read_all()?.pop())
    }

    pub fn count(&self) -> Result<usize, StoreError> {
        Ok(self.read_all()?.len())
    }
}

fn check_header(path: &Path) -> Result<(), StoreError> {
    let f = File::open(path).map_err(|e| StoreError::io(path, e))?;
    let mut first = String::new();
    BufReader::new(f)
        .read_line(&mut first)
        .map_err(|e| StoreError::io(path, e))?;
    let found = first.trim_end_matches(['\r', '\n']);
    // an empty file gets its header on first use
    if found.is_empty() {
        let mut f = OpenOptions::new()
            .append(true)
            .open(path)
            .map_err(|e| StoreError::io(path, e))?;
        writeln!(f, "{}", HEADER.join(",")).map_err(|e| StoreError::io(path, e))?;
        return Ok(());
    }
    if split_row(found) != HEADER {
        return Err(StoreError::BadHeader {
            path: path.to_path_buf(),
            found: found.to_string(),
        });
    }
    Ok(())
}

/// Whole values keep one decimal (`85.0`), matching rows the dashboard
/// scripts write into the same file.
fn format_pm25(pm25: f64) -> String {
    if pm25.fract() == 0.0 {
        format!("{:.1}", pm25)
    } else {
        pm25.to_string()
    }
}

fn encode_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn encode_row(row: &[String]) -> String {
    row.iter()
        .map(|f| encode_field(f))
        .collect::<Vec<_>>()
        .join(",")
}

/// Split one line on commas, honouring double-quoted fields.
fn split_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, in_quotes) {
            ('"', true) if chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            ('"', true) => in_quotes = false,
            ('"', false) if current.is_empty() => in_quotes = true,
            (',', false) => fields.push(std::mem::take(&mut current)),
            (c, _) => current.push(c),
        }
    }
    fields.push(current);
    fields
}

fn parse_row(line: &str) -> Option<StoredReading> {
    let fields = split_row(line);
    let [timestamp, pm25, aqi, status] = <[String; 4]>::try_from(fields).ok()?;
    Some(StoredReading {
        timestamp,
        pm25: pm25.trim().parse().ok()?,
        aqi: aqi.trim().parse().ok()?,
        status,
    })
}
