//! Historical table ingestion and validation.
//!
//! Reads CSV tables with polars, checks that the required columns are
//! present, and converts every row into a typed [`TemperatureRecord`].
//! Rows are rejected early with their row number rather than carried
//! around as loosely-typed cells.

use crate::constants::{
    COL_CITY, COL_SEASON, COL_TEMPERATURE, COL_TIMESTAMP, DATE_FORMAT, REQUIRED_COLUMNS,
    TIMESTAMP_FORMATS,
};
use crate::error::{AnalysisError, Result};
use crate::models::{RecordSet, Season, TemperatureRecord};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Load records from a CSV file or from every CSV file under a directory
pub fn load_records(path: &Path) -> Result<RecordSet> {
    if !path.exists() {
        return Err(AnalysisError::InputNotFound {
            path: path.to_path_buf(),
        });
    }

    if path.is_file() {
        let frame = read_csv_frame(path)?;
        return records_from_frame(&frame);
    }

    let files = discover_csv_files(path)?;
    let mut records = Vec::new();
    for file in &files {
        let frame = read_csv_frame(file)?;
        let loaded = records_from_frame(&frame).map_err(|e| match e {
            AnalysisError::InvalidRecord { row, reason } => AnalysisError::InvalidRecord {
                row,
                reason: format!("{}: {}", file.display(), reason),
            },
            other => other,
        })?;
        debug!("Loaded {} records from {}", loaded.len(), file.display());
        records.extend(loaded.into_records());
    }

    Ok(RecordSet::new(records))
}

/// Load records from an uploaded CSV held in memory
pub fn load_records_from_bytes(bytes: Vec<u8>) -> Result<RecordSet> {
    let frame = string_csv_options().into_reader_with_file_handle(Cursor::new(bytes)).finish()?;
    records_from_frame(&frame)
}

/// Find all `.csv` files below `dir`, sorted by path
pub fn discover_csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry under {}: {}", dir.display(), e);
                continue;
            }
        };
        if entry.file_type().is_file()
            && entry
                .path()
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
        {
            files.push(entry.into_path());
        }
    }

    if files.is_empty() {
        return Err(AnalysisError::NoInputFiles {
            path: dir.to_path_buf(),
        });
    }

    files.sort();
    debug!("Found {} CSV files under {}", files.len(), dir.display());
    Ok(files)
}

/// Read a CSV file with every column kept as a string
pub fn read_csv_frame(path: &Path) -> Result<DataFrame> {
    let frame = string_csv_options()
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    debug!("Read {} rows from {}", frame.height(), path.display());
    Ok(frame)
}

// Schema inference length 0 reads every column as String; typing happens
// in `records_from_frame` so errors can name the offending row.
fn string_csv_options() -> CsvReadOptions {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
}

/// Fail with `MissingColumn` unless every required column is present
pub fn validate_columns(frame: &DataFrame) -> Result<()> {
    let available: Vec<String> = frame
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();

    for required in REQUIRED_COLUMNS {
        if !available.iter().any(|name| name == required) {
            return Err(AnalysisError::MissingColumn {
                column: required.to_string(),
                available,
            });
        }
    }
    Ok(())
}

/// Convert a frame with the required columns into typed records
pub fn records_from_frame(frame: &DataFrame) -> Result<RecordSet> {
    validate_columns(frame)?;

    let timestamps = frame.column(COL_TIMESTAMP)?.cast(&DataType::String)?;
    let cities = frame.column(COL_CITY)?.cast(&DataType::String)?;
    let temperatures = frame.column(COL_TEMPERATURE)?.cast(&DataType::String)?;
    let seasons = frame.column(COL_SEASON)?.cast(&DataType::String)?;

    let timestamps = timestamps.as_materialized_series().str()?;
    let cities = cities.as_materialized_series().str()?;
    let temperatures = temperatures.as_materialized_series().str()?;
    let seasons = seasons.as_materialized_series().str()?;

    let mut records = Vec::with_capacity(frame.height());
    for idx in 0..frame.height() {
        let row = idx + 1;

        let city = required_cell(cities.get(idx), row, COL_CITY)?;
        let raw_timestamp = required_cell(timestamps.get(idx), row, COL_TIMESTAMP)?;
        let raw_temperature = required_cell(temperatures.get(idx), row, COL_TEMPERATURE)?;
        let raw_season = required_cell(seasons.get(idx), row, COL_SEASON)?;

        let timestamp = parse_timestamp(raw_timestamp).ok_or_else(|| {
            AnalysisError::invalid_record(
                row,
                format!("unparseable timestamp '{}'", raw_timestamp),
            )
        })?;
        let temperature = raw_temperature
            .parse::<f64>()
            .ok()
            .filter(|t| t.is_finite())
            .ok_or_else(|| {
                AnalysisError::invalid_record(
                    row,
                    format!("temperature '{}' is not a finite number", raw_temperature),
                )
            })?;
        let season = raw_season
            .parse::<Season>()
            .map_err(|e| AnalysisError::invalid_record(row, e.to_string()))?;

        records.push(TemperatureRecord::new(city, timestamp, temperature, season));
    }

    Ok(RecordSet::new(records))
}

fn required_cell<'a>(value: Option<&'a str>, row: usize, column: &str) -> Result<&'a str> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AnalysisError::invalid_record(
            row,
            format!("missing value for '{}'", column),
        )),
    }
}

/// Parse a date or date-time; dates map to midnight
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();

    if let Ok(date) = NaiveDate::parse_from_str(value, DATE_FORMAT) {
        return date.and_hms_opt(0, 0, 0);
    }
    for format in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(value, format) {
            return Some(ts);
        }
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|ts| ts.naive_utc())
}
