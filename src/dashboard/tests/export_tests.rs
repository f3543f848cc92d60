//! Export tests

use super::mixed_records;
use crate::config::AnalysisConfig;
use crate::constants::{COL_IS_ANOMALY, COL_MOVING_AVG};
use crate::dashboard::analyze_records;
use crate::dashboard::export::{ExportFormat, analyzed_frame, export_report};
use crate::error::AnalysisError;
use crate::ingest::load_records;
use crate::models::{RecordSet, Season, TemperatureRecord};
use chrono::{Duration, NaiveDate};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tempfile::TempDir;

#[test]
fn test_format_from_extension() {
    assert_eq!(ExportFormat::from_path(Path::new("out.csv")), Some(ExportFormat::Csv));
    assert_eq!(ExportFormat::from_path(Path::new("OUT.CSV")), Some(ExportFormat::Csv));
    assert_eq!(
        ExportFormat::from_path(Path::new("out.parquet")),
        Some(ExportFormat::Parquet)
    );
    assert_eq!(ExportFormat::from_path(Path::new("out.xlsx")), None);
    assert_eq!(ExportFormat::from_path(Path::new("out")), None);
}

#[test]
fn test_analyzed_frame_has_augmented_columns() {
    let report = analyze_records(&AnalysisConfig::default(), mixed_records()).unwrap();
    let frame = analyzed_frame(&report).unwrap();

    assert_eq!(frame.height(), 22);
    assert!(frame.column(COL_MOVING_AVG).is_ok());

    let flags = frame.column(COL_IS_ANOMALY).unwrap();
    assert_eq!(flags.null_count(), 1);
    let flags = flags.as_materialized_series().bool().unwrap();
    assert_eq!(flags.get(20), Some(true));
    assert_eq!(flags.get(21), None);
}

#[test]
fn test_export_parquet_round_trips_row_count() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("anomalies.parquet");
    let report = analyze_records(&AnalysisConfig::default(), mixed_records()).unwrap();

    let rows = export_report(&report, &path).unwrap();
    assert_eq!(rows, 22);

    let frame = ParquetReader::new(File::open(&path).unwrap()).finish().unwrap();
    assert_eq!(frame.height(), 22);
    assert!(frame.column(COL_IS_ANOMALY).is_ok());
}

#[test]
fn test_export_csv_writes_header() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("anomalies.csv");
    let report = analyze_records(&AnalysisConfig::default(), mixed_records()).unwrap();

    export_report(&report, &path).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    let header = text.lines().next().unwrap();
    assert!(header.contains("city"));
    assert!(header.contains(COL_MOVING_AVG));
    assert!(header.contains(COL_IS_ANOMALY));
    assert_eq!(text.lines().count(), 23);
}

#[test]
fn test_export_csv_keeps_subsecond_timestamps() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("anomalies.csv");
    let start = NaiveDate::from_ymd_opt(2015, 7, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap();
    let records = RecordSet::new(vec![
        TemperatureRecord::new("Berlin", start, 20.0, Season::Summer),
        TemperatureRecord::new(
            "Berlin",
            start + Duration::milliseconds(500),
            22.0,
            Season::Summer,
        ),
    ]);
    let report = analyze_records(&AnalysisConfig::default(), records.clone()).unwrap();

    export_report(&report, &path).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("2015-07-01 12:00:00.500"));

    // The exported table loads back with identical timestamps
    let reloaded = load_records(&path).unwrap();
    let original: Vec<_> = records.iter().map(|r| r.timestamp).collect();
    let restored: Vec<_> = reloaded.iter().map(|r| r.timestamp).collect();
    assert_eq!(restored, original);
}

#[test]
fn test_unsupported_extension_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("anomalies.json");
    let report = analyze_records(&AnalysisConfig::default(), mixed_records()).unwrap();

    assert!(matches!(
        export_report(&report, &path),
        Err(AnalysisError::UnsupportedExport { .. })
    ));
    assert!(!path.exists());
}
