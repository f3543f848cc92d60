//! Export of the augmented record table.
//!
//! Writes the input columns plus `moving_avg`, `is_anomaly` and the
//! classification label as CSV or Parquet, chosen by file extension.

use super::AnalysisReport;
use crate::constants::{COL_IS_ANOMALY, COL_MOVING_AVG};
use crate::error::{AnalysisError, Result};
use crate::stats::columnar::records_to_frame;

use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::debug;

const COL_CLASSIFICATION: &str = "classification";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Parquet,
}

impl ExportFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_string_lossy().to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(ExportFormat::Csv),
            "parquet" | "pq" => Some(ExportFormat::Parquet),
            _ => None,
        }
    }
}

/// Build the augmented table in record order
pub fn analyzed_frame(report: &AnalysisReport) -> Result<DataFrame> {
    let mut frame = records_to_frame(&report.records)?;

    let moving_avg: Vec<f64> = report.analyzed.iter().map(|row| row.moving_avg).collect();
    let is_anomaly: Vec<Option<bool>> =
        report.analyzed.iter().map(|row| row.is_anomaly()).collect();
    let labels: Vec<String> = report
        .analyzed
        .iter()
        .map(|row| row.classification.to_string())
        .collect();

    frame.with_column(Series::new(COL_MOVING_AVG.into(), moving_avg))?;
    frame.with_column(Series::new(COL_IS_ANOMALY.into(), is_anomaly))?;
    frame.with_column(Series::new(COL_CLASSIFICATION.into(), labels))?;

    Ok(frame)
}

/// Write the augmented table and return the number of rows written
pub fn export_report(report: &AnalysisReport, path: &Path) -> Result<usize> {
    let format = ExportFormat::from_path(path).ok_or_else(|| AnalysisError::UnsupportedExport {
        path: path.to_path_buf(),
    })?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut frame = analyzed_frame(report)?;
    let rows = frame.height();
    let mut file = File::create(path)?;

    match format {
        ExportFormat::Csv => {
            CsvWriter::new(&mut file)
                .include_header(true)
                .finish(&mut frame)?;
        }
        ExportFormat::Parquet => {
            ParquetWriter::new(file)
                .with_compression(ParquetCompression::Snappy)
                .finish(&mut frame)?;
        }
    }

    debug!("Exported {} rows to {} as {:?}", rows, path.display(), format);
    Ok(rows)
}
