//! Error handling for temperature anomaly analysis.
//!
//! Provides error types with context for ingestion, configuration,
//! statistics and live weather lookups.

use std::path::PathBuf;
use thiserror::Error;

use crate::models::Season;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Input not found at path: {path}")]
    InputNotFound { path: PathBuf },

    #[error("No CSV files found under: {path}")]
    NoInputFiles { path: PathBuf },

    #[error("Required column '{column}' is missing (available: {})", .available.join(", "))]
    MissingColumn {
        column: String,
        available: Vec<String>,
    },

    #[error("Invalid record at row {row}: {reason}")]
    InvalidRecord { row: usize, reason: String },

    #[error("Configuration error: {message}")]
    InvalidConfiguration { message: String },

    #[error("Failed to load configuration file {path}: {reason}")]
    ConfigFile { path: PathBuf, reason: String },

    #[error("Insufficient data to compute a normal range for {city} in {season}")]
    InsufficientData { city: String, season: Season },

    #[error("No seasonal statistics for {city} in {season}")]
    UnknownCategory { city: String, season: Season },

    #[error("Weather lookup failed: {message}")]
    FetchFailed {
        status: Option<u16>,
        message: String,
    },

    #[error("Malformed weather response: {reason}")]
    MalformedResponse { reason: String },

    #[error("No OpenWeatherMap API key configured")]
    MissingApiKey,

    #[error("Background task failed: {reason}")]
    TaskFailed { reason: String },

    #[error("Processing interrupted: {reason}")]
    Interrupted { reason: String },

    #[error("Unsupported export format for {path} (expected .csv or .parquet)")]
    UnsupportedExport { path: PathBuf },
}

impl AnalysisError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }

    /// Create an invalid record error for a 1-based data row
    pub fn invalid_record(row: usize, reason: impl Into<String>) -> Self {
        Self::InvalidRecord {
            row,
            reason: reason.into(),
        }
    }

    /// Create a fetch failure, optionally tagged with the HTTP status
    pub fn fetch_failed(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::FetchFailed {
            status,
            message: message.into(),
        }
    }

    /// Message suitable for the live-weather panel of the report
    pub fn user_message(&self) -> String {
        match self {
            Self::FetchFailed { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
