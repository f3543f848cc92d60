//! Temperature Anomaly Library
//!
//! Seasonal temperature anomaly analysis for multi-city historical
//! readings, with a live cross-check against OpenWeatherMap.
//!
//! This library provides tools for:
//! - Loading and validating historical CSV tables into typed records
//! - Per-(city, season) mean and sample standard deviation, computed with a
//!   sequential or a columnar (polars) strategy that produce the same table
//! - Per-city rolling moving averages
//! - Tri-state classification against a `mean ± k·std` normal band
//! - Fetching the current temperature of a city asynchronously
//! - Rendering the results and exporting the augmented table

pub mod classifier;
pub mod cli;
pub mod config;
pub mod constants;
pub mod dashboard;
pub mod error;
pub mod ingest;
pub mod models;
pub mod stats;
pub mod weather;

pub use config::{AnalysisConfig, StatsStrategy, WeatherConfig};
pub use dashboard::{AnalysisReport, Dashboard, DashboardOutcome, LiveCheck, LiveQuery};
pub use error::{AnalysisError, Result};
pub use models::{Classification, RecordSet, Season, SeasonalStat, TemperatureRecord};
pub use weather::{OpenWeatherClient, TemperatureSource};
