//! Application constants for the temperature anomaly analyzer
//!
//! Default values, column names and service endpoints used throughout
//! the crate.

// =============================================================================
// Input Columns
// =============================================================================

pub const COL_TIMESTAMP: &str = "timestamp";
pub const COL_CITY: &str = "city";
pub const COL_TEMPERATURE: &str = "temperature";
pub const COL_SEASON: &str = "season";

/// Columns every input table must carry
pub const REQUIRED_COLUMNS: &[&str] = &[COL_TIMESTAMP, COL_CITY, COL_TEMPERATURE, COL_SEASON];

/// Timestamp layouts accepted at ingestion (RFC 3339 is tried separately);
/// the fractional part is optional
pub const TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// =============================================================================
// Output Columns
// =============================================================================

pub const COL_MOVING_AVG: &str = "moving_avg";
pub const COL_IS_ANOMALY: &str = "is_anomaly";
pub const COL_MEAN: &str = "mean";
pub const COL_STD: &str = "std";
pub const COL_COUNT: &str = "count";

// =============================================================================
// Statistics
// =============================================================================

/// Trailing window of the moving average, in records
pub const DEFAULT_WINDOW: usize = 30;

/// Width of the normal band in standard deviations
pub const DEFAULT_SIGMA_MULTIPLIER: f64 = 2.0;

/// Relative tolerance for strategy agreement
pub const STRATEGY_TOLERANCE: f64 = 1e-9;

/// Row count from which `Auto` prefers the columnar strategy
pub const AUTO_COLUMNAR_THRESHOLD: usize = 50_000;

// =============================================================================
// Live Weather
// =============================================================================

pub const OPENWEATHER_BASE_URL: &str = "http://api.openweathermap.org/data/2.5/weather";
pub const DEFAULT_UNITS: &str = "metric";
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

/// Printed in place of the API key in debug output
pub const REDACTED: &str = "***";

/// Message used when a failed response carries no `message` field
pub const UNKNOWN_FETCH_ERROR: &str = "Unknown Error";

// =============================================================================
// Configuration
// =============================================================================

pub const CONFIG_DIR_NAME: &str = "temperature-anomaly";
pub const CONFIG_FILE_NAME: &str = "config.toml";
