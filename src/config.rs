//! Configuration management and validation.
//!
//! Provides the analysis configuration (moving-average window, sigma
//! multiplier, statistics strategy) and live-weather settings, with a
//! layered load: defaults, then an optional TOML file, then environment.

use crate::constants::{
    API_KEY_ENV, AUTO_COLUMNAR_THRESHOLD, CONFIG_DIR_NAME, CONFIG_FILE_NAME,
    DEFAULT_SIGMA_MULTIPLIER, DEFAULT_UNITS, DEFAULT_WINDOW, OPENWEATHER_BASE_URL, REDACTED,
};
use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Execution strategy for seasonal statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatsStrategy {
    /// Single pass over the rows with per-group accumulators
    Sequential,
    /// Polars group-by over the whole table
    Columnar,
    /// Pick based on row count and available cores
    Auto,
}

impl StatsStrategy {
    /// Resolve `Auto` into a concrete strategy for a table of `rows` records
    pub fn resolve(self, rows: usize) -> Self {
        match self {
            StatsStrategy::Auto => {
                let cores = num_cpus::get();
                let resolved = if rows >= AUTO_COLUMNAR_THRESHOLD && cores > 1 {
                    StatsStrategy::Columnar
                } else {
                    StatsStrategy::Sequential
                };
                debug!(
                    "Auto strategy resolved to {} ({} rows, {} cores)",
                    resolved, rows, cores
                );
                resolved
            }
            concrete => concrete,
        }
    }

    /// The other concrete strategy, used for cross-checking results
    pub fn counterpart(self) -> Self {
        match self {
            StatsStrategy::Columnar => StatsStrategy::Sequential,
            _ => StatsStrategy::Columnar,
        }
    }
}

impl fmt::Display for StatsStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatsStrategy::Sequential => write!(f, "sequential"),
            StatsStrategy::Columnar => write!(f, "columnar"),
            StatsStrategy::Auto => write!(f, "auto"),
        }
    }
}

impl FromStr for StatsStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" | "seq" => Ok(StatsStrategy::Sequential),
            "columnar" | "parallel" => Ok(StatsStrategy::Columnar),
            "auto" => Ok(StatsStrategy::Auto),
            other => Err(format!(
                "unknown strategy '{}' (expected sequential, columnar or auto)",
                other
            )),
        }
    }
}

/// Settings for the live OpenWeatherMap lookup
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Current-weather endpoint
    pub base_url: String,

    /// Unit system requested from the service
    pub units: String,

    /// API key; the lookup is skipped when absent
    pub api_key: Option<String>,
}

// Written by hand so the API key never reaches logs
impl fmt::Debug for WeatherConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeatherConfig")
            .field("base_url", &self.base_url)
            .field("units", &self.units)
            .field("api_key", &self.api_key.as_ref().map(|_| REDACTED))
            .finish()
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: OPENWEATHER_BASE_URL.to_string(),
            units: DEFAULT_UNITS.to_string(),
            api_key: None,
        }
    }
}

/// Configuration for one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Moving-average window in records
    pub window: usize,

    /// Width of the normal band in standard deviations
    pub sigma_multiplier: f64,

    /// Strategy used for the seasonal statistics that drive classification
    pub strategy: StatsStrategy,

    /// Also run the counterpart strategy and report agreement and timings
    pub compare_strategies: bool,

    /// Live weather settings
    pub weather: WeatherConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            sigma_multiplier: DEFAULT_SIGMA_MULTIPLIER,
            strategy: StatsStrategy::Auto,
            compare_strategies: true,
            weather: WeatherConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Create configuration with a custom moving-average window
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    /// Create configuration with a custom sigma multiplier
    pub fn with_sigma(mut self, sigma: f64) -> Self {
        self.sigma_multiplier = sigma;
        self
    }

    /// Select the statistics strategy
    pub fn with_strategy(mut self, strategy: StatsStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Skip the cross-check against the counterpart strategy
    pub fn without_strategy_comparison(mut self) -> Self {
        self.compare_strategies = false;
        self
    }

    /// Configure the live weather lookup
    pub fn with_weather(mut self, weather: WeatherConfig) -> Self {
        self.weather = weather;
        self
    }

    /// Set the API key for the live weather lookup
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.weather.api_key = Some(api_key.into());
        self
    }

    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.window == 0 {
            return Err(AnalysisError::configuration(
                "moving average window must be at least 1",
            ));
        }
        if !self.sigma_multiplier.is_finite() || self.sigma_multiplier <= 0.0 {
            return Err(AnalysisError::configuration(format!(
                "sigma multiplier must be a positive number, got {}",
                self.sigma_multiplier
            )));
        }
        if self.weather.base_url.trim().is_empty() {
            return Err(AnalysisError::configuration("weather base_url is empty"));
        }
        Ok(())
    }

    /// Default config file location, e.g. `~/.config/temperature-anomaly/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Parse a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| AnalysisError::ConfigFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| AnalysisError::ConfigFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Layered load: defaults, then file (explicit or default location), then environment
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => {
                    debug!("Loading configuration from {}", path.display());
                    Self::from_file(&path)?
                }
                None => Self::default(),
            },
        };

        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                config.weather.api_key = Some(key);
            }
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_are_valid() {
        let config = AnalysisConfig::default();
        assert_eq!(config.window, 30);
        assert_eq!(config.sigma_multiplier, 2.0);
        assert_eq!(config.strategy, StatsStrategy::Auto);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_window_rejected() {
        let config = AnalysisConfig::default().with_window(0);
        assert!(matches!(
            config.validate(),
            Err(AnalysisError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_bad_sigma_rejected() {
        assert!(AnalysisConfig::default().with_sigma(0.0).validate().is_err());
        assert!(AnalysisConfig::default().with_sigma(f64::NAN).validate().is_err());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "window = 7").unwrap();
        writeln!(file, "strategy = \"columnar\"").unwrap();
        writeln!(file, "[weather]").unwrap();
        writeln!(file, "units = \"imperial\"").unwrap();

        let config = AnalysisConfig::from_file(file.path()).unwrap();
        assert_eq!(config.window, 7);
        assert_eq!(config.strategy, StatsStrategy::Columnar);
        assert_eq!(config.sigma_multiplier, 2.0);
        assert_eq!(config.weather.units, "imperial");
        assert_eq!(config.weather.base_url, OPENWEATHER_BASE_URL);
    }

    #[test]
    fn test_invalid_file_reports_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "window = \"thirty\"").unwrap();

        match AnalysisConfig::from_file(file.path()) {
            Err(AnalysisError::ConfigFile { path, .. }) => assert_eq!(path, file.path()),
            other => panic!("Expected ConfigFile error, got {:?}", other),
        }
    }

    #[test]
    fn test_strategy_parsing_and_resolution() {
        assert_eq!("Sequential".parse::<StatsStrategy>(), Ok(StatsStrategy::Sequential));
        assert_eq!("parallel".parse::<StatsStrategy>(), Ok(StatsStrategy::Columnar));
        assert!("vectorised-ish".parse::<StatsStrategy>().is_err());

        assert_eq!(StatsStrategy::Auto.resolve(10), StatsStrategy::Sequential);
        assert_eq!(StatsStrategy::Columnar.resolve(10), StatsStrategy::Columnar);
        assert_eq!(StatsStrategy::Sequential.counterpart(), StatsStrategy::Columnar);
        assert_eq!(StatsStrategy::Columnar.counterpart(), StatsStrategy::Sequential);
    }

    #[test]
    fn test_debug_output_hides_api_key() {
        let config = AnalysisConfig::default().with_api_key("SECRET-KEY-123");
        let printed = format!("{:?}", config);

        assert!(!printed.contains("SECRET-KEY-123"));
        assert!(printed.contains("api_key: Some(\"***\")"));
        assert!(printed.contains(OPENWEATHER_BASE_URL));

        let unset = format!("{:?}", WeatherConfig::default());
        assert!(unset.contains("api_key: None"));
    }

    #[test]
    fn test_with_weather_replaces_live_settings() {
        let weather = WeatherConfig {
            base_url: "http://localhost:8080/weather".to_string(),
            units: "imperial".to_string(),
            api_key: Some("abc".to_string()),
        };
        let config = AnalysisConfig::default().with_weather(weather.clone());

        assert_eq!(config.weather, weather);
        assert_eq!(config.window, DEFAULT_WINDOW);
    }
}
