//! Command-line interface.
//!
//! Parses arguments, layers configuration (defaults, TOML file,
//! environment, flags), runs the dashboard and prints the report.

use crate::config::{AnalysisConfig, StatsStrategy};
use crate::constants::{API_KEY_ENV, REDACTED};
use crate::dashboard::export::export_report;
use crate::dashboard::report::{ReportOptions, render};
use crate::dashboard::{Dashboard, DashboardOutcome, LiveQuery};
use crate::ingest::load_records;
use crate::models::{RunSummary, Season};
use crate::weather::OpenWeatherClient;

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Parser)]
#[command(name = "temperature-anomaly")]
#[command(about = "Seasonal temperature anomaly analysis with a live weather cross-check")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    /// CSV file, or directory searched recursively for CSV files
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// City to focus on (defaults to the first city in the data)
    #[arg(short, long)]
    pub city: Option<String>,

    /// Season for the live comparison (defaults to the current season)
    #[arg(short, long)]
    pub season: Option<Season>,

    /// OpenWeatherMap API key; the live check is skipped without one
    #[arg(long, env = API_KEY_ENV, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Moving-average window in records
    #[arg(short, long)]
    pub window: Option<usize>,

    /// Width of the normal band in standard deviations
    #[arg(long)]
    pub sigma: Option<f64>,

    /// Statistics strategy (sequential, columnar, auto)
    #[arg(long)]
    pub strategy: Option<StatsStrategy>,

    /// Skip the cross-check against the other statistics strategy
    #[arg(long)]
    pub no_compare: bool,

    /// Configuration file (TOML)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Write the augmented table to a .csv or .parquet file
    #[arg(short, long, value_name = "PATH")]
    pub export: Option<PathBuf>,

    /// Only list anomalous rows in the time series
    #[arg(long)]
    pub anomalies_only: bool,

    /// Show at most this many time-series rows per city
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Enable verbose logging
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    pub quiet: bool,
}

// Written by hand so the API key never reaches logs
impl fmt::Debug for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Args")
            .field("input", &self.input)
            .field("city", &self.city)
            .field("season", &self.season)
            .field("api_key", &self.api_key.as_ref().map(|_| REDACTED))
            .field("window", &self.window)
            .field("sigma", &self.sigma)
            .field("strategy", &self.strategy)
            .field("no_compare", &self.no_compare)
            .field("config", &self.config)
            .field("export", &self.export)
            .field("anomalies_only", &self.anomalies_only)
            .field("limit", &self.limit)
            .field("verbose", &self.verbose)
            .field("quiet", &self.quiet)
            .finish()
    }
}

impl Args {
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
    }

    /// Apply command-line overrides on top of a loaded configuration
    pub fn apply_overrides(&self, mut config: AnalysisConfig) -> AnalysisConfig {
        if let Some(window) = self.window {
            config = config.with_window(window);
        }
        if let Some(sigma) = self.sigma {
            config = config.with_sigma(sigma);
        }
        if let Some(strategy) = self.strategy {
            config = config.with_strategy(strategy);
        }
        if self.no_compare {
            config = config.without_strategy_comparison();
        }
        if let Some(key) = self.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            config = config.with_api_key(key);
        }
        config
    }

    fn report_options(&self) -> ReportOptions {
        ReportOptions {
            city: self.city.clone(),
            anomalies_only: self.anomalies_only,
            limit: self.limit,
        }
    }
}

/// Set up structured logging based on CLI arguments
pub fn setup_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.log_level();

    // Create filter; RUST_LOG takes precedence over the flags
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("temperature_anomaly={}", log_level)));

    // Set up subscriber based on output format preference
    if args.quiet {
        // Minimal logging for quiet mode
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
            .context("Failed to initialise logging")?;
    } else {
        // Standard logging with timestamps
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .context("Failed to initialise logging")?;
    }

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

/// Run one dashboard session from parsed arguments
pub async fn run(args: Args) -> Result<RunSummary> {
    setup_logging(&args)?;
    debug!("Command line arguments: {:?}", args);

    // Load configuration with layered approach (defaults -> file -> env -> args)
    let config = AnalysisConfig::load(args.config.as_deref())
        .context("Failed to load configuration")?;
    let config = args.apply_overrides(config);
    config.validate().context("Invalid configuration")?;
    debug!("Effective configuration: {:?}", config);

    println!(
        "{} {}",
        "Input:".bright_cyan(),
        args.input.display().to_string().bright_white()
    );

    // Parse and validate the historical table off the async workers
    let input = args.input.clone();
    let records = tokio::task::spawn_blocking(move || load_records(&input))
        .await
        .context("Loading task failed")?
        .with_context(|| format!("Failed to load records from {}", args.input.display()))?;
    info!("Loaded {} records", records.len());

    // Pick the city and season for the live comparison
    let city = match &args.city {
        Some(city) => {
            if !records.contains_city(city) {
                warn!("City '{}' does not appear in the historical data", city);
            }
            Some(city.clone())
        }
        None => records.cities().first().map(|c| c.to_string()),
    };
    let season = args
        .season
        .unwrap_or_else(|| Season::of(&chrono::Local::now().naive_local()));

    let dashboard = Dashboard::new(config)?;
    let weather = &dashboard.config().weather;

    // Live lookup runs alongside the historical pipeline only when it can succeed
    let outcome = match (city, weather.api_key.is_some()) {
        (Some(city), true) => {
            let client = OpenWeatherClient::from_config(weather)?;
            let spinner = fetch_spinner(&args, &city)?;
            let outcome = dashboard
                .run_with_live(records, &client, LiveQuery::new(city, season))
                .await;
            if let Some(pb) = spinner {
                pb.finish_and_clear();
            }
            outcome?
        }
        (None, _) => {
            warn!("No records loaded; skipping live weather check");
            dashboard.run(records).await?
        }
        (Some(_), false) => {
            warn!(
                "No API key configured (set {} or pass --api-key); skipping live weather check",
                API_KEY_ENV
            );
            dashboard.run(records).await?
        }
    };

    // Print report
    print!("{}", render(&outcome, &args.report_options()));

    if let Some(path) = &args.export {
        export_outcome(&outcome, path)?;
    }

    Ok(outcome.report.summary)
}

fn fetch_spinner(args: &Args, city: &str) -> Result<Option<ProgressBar>> {
    if args.quiet {
        return Ok(None);
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(format!("Analyzing history and fetching current weather for {}...", city));
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(Some(pb))
}

fn export_outcome(outcome: &DashboardOutcome, path: &Path) -> Result<()> {
    let rows = export_report(&outcome.report, path)
        .with_context(|| format!("Failed to export results to {}", path.display()))?;
    println!(
        "\n{} {} rows to {}",
        "Exported".bright_green(),
        rows.to_string().bright_white().bold(),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_arguments() {
        let args = Args::try_parse_from(["temperature-anomaly", "data.csv"]).unwrap();
        assert_eq!(args.input, PathBuf::from("data.csv"));
        assert!(args.city.is_none());
        assert!(args.season.is_none());
        assert_eq!(args.log_level(), "info");
    }

    #[test]
    fn test_full_arguments() {
        let args = Args::try_parse_from([
            "temperature-anomaly",
            "data/",
            "--city",
            "Berlin",
            "--season",
            "Fall",
            "--window",
            "7",
            "--sigma",
            "3",
            "--strategy",
            "columnar",
            "--export",
            "out.parquet",
            "--anomalies-only",
            "--limit",
            "10",
            "--verbose",
        ])
        .unwrap();

        assert_eq!(args.city.as_deref(), Some("Berlin"));
        assert_eq!(args.season, Some(Season::Autumn));
        assert_eq!(args.strategy, Some(StatsStrategy::Columnar));
        assert_eq!(args.limit, Some(10));
        assert!(args.anomalies_only);
        assert_eq!(args.log_level(), "debug");
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(Args::try_parse_from(["t", "x.csv", "--season", "monsoon"]).is_err());
        assert!(Args::try_parse_from(["t", "x.csv", "--strategy", "gpu"]).is_err());
        assert!(Args::try_parse_from(["t", "x.csv", "--verbose", "--quiet"]).is_err());
        assert!(Args::try_parse_from(["t"]).is_err());
    }

    #[test]
    fn test_overrides_replace_file_values() {
        let args = Args::try_parse_from([
            "t",
            "x.csv",
            "--window",
            "5",
            "--sigma",
            "1.5",
            "--strategy",
            "sequential",
            "--no-compare",
            "--api-key",
            "abc",
        ])
        .unwrap();

        let config = args.apply_overrides(AnalysisConfig::default());
        assert_eq!(config.window, 5);
        assert_eq!(config.sigma_multiplier, 1.5);
        assert_eq!(config.strategy, StatsStrategy::Sequential);
        assert!(!config.compare_strategies);
        assert_eq!(config.weather.api_key.as_deref(), Some("abc"));
    }

    #[test]
    fn test_debug_output_hides_api_key() {
        let args = Args::try_parse_from(["t", "x.csv", "--api-key", "SECRET-KEY-123"]).unwrap();

        let printed_args = format!("{:?}", args);
        assert!(!printed_args.contains("SECRET-KEY-123"));
        assert!(printed_args.contains("api_key: Some(\"***\")"));
        assert!(printed_args.contains("x.csv"));

        let printed_config = format!("{:?}", args.apply_overrides(AnalysisConfig::default()));
        assert!(!printed_config.contains("SECRET-KEY-123"));
    }

    #[test]
    fn test_absent_overrides_keep_configuration() {
        let args = Args::try_parse_from(["t", "x.csv"]).unwrap();
        let base = AnalysisConfig::default().with_window(12);
        let config = args.apply_overrides(base.clone());
        assert_eq!(config.window, 12);
        assert_eq!(config.sigma_multiplier, base.sigma_multiplier);
        assert_eq!(config.strategy, base.strategy);
    }
}
