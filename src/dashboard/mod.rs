//! Analysis orchestration for one dashboard run.
//!
//! Runs the historical pipeline (seasonal statistics, moving average,
//! anomaly flags, city summaries) on a blocking task while the live
//! weather lookup proceeds concurrently, then joins both at a single call
//! site. A failed lookup only affects the live section of the outcome.

pub mod export;
pub mod report;

#[cfg(test)]
pub mod tests;

use crate::classifier::{check_live_reading, flag_anomalies};
use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::models::{
    AnalyzedRecord, CitySummary, Classification, NormalRange, RecordSet, RunSummary, Season,
    StrategyComparison, StrategyTiming,
};
use crate::stats::{
    MovingAverageSeries, SeasonalStats, compare_strategies, compute_moving_average,
    compute_seasonal_stats_timed, summarize_cities,
};
use crate::weather::TemperatureSource;

use futures::future;
use std::time::Instant;
use tokio::task;
use tracing::{debug, info, warn};

/// Everything the historical part of the dashboard renders
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub records: RecordSet,
    pub seasonal_stats: SeasonalStats,
    pub moving_average: MovingAverageSeries,
    pub analyzed: Vec<AnalyzedRecord>,
    pub summaries: Vec<CitySummary>,
    pub timings: Vec<StrategyTiming>,
    pub comparison: Option<StrategyComparison>,
    pub summary: RunSummary,
}

impl AnalysisReport {
    /// Augmented rows for one city, oldest first
    pub fn analyzed_for_city(&self, city: &str) -> Vec<&AnalyzedRecord> {
        let mut rows: Vec<&AnalyzedRecord> = self
            .analyzed
            .iter()
            .filter(|row| row.record.city == city)
            .collect();
        rows.sort_by_key(|row| row.record.timestamp);
        rows
    }

    pub fn summary_for_city(&self, city: &str) -> Option<&CitySummary> {
        self.summaries.iter().find(|s| s.city == city)
    }
}

/// Which city and season the live reading is compared against
#[derive(Debug, Clone, PartialEq)]
pub struct LiveQuery {
    pub city: String,
    pub season: Season,
}

impl LiveQuery {
    pub fn new(city: impl Into<String>, season: Season) -> Self {
        Self {
            city: city.into(),
            season,
        }
    }
}

/// Successful live reading and its classification
#[derive(Debug, Clone, PartialEq)]
pub struct LiveReading {
    pub temperature: f64,
    pub classification: Classification,
    pub range: Option<NormalRange>,
}

/// Outcome of the live comparison; `Err` carries the message shown to the user
#[derive(Debug, Clone, PartialEq)]
pub struct LiveCheck {
    pub query: LiveQuery,
    pub result: std::result::Result<LiveReading, String>,
}

/// Result of a full dashboard run
#[derive(Debug, Clone)]
pub struct DashboardOutcome {
    pub report: AnalysisReport,
    pub live: Option<LiveCheck>,
}

/// Run the historical pipeline synchronously
pub fn analyze_records(config: &AnalysisConfig, records: RecordSet) -> Result<AnalysisReport> {
    config.validate()?;
    let start_time = Instant::now();

    // Seasonal statistics with the configured strategy drive classification
    let primary = config.strategy.resolve(records.len());
    let (seasonal_stats, primary_timing) = compute_seasonal_stats_timed(&records, primary)?;
    let mut timings = vec![primary_timing];

    // Cross-check against the other strategy
    let comparison = if config.compare_strategies {
        let (counterpart_stats, counterpart_timing) =
            compute_seasonal_stats_timed(&records, primary.counterpart())?;
        timings.push(counterpart_timing);

        let comparison = compare_strategies(&seasonal_stats, &counterpart_stats);
        if comparison.agree {
            debug!(
                "Strategies agree (max relative difference {:.3e})",
                comparison.max_relative_diff
            );
        } else {
            warn!(
                "Strategies disagree: max relative difference {:.3e}",
                comparison.max_relative_diff
            );
        }
        Some(comparison)
    } else {
        None
    };

    // Smooth and flag the historical rows
    let moving_average = compute_moving_average(&records, config.window)?;
    let analyzed = flag_anomalies(
        &records,
        &seasonal_stats,
        &moving_average,
        config.sigma_multiplier,
    )?;
    let summaries = summarize_cities(&records);

    // Generate run summary
    let summary = RunSummary {
        records: records.len(),
        cities: summaries.len(),
        seasonal_groups: seasonal_stats.len(),
        anomalies: analyzed
            .iter()
            .filter(|row| row.classification.is_anomalous())
            .count(),
        unclassified: analyzed
            .iter()
            .filter(|row| row.classification.is_unknown())
            .count(),
        processing_time_ms: start_time.elapsed().as_millis(),
    };

    info!(
        "Analyzed {} records: {} cities, {} seasonal groups, {} anomalies",
        summary.records, summary.cities, summary.seasonal_groups, summary.anomalies
    );

    Ok(AnalysisReport {
        records,
        seasonal_stats,
        moving_average,
        analyzed,
        summaries,
        timings,
        comparison,
        summary,
    })
}

/// Dashboard for one uploaded table
#[derive(Debug, Clone)]
pub struct Dashboard {
    config: AnalysisConfig,
}

impl Dashboard {
    /// Create a dashboard, rejecting invalid configuration up front
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Run the historical pipeline on a blocking task
    pub async fn analyze(&self, records: RecordSet) -> Result<AnalysisReport> {
        let config = self.config.clone();
        task::spawn_blocking(move || analyze_records(&config, records))
            .await
            .map_err(|e| AnalysisError::TaskFailed {
                reason: format!("analysis task panicked or was cancelled: {}", e),
            })?
    }

    /// Historical analysis only
    pub async fn run(&self, records: RecordSet) -> Result<DashboardOutcome> {
        let report = self.analyze(records).await?;
        Ok(DashboardOutcome { report, live: None })
    }

    /// Historical analysis plus a live comparison for `query`
    ///
    /// The lookup runs concurrently with the analysis. Analysis errors
    /// abort the run; lookup errors end up in [`LiveCheck::result`].
    pub async fn run_with_live<S>(
        &self,
        records: RecordSet,
        source: &S,
        query: LiveQuery,
    ) -> Result<DashboardOutcome>
    where
        S: TemperatureSource + Sync,
    {
        // Both sides always complete; only the analysis result is fatal
        let (report, reading) =
            future::join(self.analyze(records), source.current_temperature(&query.city)).await;
        let report = report?;

        // Compare the live reading against the freshly built table
        let result = match reading {
            Ok(temperature) => Ok(self.evaluate_live(temperature, &query, &report.seasonal_stats)),
            Err(e) => {
                warn!("Live lookup for {} failed: {}", query.city, e);
                Err(e.user_message())
            }
        };

        Ok(DashboardOutcome {
            report,
            live: Some(LiveCheck { query, result }),
        })
    }

    /// Classify a live reading against an existing statistics table
    pub fn evaluate_live(
        &self,
        temperature: f64,
        query: &LiveQuery,
        stats: &SeasonalStats,
    ) -> LiveReading {
        let sigma = self.config.sigma_multiplier;
        LiveReading {
            temperature,
            classification: check_live_reading(
                temperature,
                &query.city,
                query.season,
                stats,
                sigma,
            ),
            range: stats
                .get(&query.city, query.season)
                .and_then(|stat| stat.normal_range(sigma)),
        }
    }
}
