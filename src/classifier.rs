//! Anomaly classification against the seasonal normal band.
//!
//! A reading is normal when it lies inside `mean ± sigma * std` of its
//! (city, season) partition, bounds included. Readings that cannot be
//! judged (no statistics, single-record partition, non-finite value)
//! are `Unknown` and never defaulted to a boolean.

use crate::error::{AnalysisError, Result};
use crate::models::{AnalyzedRecord, Classification, RecordSet, Season, UnknownReason};
use crate::stats::{MovingAverageSeries, SeasonalStats};
use tracing::debug;

/// Classify one reading for a city and season
pub fn classify(
    temperature: f64,
    city: &str,
    season: Season,
    stats: &SeasonalStats,
    sigma: f64,
) -> Classification {
    let Some(stat) = stats.get(city, season) else {
        return Classification::Unknown(UnknownReason::NoStatistics);
    };
    let Some(range) = stat.normal_range(sigma) else {
        return Classification::Unknown(UnknownReason::InsufficientData);
    };
    if !temperature.is_finite() {
        return Classification::Unknown(UnknownReason::InvalidReading);
    }

    if range.contains(temperature) {
        Classification::Normal
    } else {
        Classification::Anomalous
    }
}

/// Check a live reading against the historical seasonal band
pub fn check_live_reading(
    current_temperature: f64,
    city: &str,
    season: Season,
    stats: &SeasonalStats,
    sigma: f64,
) -> Classification {
    let classification = classify(current_temperature, city, season, stats, sigma);
    debug!(
        "Live reading {:.2} for {} in {} classified as {}",
        current_temperature, city, season, classification
    );
    classification
}

/// Classify every historical record and attach its moving average
pub fn flag_anomalies(
    records: &RecordSet,
    stats: &SeasonalStats,
    moving_average: &MovingAverageSeries,
    sigma: f64,
) -> Result<Vec<AnalyzedRecord>> {
    if moving_average.len() != records.len() {
        return Err(AnalysisError::configuration(format!(
            "moving average has {} values for {} records",
            moving_average.len(),
            records.len()
        )));
    }

    let analyzed: Vec<AnalyzedRecord> = records
        .iter()
        .zip(moving_average.values())
        .map(|(record, &moving_avg)| AnalyzedRecord {
            classification: classify(
                record.temperature,
                &record.city,
                record.season,
                stats,
                sigma,
            ),
            moving_avg,
            record: record.clone(),
        })
        .collect();

    let anomalies = analyzed
        .iter()
        .filter(|r| r.classification.is_anomalous())
        .count();
    debug!(
        "Flagged {} anomalies among {} records",
        anomalies,
        analyzed.len()
    );

    Ok(analyzed)
}
