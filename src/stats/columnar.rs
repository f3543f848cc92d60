//! Grouped/columnar strategy.
//!
//! Loads the records into a polars `DataFrame` and aggregates the whole
//! table in one lazy group-by; polars spreads the per-group work across
//! its thread pool.

use super::SeasonalStats;
use crate::constants::{
    COL_CITY, COL_COUNT, COL_MEAN, COL_SEASON, COL_STD, COL_TEMPERATURE, COL_TIMESTAMP,
};
use crate::error::{AnalysisError, Result};
use crate::models::{RecordSet, Season, SeasonalStat};
use polars::prelude::*;
use tracing::debug;

/// Fractional seconds are written only when present
const EXPORT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Columnar view of the records: city, timestamp, temperature, season
pub fn records_to_frame(records: &RecordSet) -> Result<DataFrame> {
    let cities: Vec<&str> = records.iter().map(|r| r.city.as_str()).collect();
    let timestamps: Vec<String> = records
        .iter()
        .map(|r| r.timestamp.format(EXPORT_TIMESTAMP_FORMAT).to_string())
        .collect();
    let temperatures: Vec<f64> = records.iter().map(|r| r.temperature).collect();
    let seasons: Vec<&str> = records.iter().map(|r| r.season.as_str()).collect();

    let frame = df!(
        COL_CITY => cities,
        COL_TIMESTAMP => timestamps,
        COL_TEMPERATURE => temperatures,
        COL_SEASON => seasons,
    )?;
    Ok(frame)
}

pub fn compute(records: &RecordSet) -> Result<SeasonalStats> {
    if records.is_empty() {
        return Ok(SeasonalStats::default());
    }

    let grouped = records_to_frame(records)?
        .lazy()
        .group_by([col(COL_CITY), col(COL_SEASON)])
        .agg([
            col(COL_TEMPERATURE).mean().alias(COL_MEAN),
            col(COL_TEMPERATURE).std(1).alias(COL_STD),
            col(COL_TEMPERATURE)
                .count()
                .cast(DataType::UInt64)
                .alias(COL_COUNT),
        ])
        .collect()?;

    debug!("Columnar group-by produced {} groups", grouped.height());

    let cities = grouped.column(COL_CITY)?.as_materialized_series().str()?;
    let seasons = grouped.column(COL_SEASON)?.as_materialized_series().str()?;
    let means = grouped.column(COL_MEAN)?.as_materialized_series().f64()?;
    let stds = grouped.column(COL_STD)?.as_materialized_series().f64()?;
    let counts = grouped.column(COL_COUNT)?.as_materialized_series().u64()?;

    let mut stats = Vec::with_capacity(grouped.height());
    for idx in 0..grouped.height() {
        let group = idx + 1;
        let city = cities
            .get(idx)
            .ok_or_else(|| AnalysisError::invalid_record(group, "group without a city"))?;
        let season = seasons
            .get(idx)
            .ok_or_else(|| AnalysisError::invalid_record(group, "group without a season"))?
            .parse::<Season>()
            .map_err(|e| AnalysisError::invalid_record(group, e.to_string()))?;
        let mean = means
            .get(idx)
            .ok_or_else(|| AnalysisError::invalid_record(group, "group without a mean"))?;
        let count = counts.get(idx).unwrap_or(0) as usize;

        stats.push(SeasonalStat {
            city: city.to_string(),
            season,
            count,
            mean,
            // polars yields null (or NaN) for single-row groups
            std: stds.get(idx).filter(|s| s.is_finite()),
        });
    }

    Ok(SeasonalStats::from_stats(stats))
}
