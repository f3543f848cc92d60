//! Seasonal statistics engine.
//!
//! Computes per-(city, season) mean and sample standard deviation through
//! an injectable [`StatsStrategy`], plus the per-city moving average and
//! descriptive summaries used by the dashboard. Both strategies produce
//! the same table; they differ only in how the aggregation is executed.

pub mod columnar;
pub mod moving_average;
pub mod sequential;
pub mod summary;

#[cfg(test)]
pub mod tests;

pub use self::moving_average::{MovingAverageSeries, compute_moving_average};
pub use self::summary::summarize_cities;

use crate::config::StatsStrategy;
use crate::constants::STRATEGY_TOLERANCE;
use crate::error::{AnalysisError, Result};
use crate::models::{
    NormalRange, RecordSet, Season, SeasonKey, SeasonalStat, StrategyComparison, StrategyTiming,
};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::debug;

/// Immutable table of seasonal statistics, one entry per (city, season)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeasonalStats {
    entries: BTreeMap<String, BTreeMap<Season, SeasonalStat>>,
}

impl SeasonalStats {
    /// Build a table from individual rows; a later row for the same key replaces an earlier one
    pub fn from_stats(stats: impl IntoIterator<Item = SeasonalStat>) -> Self {
        let mut entries: BTreeMap<String, BTreeMap<Season, SeasonalStat>> = BTreeMap::new();
        for stat in stats {
            entries
                .entry(stat.city.clone())
                .or_default()
                .insert(stat.season, stat);
        }
        Self { entries }
    }

    pub fn get(&self, city: &str, season: Season) -> Option<&SeasonalStat> {
        self.entries.get(city).and_then(|by_season| by_season.get(&season))
    }

    /// All rows ordered by city, then season
    pub fn iter(&self) -> impl Iterator<Item = &SeasonalStat> {
        self.entries.values().flat_map(|by_season| by_season.values())
    }

    /// Keys in table order: city, then season
    pub fn keys(&self) -> impl Iterator<Item = SeasonKey> + '_ {
        self.iter().map(SeasonalStat::key)
    }

    /// Rows for one city ordered by season
    pub fn for_city(&self, city: &str) -> impl Iterator<Item = &SeasonalStat> {
        self.entries
            .get(city)
            .into_iter()
            .flat_map(|by_season| by_season.values())
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Normal band for a key, failing when the key is absent or std is undefined
    pub fn normal_range(&self, city: &str, season: Season, sigma: f64) -> Result<NormalRange> {
        let stat = self
            .get(city, season)
            .ok_or_else(|| AnalysisError::UnknownCategory {
                city: city.to_string(),
                season,
            })?;
        stat.normal_range(sigma)
            .ok_or_else(|| AnalysisError::InsufficientData {
                city: city.to_string(),
                season,
            })
    }
}

/// Compute seasonal statistics with the given strategy
pub fn compute_seasonal_stats(
    records: &RecordSet,
    strategy: StatsStrategy,
) -> Result<SeasonalStats> {
    match strategy.resolve(records.len()) {
        StatsStrategy::Columnar => columnar::compute(records),
        _ => Ok(sequential::compute(records)),
    }
}

/// Compute seasonal statistics and record how long the strategy took
pub fn compute_seasonal_stats_timed(
    records: &RecordSet,
    strategy: StatsStrategy,
) -> Result<(SeasonalStats, StrategyTiming)> {
    let resolved = strategy.resolve(records.len());
    let start = Instant::now();
    let stats = compute_seasonal_stats(records, resolved)?;
    let elapsed = start.elapsed();

    debug!(
        "{} strategy computed {} seasonal groups in {:?}",
        resolved,
        stats.len(),
        elapsed
    );

    Ok((
        stats,
        StrategyTiming {
            strategy: resolved.to_string(),
            elapsed,
        },
    ))
}

/// Relative difference with an absolute floor of 1.0 on the denominator
fn relative_diff(a: f64, b: f64) -> f64 {
    if a == b {
        return 0.0;
    }
    (a - b).abs() / a.abs().max(b.abs()).max(1.0)
}

/// Compare two tables key by key
///
/// Tables agree when they have the same keys and counts, the same
/// defined/undefined std pattern, and every mean and std is within
/// [`STRATEGY_TOLERANCE`].
///
/// Differences are relative to the larger magnitude of the two values,
/// floored at 1.0: for values with magnitude below 1.0 (means near 0 °C,
/// small standard deviations) the tolerance is an absolute 1e-9.
pub fn compare_strategies(a: &SeasonalStats, b: &SeasonalStats) -> StrategyComparison {
    let mut max_relative_diff: f64 = 0.0;
    let mut structurally_equal = a.keys().eq(b.keys());

    for left in a.iter() {
        let Some(right) = b.get(&left.city, left.season) else {
            structurally_equal = false;
            continue;
        };
        if left.count != right.count {
            structurally_equal = false;
        }

        max_relative_diff = max_relative_diff.max(relative_diff(left.mean, right.mean));
        match (left.std, right.std) {
            (Some(l), Some(r)) => max_relative_diff = max_relative_diff.max(relative_diff(l, r)),
            (None, None) => {}
            _ => structurally_equal = false,
        }
    }

    StrategyComparison {
        max_relative_diff,
        agree: structurally_equal && max_relative_diff <= STRATEGY_TOLERANCE,
    }
}
