//! Row-wise sequential strategy.
//!
//! One pass over the records, folding each temperature into a running
//! accumulator keyed by (city, season).

use super::SeasonalStats;
use crate::models::{RecordSet, Season, SeasonalStat};
use std::collections::HashMap;

/// Running mean and sum of squared deviations (Welford)
#[derive(Debug, Clone, Copy, Default)]
pub struct Accumulator {
    count: usize,
    mean: f64,
    m2: f64,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Sample standard deviation (n - 1); `None` below two values
    pub fn std(&self) -> Option<f64> {
        if self.count > 1 {
            Some((self.m2 / (self.count - 1) as f64).sqrt())
        } else {
            None
        }
    }
}

impl FromIterator<f64> for Accumulator {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut acc = Accumulator::new();
        for value in iter {
            acc.push(value);
        }
        acc
    }
}

pub fn compute(records: &RecordSet) -> SeasonalStats {
    let mut groups: HashMap<(&str, Season), Accumulator> = HashMap::new();

    for record in records {
        groups
            .entry((record.city.as_str(), record.season))
            .or_default()
            .push(record.temperature);
    }

    SeasonalStats::from_stats(groups.into_iter().map(|((city, season), acc)| SeasonalStat {
        city: city.to_string(),
        season,
        count: acc.count(),
        mean: acc.mean(),
        std: acc.std(),
    }))
}
