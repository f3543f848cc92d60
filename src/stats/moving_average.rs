//! Per-city trailing moving average.
//!
//! Each city's records are ordered by timestamp (ties keep input order)
//! and smoothed with a trailing window that expands from a single record
//! at the start of the series. Windows never span cities.

use crate::error::{AnalysisError, Result};
use crate::models::RecordSet;
use chrono::NaiveDateTime;
use std::collections::HashMap;
use tracing::debug;

/// Moving averages aligned 1:1 with the records they were computed from
#[derive(Debug, Clone, PartialEq)]
pub struct MovingAverageSeries {
    window: usize,
    values: Vec<f64>,
}

impl MovingAverageSeries {
    pub fn window(&self) -> usize {
        self.window
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Moving average of the record at `index` (input order)
    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// (timestamp, moving average) pairs for one city, oldest first
    pub fn for_city(&self, records: &RecordSet, city: &str) -> Vec<(NaiveDateTime, f64)> {
        let mut series: Vec<(NaiveDateTime, f64)> = records
            .iter()
            .zip(&self.values)
            .filter(|(record, _)| record.city == city)
            .map(|(record, avg)| (record.timestamp, *avg))
            .collect();
        series.sort_by_key(|(timestamp, _)| *timestamp);
        series
    }
}

/// Mean of the current record and up to `window - 1` preceding records of the same city
pub fn compute_moving_average(records: &RecordSet, window: usize) -> Result<MovingAverageSeries> {
    if window == 0 {
        return Err(AnalysisError::configuration(
            "moving average window must be at least 1",
        ));
    }

    let slice = records.as_slice();
    let mut by_city: HashMap<&str, Vec<usize>> = HashMap::new();
    for (idx, record) in slice.iter().enumerate() {
        by_city.entry(record.city.as_str()).or_default().push(idx);
    }

    let mut values = vec![0.0; slice.len()];
    for indices in by_city.values_mut() {
        indices.sort_by_key(|&idx| slice[idx].timestamp);

        let mut sum = 0.0;
        for (pos, &idx) in indices.iter().enumerate() {
            sum += slice[idx].temperature;
            if pos >= window {
                sum -= slice[indices[pos - window]].temperature;
            }
            let span = (pos + 1).min(window);
            values[idx] = sum / span as f64;
        }
    }

    debug!(
        "Computed moving average (window {}) for {} records across {} cities",
        window,
        slice.len(),
        by_city.len()
    );

    Ok(MovingAverageSeries { window, values })
}
