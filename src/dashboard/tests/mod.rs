//! Dashboard orchestration tests
//!
//! Live lookups are driven by in-process stubs so the tests never touch
//! the network.

pub mod export_tests;

use crate::error::{AnalysisError, Result};
use crate::models::{RecordSet, Season, TemperatureRecord};
use crate::weather::TemperatureSource;
use chrono::NaiveDate;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Always reports the same temperature
pub struct FixedTemperature {
    pub temperature: f64,
    pub calls: AtomicUsize,
}

impl FixedTemperature {
    pub fn new(temperature: f64) -> Self {
        Self {
            temperature,
            calls: AtomicUsize::new(0),
        }
    }
}

impl TemperatureSource for FixedTemperature {
    async fn current_temperature(&self, _city: &str) -> Result<f64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.temperature)
    }
}

/// Fails the way the weather service does for an unknown city
pub struct UnknownCity;

impl TemperatureSource for UnknownCity {
    async fn current_temperature(&self, _city: &str) -> Result<f64> {
        Err(AnalysisError::fetch_failed(Some(404), "city not found"))
    }
}

pub fn summer_day(day: u32, hour: u32) -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2015, 7, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

/// Three Berlin summer readings: mean 22, sample std 2
pub fn berlin_summer() -> RecordSet {
    RecordSet::new(vec![
        TemperatureRecord::new("Berlin", summer_day(1, 12), 20.0, Season::Summer),
        TemperatureRecord::new("Berlin", summer_day(2, 12), 22.0, Season::Summer),
        TemperatureRecord::new("Berlin", summer_day(3, 12), 24.0, Season::Summer),
    ])
}

/// Two cities with a clear outlier in Cairo and a single winter reading in Oslo
pub fn mixed_records() -> RecordSet {
    let mut records = Vec::new();
    for day in 1..=20 {
        records.push(TemperatureRecord::new(
            "Cairo",
            summer_day(day, 12),
            34.0 + (day % 4) as f64 * 0.5,
            Season::Summer,
        ));
    }
    records.push(TemperatureRecord::new("Cairo", summer_day(21, 12), 48.0, Season::Summer));
    records.push(TemperatureRecord::new(
        "Oslo",
        NaiveDate::from_ymd_opt(2015, 1, 10)
            .unwrap()
            .and_hms_opt(6, 0, 0)
            .unwrap(),
        -8.0,
        Season::Winter,
    ));
    RecordSet::new(records)
}
