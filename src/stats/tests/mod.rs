//! Tests for the seasonal statistics engine
//!
//! Shared fixtures build deterministic multi-city series so the
//! strategies and the moving average can be checked against each other.


use crate::models::{RecordSet, Season, TemperatureRecord};
use chrono::{Duration, NaiveDate, NaiveDateTime};

pub fn day(offset: i64) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2010, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + Duration::days(offset)
}

pub fn record(city: &str, offset: i64, temperature: f64, season: Season) -> TemperatureRecord {
    TemperatureRecord::new(city, day(offset), temperature, season)
}

/// Seasonal sine wave plus LCG noise, `days` readings per city
pub fn synthetic_records(cities: &[(&str, f64)], days: i64) -> RecordSet {
    let mut state: u64 = 0x2545_F491_4F6C_DD1D;
    let mut records = Vec::new();

    for &(city, base) in cities {
        for offset in 0..days {
            state = state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            let noise = ((state >> 33) as f64 / (1u64 << 31) as f64 - 0.5) * 6.0;
            let phase = 2.0 * std::f64::consts::PI * offset as f64 / 365.0;
            let ts = day(offset);
            records.push(TemperatureRecord::new(
                city,
                ts,
                base - 10.0 * phase.cos() + noise,
                Season::of(&ts),
            ));
        }
    }

    RecordSet::new(records)
}
