//! Per-city descriptive statistics (count, mean, std, quartiles, extremes).

use super::sequential::Accumulator;
use crate::models::{CitySummary, RecordSet};

/// Linear interpolation between closest ranks of a sorted, non-empty slice
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    sorted[lower] + (sorted[upper] - sorted[lower]) * (pos - lower as f64)
}

/// Summaries for every city, in first-seen order
pub fn summarize_cities(records: &RecordSet) -> Vec<CitySummary> {
    records
        .cities()
        .into_iter()
        .filter_map(|city| summarize_city(records, city))
        .collect()
}

pub fn summarize_city(records: &RecordSet, city: &str) -> Option<CitySummary> {
    let mut temps: Vec<f64> = records.for_city(city).map(|r| r.temperature).collect();
    if temps.is_empty() {
        return None;
    }

    let acc: Accumulator = temps.iter().copied().collect();
    temps.sort_by(f64::total_cmp);

    Some(CitySummary {
        city: city.to_string(),
        count: acc.count(),
        mean: acc.mean(),
        std: acc.std(),
        min: temps[0],
        q25: quantile(&temps, 0.25),
        median: quantile(&temps, 0.5),
        q75: quantile(&temps, 0.75),
        max: temps[temps.len() - 1],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Season, TemperatureRecord};
    use chrono::NaiveDate;

    fn record(city: &str, day: u32, temperature: f64) -> TemperatureRecord {
        let ts = NaiveDate::from_ymd_opt(2020, 1, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        TemperatureRecord::new(city, ts, temperature, Season::Winter)
    }

    #[test]
    fn test_quartiles_interpolate() {
        let records = RecordSet::new(vec![
            record("Oslo", 1, 4.0),
            record("Oslo", 2, 1.0),
            record("Oslo", 3, 3.0),
            record("Oslo", 4, 2.0),
        ]);

        let summary = summarize_city(&records, "Oslo").unwrap();
        assert_eq!(summary.count, 4);
        assert!((summary.mean - 2.5).abs() < 1e-12);
        assert_eq!(summary.min, 1.0);
        assert_eq!(summary.q25, 1.75);
        assert_eq!(summary.median, 2.5);
        assert_eq!(summary.q75, 3.25);
        assert_eq!(summary.max, 4.0);
    }

    #[test]
    fn test_summaries_follow_first_seen_order() {
        let records = RecordSet::new(vec![
            record("Rome", 1, 10.0),
            record("Oslo", 1, -3.0),
            record("Rome", 2, 12.0),
        ]);

        let summaries = summarize_cities(&records);
        let cities: Vec<&str> = summaries.iter().map(|s| s.city.as_str()).collect();
        assert_eq!(cities, vec!["Rome", "Oslo"]);
        assert_eq!(summaries[1].std, None);
        assert!(summarize_city(&records, "Lima").is_none());
    }
}
