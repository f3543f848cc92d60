//! Sequential vs columnar seasonal statistics.

use chrono::{Duration, NaiveDate};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use temperature_anomaly::stats::{compute_moving_average, compute_seasonal_stats};
use temperature_anomaly::{RecordSet, Season, StatsStrategy, TemperatureRecord};

const CITIES: &[(&str, f64)] = &[
    ("Berlin", 10.0),
    ("Cairo", 22.0),
    ("Lima", 19.0),
    ("Oslo", 6.0),
    ("Sydney", 18.0),
];

fn create_records(days_per_city: i64) -> RecordSet {
    let start = NaiveDate::from_ymd_opt(1990, 1, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap();
    let mut records = Vec::new();

    for &(city, base) in CITIES {
        for offset in 0..days_per_city {
            let ts = start + Duration::days(offset);
            let phase = 2.0 * std::f64::consts::PI * offset as f64 / 365.0;
            let noise = (offset as f64 * 0.7).sin() * 2.5;
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

fn bench_seasonal_stats(c: &mut Criterion) {
    let mut group = c.benchmark_group("SeasonalStats");

    for days in [365, 3_650, 36_500] {
        let records = create_records(days);
        let rows = records.len();

        group.bench_with_input(BenchmarkId::new("sequential", rows), &records, |b, records| {
            b.iter(|| compute_seasonal_stats(black_box(records), StatsStrategy::Sequential))
        });
        group.bench_with_input(BenchmarkId::new("columnar", rows), &records, |b, records| {
            b.iter(|| compute_seasonal_stats(black_box(records), StatsStrategy::Columnar))
        });
    }

    group.finish();
}

fn bench_moving_average(c: &mut Criterion) {
    let records = create_records(3_650);
    c.bench_function("moving_average_window_30", |b| {
        b.iter(|| compute_moving_average(black_box(&records), 30))
    });
}

criterion_group!(benches, bench_seasonal_stats, bench_moving_average);
criterion_main!(benches);
