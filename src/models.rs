//! Core data structures for temperature anomaly analysis.
//!
//! Defines seasons, validated temperature records, seasonal statistics
//! rows, classification outcomes and the run-level summaries consumed by
//! the dashboard.

use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Meteorological season label carried by every record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Autumn,
}

impl Season {
    pub const ALL: [Season; 4] = [
        Season::Winter,
        Season::Spring,
        Season::Summer,
        Season::Autumn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Winter => "winter",
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Autumn => "autumn",
        }
    }

    /// Northern-hemisphere meteorological season for a calendar month (1-12)
    pub fn from_month(month: u32) -> Option<Self> {
        match month {
            12 | 1 | 2 => Some(Season::Winter),
            3..=5 => Some(Season::Spring),
            6..=8 => Some(Season::Summer),
            9..=11 => Some(Season::Autumn),
            _ => None,
        }
    }

    /// Season of the given instant
    pub fn of(timestamp: &NaiveDateTime) -> Self {
        // month() is always 1..=12
        Self::from_month(timestamp.month()).unwrap_or(Season::Winter)
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown season '{0}' (expected winter, spring, summer or autumn)")]
pub struct ParseSeasonError(pub String);

impl FromStr for Season {
    type Err = ParseSeasonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "winter" => Ok(Season::Winter),
            "spring" => Ok(Season::Spring),
            "summer" => Ok(Season::Summer),
            "autumn" | "fall" => Ok(Season::Autumn),
            _ => Err(ParseSeasonError(s.to_string())),
        }
    }
}

/// One validated row of the historical table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureRecord {
    pub city: String,
    pub timestamp: NaiveDateTime,
    pub temperature: f64,
    pub season: Season,
}

impl TemperatureRecord {
    pub fn new(
        city: impl Into<String>,
        timestamp: NaiveDateTime,
        temperature: f64,
        season: Season,
    ) -> Self {
        Self {
            city: city.into(),
            timestamp,
            temperature,
            season,
        }
    }
}

/// Ordered collection of records loaded for a single analysis run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
    records: Vec<TemperatureRecord>,
}

impl RecordSet {
    pub fn new(records: Vec<TemperatureRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TemperatureRecord> {
        self.records.iter()
    }

    pub fn as_slice(&self) -> &[TemperatureRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<TemperatureRecord> {
        self.records
    }

    /// Distinct cities in first-seen order
    pub fn cities(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.records
            .iter()
            .filter(|r| seen.insert(r.city.as_str()))
            .map(|r| r.city.as_str())
            .collect()
    }

    pub fn contains_city(&self, city: &str) -> bool {
        self.records.iter().any(|r| r.city == city)
    }

    /// Records of one city, in input order
    pub fn for_city<'a>(&'a self, city: &'a str) -> impl Iterator<Item = &'a TemperatureRecord> {
        self.records.iter().filter(move |r| r.city == city)
    }
}

impl From<Vec<TemperatureRecord>> for RecordSet {
    fn from(records: Vec<TemperatureRecord>) -> Self {
        Self::new(records)
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a TemperatureRecord;
    type IntoIter = std::slice::Iter<'a, TemperatureRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Grouping key for seasonal statistics
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SeasonKey {
    pub city: String,
    pub season: Season,
}

impl SeasonKey {
    pub fn new(city: impl Into<String>, season: Season) -> Self {
        Self {
            city: city.into(),
            season,
        }
    }
}

/// Mean and sample standard deviation of one (city, season) partition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalStat {
    pub city: String,
    pub season: Season,
    pub count: usize,
    pub mean: f64,
    /// `None` when the partition has a single record
    pub std: Option<f64>,
}

impl SeasonalStat {
    pub fn key(&self) -> SeasonKey {
        SeasonKey::new(self.city.clone(), self.season)
    }

    /// Band of `mean ± sigma * std`, or `None` when std is undefined
    pub fn normal_range(&self, sigma: f64) -> Option<NormalRange> {
        self.std.map(|std| NormalRange {
            lower: self.mean - sigma * std,
            upper: self.mean + sigma * std,
        })
    }
}

/// Closed interval of temperatures considered normal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalRange {
    pub lower: f64,
    pub upper: f64,
}

impl NormalRange {
    pub fn contains(&self, temperature: f64) -> bool {
        self.lower <= temperature && temperature <= self.upper
    }
}

/// Why a reading could not be classified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownReason {
    /// No statistics for the (city, season) pair
    NoStatistics,
    /// The partition has a single record, so std is undefined
    InsufficientData,
    /// The reading itself is NaN or infinite
    InvalidReading,
}

impl fmt::Display for UnknownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnknownReason::NoStatistics => write!(f, "no seasonal statistics"),
            UnknownReason::InsufficientData => write!(f, "insufficient data"),
            UnknownReason::InvalidReading => write!(f, "invalid reading"),
        }
    }
}

/// Tri-state outcome of the 2-sigma rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Normal,
    Anomalous,
    Unknown(UnknownReason),
}

impl Classification {
    /// `Some(true)` for anomalous, `Some(false)` for normal, `None` otherwise
    pub fn as_anomaly_flag(&self) -> Option<bool> {
        match self {
            Classification::Normal => Some(false),
            Classification::Anomalous => Some(true),
            Classification::Unknown(_) => None,
        }
    }

    pub fn is_anomalous(&self) -> bool {
        matches!(self, Classification::Anomalous)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Classification::Unknown(_))
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Normal => write!(f, "normal"),
            Classification::Anomalous => write!(f, "anomalous"),
            Classification::Unknown(reason) => write!(f, "unknown ({})", reason),
        }
    }
}

/// Historical row augmented with its moving average and anomaly flag
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyzedRecord {
    pub record: TemperatureRecord,
    pub moving_avg: f64,
    pub classification: Classification,
}

impl AnalyzedRecord {
    pub fn is_anomaly(&self) -> Option<bool> {
        self.classification.as_anomaly_flag()
    }
}

/// Descriptive statistics of all readings for one city
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CitySummary {
    pub city: String,
    pub count: usize,
    pub mean: f64,
    pub std: Option<f64>,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

/// Wall-clock cost of one statistics strategy
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyTiming {
    pub strategy: String,
    pub elapsed: Duration,
}

/// Agreement between two seasonal statistics tables
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrategyComparison {
    pub max_relative_diff: f64,
    pub agree: bool,
}

/// Counters reported at the end of a run
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunSummary {
    pub records: usize,
    pub cities: usize,
    pub seasonal_groups: usize,
    pub anomalies: usize,
    pub unclassified: usize,
    pub processing_time_ms: u128,
}
