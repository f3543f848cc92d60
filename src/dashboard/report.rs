//! Terminal rendering of a dashboard run.

use super::{AnalysisReport, DashboardOutcome, LiveCheck};
use crate::models::{AnalyzedRecord, Classification};

use colored::*;
use std::fmt::Write;

/// What part of the outcome to render
#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    /// Restrict per-city sections to one city
    pub city: Option<String>,
    /// Only list rows flagged anomalous in the time series
    pub anomalies_only: bool,
    /// Show at most this many time-series rows, newest last
    pub limit: Option<usize>,
}

/// Render the whole outcome as terminal text
pub fn render(outcome: &DashboardOutcome, options: &ReportOptions) -> String {
    let mut out = String::new();
    let report = &outcome.report;

    let _ = writeln!(out, "{}", "Temperature Anomaly Dashboard".bright_green().bold());
    render_overview(&mut out, report);
    render_strategies(&mut out, report);
    render_seasonal_stats(&mut out, report, options.city.as_deref());
    render_city_summaries(&mut out, report, options.city.as_deref());

    let cities: Vec<&str> = match options.city.as_deref() {
        Some(city) => vec![city],
        None => report.records.cities(),
    };
    for city in cities {
        render_time_series(&mut out, report, city, options);
    }

    if let Some(live) = &outcome.live {
        render_live(&mut out, live);
    }

    out
}

fn render_overview(out: &mut String, report: &AnalysisReport) {
    let summary = &report.summary;
    let _ = writeln!(
        out,
        "  {} {}",
        "Records:".bright_cyan(),
        summary.records.to_string().bright_white().bold()
    );
    let _ = writeln!(
        out,
        "  {} {}",
        "Cities:".bright_cyan(),
        summary.cities.to_string().bright_white()
    );
    let _ = writeln!(
        out,
        "  {} {}",
        "Seasonal groups:".bright_cyan(),
        summary.seasonal_groups.to_string().bright_white()
    );
    let _ = writeln!(
        out,
        "  {} {}",
        "Anomalies:".bright_cyan(),
        summary.anomalies.to_string().bright_red().bold()
    );
    if summary.unclassified > 0 {
        let _ = writeln!(
            out,
            "  {} {}",
            "Unclassified:".bright_yellow(),
            summary.unclassified.to_string().bright_yellow()
        );
    }
    let _ = writeln!(
        out,
        "  {} {}ms",
        "Processing time:".bright_cyan(),
        summary.processing_time_ms
    );
}

fn render_strategies(out: &mut String, report: &AnalysisReport) {
    let _ = writeln!(out, "\n{}", "Statistics strategies".bright_yellow());
    for timing in &report.timings {
        let _ = writeln!(
            out,
            "  {:<12} {:>10.3} ms",
            timing.strategy,
            timing.elapsed.as_secs_f64() * 1000.0
        );
    }
    if let Some(comparison) = &report.comparison {
        let verdict = if comparison.agree {
            "agree".bright_green()
        } else {
            "DISAGREE".bright_red().bold()
        };
        let _ = writeln!(
            out,
            "  Strategies {} (max relative difference {:.3e})",
            verdict, comparison.max_relative_diff
        );
    }
}

fn render_seasonal_stats(out: &mut String, report: &AnalysisReport, city: Option<&str>) {
    let _ = writeln!(out, "\n{}", "Seasonal statistics".bright_yellow());
    let _ = writeln!(
        out,
        "  {:<16} {:<8} {:>7} {:>9} {:>9}",
        "city", "season", "count", "mean", "std"
    );

    let rows = report
        .seasonal_stats
        .iter()
        .filter(|stat| city.is_none_or(|c| stat.city == c));
    for stat in rows {
        let std = stat
            .std
            .map(|s| format!("{:.2}", s))
            .unwrap_or_else(|| "n/a".to_string());
        let _ = writeln!(
            out,
            "  {:<16} {:<8} {:>7} {:>9.2} {:>9}",
            stat.city, stat.season, stat.count, stat.mean, std
        );
    }
}

fn render_city_summaries(out: &mut String, report: &AnalysisReport, city: Option<&str>) {
    let _ = writeln!(out, "\n{}", "City summary".bright_yellow());
    let _ = writeln!(
        out,
        "  {:<16} {:>7} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8}",
        "city", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
    );

    let rows = report
        .summaries
        .iter()
        .filter(|summary| city.is_none_or(|c| summary.city == c));
    for s in rows {
        let std = s
            .std
            .map(|v| format!("{:.2}", v))
            .unwrap_or_else(|| "n/a".to_string());
        let _ = writeln!(
            out,
            "  {:<16} {:>7} {:>8.2} {:>8} {:>8.2} {:>8.2} {:>8.2} {:>8.2} {:>8.2}",
            s.city, s.count, s.mean, std, s.min, s.q25, s.median, s.q75, s.max
        );
    }
}

fn render_time_series(
    out: &mut String,
    report: &AnalysisReport,
    city: &str,
    options: &ReportOptions,
) {
    let rows: Vec<&AnalyzedRecord> = report
        .analyzed_for_city(city)
        .into_iter()
        .filter(|row| !options.anomalies_only || row.classification.is_anomalous())
        .collect();

    let title = format!("Time series: {}", city);
    let _ = writeln!(out, "\n{}", title.bright_yellow());
    if rows.is_empty() {
        let message = if options.anomalies_only {
            "no anomalies"
        } else {
            "no records"
        };
        let _ = writeln!(out, "  {}", message.dimmed());
        return;
    }

    let skip = options
        .limit
        .map(|limit| rows.len().saturating_sub(limit))
        .unwrap_or(0);
    if skip > 0 {
        let _ = writeln!(out, "  {}", format!("... {} earlier rows", skip).dimmed());
    }

    let _ = writeln!(
        out,
        "  {:<19} {:<8} {:>9} {:>11}  {}",
        "timestamp", "season", "temp", "moving avg", "status"
    );
    for row in &rows[skip..] {
        let status = match row.classification {
            Classification::Normal => "normal".normal(),
            Classification::Anomalous => "ANOMALY".bright_red().bold(),
            Classification::Unknown(_) => row.classification.to_string().bright_yellow(),
        };
        let _ = writeln!(
            out,
            "  {:<19} {:<8} {:>9.2} {:>11.2}  {}",
            row.record.timestamp.format("%Y-%m-%d %H:%M:%S"),
            row.record.season,
            row.record.temperature,
            row.moving_avg,
            status
        );
    }
}

fn render_live(out: &mut String, live: &LiveCheck) {
    let title = format!("Current weather: {} ({})", live.query.city, live.query.season);
    let _ = writeln!(out, "\n{}", title.bright_yellow());

    match &live.result {
        Ok(reading) => {
            let _ = writeln!(
                out,
                "  {} {:.2}°C",
                "Temperature:".bright_cyan(),
                reading.temperature
            );
            match &reading.range {
                Some(range) => {
                    let _ = writeln!(
                        out,
                        "  {} {:.2} to {:.2}",
                        "Normal range:".bright_cyan(),
                        range.lower,
                        range.upper
                    );
                }
                None => {
                    let _ = writeln!(out, "  {} n/a", "Normal range:".bright_cyan());
                }
            }
            let verdict = match reading.classification {
                Classification::Normal => "within the normal range".bright_green().bold(),
                Classification::Anomalous => "ANOMALOUS".bright_red().bold(),
                Classification::Unknown(reason) => {
                    format!("cannot classify: {}", reason).bright_yellow()
                }
            };
            let _ = writeln!(out, "  {} {}", "Status:".bright_cyan(), verdict);
        }
        Err(message) => {
            let _ = writeln!(
                out,
                "  {} {}",
                "Error fetching weather data:".bright_red(),
                message
            );
        }
    }
}
