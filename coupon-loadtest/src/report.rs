//! Post-run latency report.
//!
//! Goose aggregates every request's response time into a histogram keyed by
//! milliseconds. Which percentiles of those histograms get shown is decided
//! here, through a [`ReportConfig`] handed over when the run starts.

use crate::errors::LoadTestError;
use goose::metrics::GooseMetrics;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

pub const DEFAULT_PERCENTILES: &[f64] = &[0.95, 0.99];

const PPM: u64 = 1_000_000;

/// Sorted, de-duplicated fractions in (0, 1], kept as parts per million so
/// ranks are computed without floating point drift.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Percentiles(Vec<u32>);

impl Percentiles {
    pub fn new(values: Vec<f64>) -> Result<Self, LoadTestError> {
        let mut ppms = values
            .iter()
            .map(|p| to_ppm(*p).ok_or_else(|| LoadTestError::Percentile(p.to_string())))
            .collect::<Result<Vec<_>, _>>()?;

        ppms.sort_unstable();
        ppms.dedup();
        Ok(Self(ppms))
    }

    pub fn parts_per_million(&self) -> &[u32] {
        &self.0
    }

    pub fn values(&self) -> Vec<f64> {
        self.0.iter().map(|ppm| *ppm as f64 / PPM as f64).collect()
    }

    pub fn labels(&self) -> Vec<String> {
        self.0.iter().map(|ppm| percentile_label(*ppm)).collect()
    }
}

impl Default for Percentiles {
    fn default() -> Self {
        Self(
            DEFAULT_PERCENTILES
                .iter()
                .filter_map(|p| to_ppm(*p))
                .collect(),
        )
    }
}

impl FromStr for Percentiles {
    type Err = LoadTestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| {
                v.parse::<f64>()
                    .map_err(|_| LoadTestError::Percentile(v.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        if values.is_empty() {
            return Err(LoadTestError::Percentile(s.to_string()));
        }
        Self::new(values)
    }
}

// None for anything outside (0, 1] or finer than one part per million.
fn to_ppm(p: f64) -> Option<u32> {
    if !p.is_finite() || p <= 0.0 || p > 1.0 {
        return None;
    }

    let scaled = p * PPM as f64;
    let ppm = scaled.round();
    if ppm < 1.0 || (scaled - ppm).abs() > 1e-6 {
        return None;
    }
    Some(ppm as u32)
}

fn percentile_label(ppm: u32) -> String {
    format!("p{}", ppm as f64 / 10_000.0)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportConfig {
    pub percentiles: Percentiles,
}

impl ReportConfig {
    pub fn new(percentiles: Percentiles) -> Self {
        Self { percentiles }
    }
}

/// Smallest recorded time whose cumulative count reaches `p` of the total.
/// `p` is rounded to the nearest part per million.
pub fn percentile(times: &BTreeMap<usize, usize>, p: f64) -> usize {
    let ppm = (p.clamp(0.0, 1.0) * PPM as f64).round() as u32;
    percentile_ppm(times, ppm)
}

pub fn percentile_ppm(times: &BTreeMap<usize, usize>, ppm: u32) -> usize {
    let total: usize = times.values().sum();
    if total == 0 {
        return 0;
    }

    // ceil(ppm * total / 1_000_000), in integers.
    let rank = (ppm as u64 * total as u64 + PPM - 1) / PPM;
    let rank = (rank as usize).clamp(1, total);
    let mut seen = 0;
    for (time, count) in times {
        seen += count;
        if seen >= rank {
            return *time;
        }
    }

    times.keys().next_back().copied().unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PercentileRow {
    pub name: String,
    pub requests: usize,
    pub failures: usize,
    pub times: Vec<usize>,
}

impl PercentileRow {
    pub fn new(
        name: impl Into<String>,
        requests: usize,
        failures: usize,
        histogram: &BTreeMap<usize, usize>,
        percentiles: &Percentiles,
    ) -> Self {
        Self {
            name: name.into(),
            requests,
            failures,
            times: percentiles
                .parts_per_million()
                .iter()
                .map(|ppm| percentile_ppm(histogram, *ppm))
                .collect(),
        }
    }

    pub fn failure_rate(&self) -> f64 {
        if self.requests == 0 {
            0.0
        } else {
            self.failures as f64 / self.requests as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PercentileReport {
    labels: Vec<String>,
    rows: Vec<PercentileRow>,
}

impl PercentileReport {
    pub fn new(config: &ReportConfig, mut rows: Vec<PercentileRow>) -> Self {
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Self {
            labels: config.percentiles.labels(),
            rows,
        }
    }

    pub fn from_metrics(metrics: &GooseMetrics, config: &ReportConfig) -> Self {
        let rows = metrics
            .requests
            .iter()
            .map(|(name, aggregate)| {
                PercentileRow::new(
                    name.as_str(),
                    aggregate.success_count + aggregate.fail_count,
                    aggregate.fail_count,
                    &aggregate.raw_data.times,
                    &config.percentiles,
                )
            })
            .collect();

        Self::new(config, rows)
    }

    pub fn rows(&self) -> &[PercentileRow] {
        &self.rows
    }

    pub fn row(&self, name: &str) -> Option<&PercentileRow> {
        self.rows.iter().find(|row| row.name == name)
    }
}

impl Display for PercentileReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name_width = self
            .rows
            .iter()
            .map(|row| row.name.len())
            .chain(std::iter::once("Name".len()))
            .max()
            .unwrap_or_default();

        write!(f, " {:<name_width$} | {:>8} | {:>8}", "Name", "# reqs", "# fails")?;
        for label in &self.labels {
            write!(f, " | {label:>8}")?;
        }
        writeln!(f)?;

        let line_width = name_width + 24 + 11 * self.labels.len();
        writeln!(f, " {}", "-".repeat(line_width))?;

        for row in &self.rows {
            write!(
                f,
                " {:<name_width$} | {:>8} | {:>8}",
                row.name, row.requests, row.failures
            )?;
            for time in &row.times {
                write!(f, " | {time:>8}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
