//! Summary builder: aggregate statistics the detection rules read by key
//!
//! Keys are `"<metric>"` for whole-dataset aggregates and
//! `"<dimension>=<value>/<metric>"` for per-entity aggregates, e.g.
//! `"campaign_name=Summer Sale/roas"`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::Scope;
use crate::error::Result;
use crate::series::{mean, MetricSeries};
use crate::table::{columns, Table};

/// Metrics summarized over the whole dataset
pub const DATASET_METRICS: &[&str] = &[
    columns::ROAS,
    columns::CTR,
    columns::SPEND,
    columns::REVENUE,
    columns::IMPRESSIONS,
    columns::CLICKS,
];

/// Metrics summarized per campaign
pub const ENTITY_METRICS: &[&str] = &[columns::ROAS, columns::CTR];

/// Relative changes smaller than this are reported as flat
const FLAT_TOLERANCE: f64 = 0.02;

/// Direction of a metric between the earlier and later halves of the period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Up,
    Down,
    Flat,
}

impl Trend {
    pub fn from_change(change: f64) -> Self {
        if change > FLAT_TOLERANCE {
            Trend::Up
        } else if change < -FLAT_TOLERANCE {
            Trend::Down
        } else {
            Trend::Flat
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Up => "up",
            Trend::Down => "down",
            Trend::Flat => "flat",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Aggregate statistics for one metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    /// Rows with a value for this metric
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    /// Dated periods contributing to the trend
    pub periods: usize,
    /// Earlier-segment mean (needs at least two periods)
    pub before: Option<f64>,
    /// Later-segment mean (needs at least two periods)
    pub after: Option<f64>,
    /// Relative change from `before` to `after`
    pub change: Option<f64>,
    pub trend: Option<Trend>,
}

/// Aggregates keyed by metric or entity/metric name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SummaryMap {
    entries: BTreeMap<String, MetricSummary>,
}

impl SummaryMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key for a whole-dataset metric
    pub fn metric_key(metric: &str) -> String {
        metric.to_string()
    }

    /// Key for a per-entity metric
    pub fn entity_key(dimension: &str, value: &str, metric: &str) -> String {
        format!("{}={}/{}", dimension, value, metric)
    }

    /// Key for a metric within an optional scope
    pub fn scoped_key(scope: Option<&Scope>, metric: &str) -> String {
        match scope {
            Some(scope) => Self::entity_key(&scope.dimension, &scope.value, metric),
            None => Self::metric_key(metric),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, summary: MetricSummary) {
        self.entries.insert(key.into(), summary);
    }

    pub fn get(&self, key: &str) -> Option<&MetricSummary> {
        self.entries.get(key)
    }

    /// Whole-dataset summary for a metric
    pub fn metric(&self, metric: &str) -> Option<&MetricSummary> {
        self.get(metric)
    }

    /// Per-entity summaries of `metric` for one dimension, in ascending value order
    pub fn entities<'a>(
        &'a self,
        dimension: &'a str,
        metric: &'a str,
    ) -> impl Iterator<Item = (Scope, &'a MetricSummary)> + 'a {
        let prefix = format!("{}=", dimension);
        let suffix = format!("/{}", metric);
        self.entries.iter().filter_map(move |(key, summary)| {
            let value = key.strip_prefix(&prefix)?.strip_suffix(&suffix)?;
            Some((Scope::new(dimension, value), summary))
        })
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetricSummary)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Summarize a table into per-metric and per-campaign aggregates
pub fn summarize(table: &Table) -> Result<SummaryMap> {
    let mut summary = SummaryMap::new();

    for metric in DATASET_METRICS {
        if let Some(stats) = summarize_metric(table, metric, None)? {
            summary.insert(SummaryMap::metric_key(metric), stats);
        }
    }

    for campaign in table.distinct(columns::CAMPAIGN) {
        let scope = Scope::new(columns::CAMPAIGN, campaign);
        for metric in ENTITY_METRICS {
            if let Some(stats) = summarize_metric(table, metric, Some(&scope))? {
                summary.insert(SummaryMap::scoped_key(Some(&scope), metric), stats);
            }
        }
    }

    debug!(entries = summary.len(), "Summary computed");
    Ok(summary)
}

fn summarize_metric(
    table: &Table,
    metric: &str,
    scope: Option<&Scope>,
) -> Result<Option<MetricSummary>> {
    let Some(col) = table.column(metric) else {
        return Ok(None);
    };

    let rows: Vec<usize> = match scope {
        Some(scope) => match table.rows_where(&scope.dimension, &scope.value) {
            Some(rows) => rows,
            None => return Ok(None),
        },
        None => (0..table.len()).collect(),
    };

    let mut values = Vec::with_capacity(rows.len());
    for row in rows {
        if let Some(v) = table.number(row, col)? {
            values.push(v);
        }
    }
    let Some(mean) = mean(&values) else {
        return Ok(None);
    };
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let series = MetricSeries::extract(table, metric, scope)?;
    let split = series.as_ref().and_then(MetricSeries::split);

    Ok(Some(MetricSummary {
        count: values.len(),
        mean,
        min,
        max,
        periods: series.as_ref().map_or(0, MetricSeries::len),
        before: split.map(|s| s.before),
        after: split.map(|s| s.after),
        change: split.map(|s| s.change),
        trend: split.map(|s| Trend::from_change(s.change)),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        let mut table = Table::new(["date", "campaign_name", "roas", "ctr"]);
        let rows = [
            ("2024-01-01", "Alpha", "4.0", "0.020"),
            ("2024-01-01", "Beta", "2.0", "0.010"),
            ("2024-01-02", "Alpha", "3.0", "0.018"),
            ("2024-01-02", "Beta", "2.0", "0.011"),
            ("2024-01-03", "Alpha", "2.0", "0.015"),
            ("2024-01-03", "Beta", "2.0", "0.010"),
            ("2024-01-04", "Alpha", "1.0", "0.012"),
            ("2024-01-04", "Beta", "2.0", "0.009"),
        ];
        for (d, c, r, t) in rows {
            table.push_row([d, c, r, t]).unwrap();
        }
        table
    }

    #[test]
    fn test_summarize_dataset_metrics() {
        let summary = summarize(&table()).unwrap();
        let roas = summary.metric("roas").unwrap();

        assert_eq!(roas.count, 8);
        assert_eq!(roas.periods, 4);
        assert_eq!(roas.min, 1.0);
        assert_eq!(roas.max, 4.0);
        assert_eq!(roas.trend, Some(Trend::Down));
        // Absent columns produce no entry
        assert!(summary.metric("spend").is_none());
    }

    #[test]
    fn test_summarize_entities() {
        let summary = summarize(&table()).unwrap();

        let alpha = summary.get("campaign_name=Alpha/roas").unwrap();
        assert_eq!(alpha.before, Some(3.5));
        assert_eq!(alpha.after, Some(1.5));
        assert_eq!(alpha.trend, Some(Trend::Down));

        let beta = summary.get("campaign_name=Beta/roas").unwrap();
        assert_eq!(beta.trend, Some(Trend::Flat));

        let scopes: Vec<String> = summary
            .entities("campaign_name", "roas")
            .map(|(scope, _)| scope.value)
            .collect();
        assert_eq!(scopes, vec!["Alpha", "Beta"]);
    }

    #[test]
    fn test_summarize_without_dates_has_no_trend() {
        let mut table = Table::new(["roas"]);
        table.push_row(["2.0"]).unwrap();
        table.push_row(["3.0"]).unwrap();

        let summary = summarize(&table).unwrap();
        let roas = summary.metric("roas").unwrap();
        assert_eq!(roas.mean, 2.5);
        assert_eq!(roas.periods, 0);
        assert!(roas.change.is_none());
        assert!(roas.trend.is_none());
    }

    #[test]
    fn test_trend_from_change() {
        assert_eq!(Trend::from_change(0.1), Trend::Up);
        assert_eq!(Trend::from_change(-0.1), Trend::Down);
        assert_eq!(Trend::from_change(0.01), Trend::Flat);
    }
}
