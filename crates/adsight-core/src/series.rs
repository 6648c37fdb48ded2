//! Per-period metric series and the earlier/later trend split

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::engine::scoring::percent_change;
use crate::engine::Scope;
use crate::error::Result;
use crate::table::{columns, Table};

/// One period (date) of a metric series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodValue {
    pub period: NaiveDate,
    /// Mean of the row values recorded for this period
    pub value: f64,
    /// Row values in original row order
    pub samples: Vec<f64>,
}

/// Chronological metric series, one point per period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSeries {
    pub metric: String,
    pub points: Vec<PeriodValue>,
}

/// Earlier vs later segment comparison of a series
///
/// With `n` periods each segment holds `n / 2` periods; the middle period of
/// an odd-length series belongs to neither.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendSplit {
    /// Mean of the earlier segment
    pub before: f64,
    /// Mean of the later segment
    pub after: f64,
    /// Relative change from `before` to `after` (negative = decline)
    pub change: f64,
    /// Periods in each segment
    pub segment_len: usize,
    /// Total periods in the series
    pub periods: usize,
    /// First and last period values
    pub first: f64,
    pub last: f64,
}

impl MetricSeries {
    /// Build the series for `metric`, optionally restricted to one scope
    ///
    /// Returns `Ok(None)` when the table lacks the date column, the metric
    /// column, or the scope's dimension column. Rows with an empty date or
    /// metric cell are ignored.
    pub fn extract(table: &Table, metric: &str, scope: Option<&Scope>) -> Result<Option<Self>> {
        let (Some(date_col), Some(metric_col)) =
            (table.column(columns::DATE), table.column(metric))
        else {
            return Ok(None);
        };

        let rows: Vec<usize> = match scope {
            Some(scope) => match table.rows_where(&scope.dimension, &scope.value) {
                Some(rows) => rows,
                None => return Ok(None),
            },
            None => (0..table.len()).collect(),
        };

        // BTreeMap keeps periods chronological; pushing in row order keeps ties stable
        let mut periods: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
        for row in rows {
            let (Some(date), Some(value)) = (table.date(row, date_col)?, table.number(row, metric_col)?)
            else {
                continue;
            };
            periods.entry(date).or_default().push(value);
        }

        let points = periods
            .into_iter()
            .map(|(period, samples)| PeriodValue {
                period,
                value: mean(&samples).unwrap_or(0.0),
                samples,
            })
            .collect();

        Ok(Some(Self {
            metric: metric.to_string(),
            points,
        }))
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Per-period values in chronological order
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// Earlier/later segments; `None` with fewer than two periods
    pub fn split(&self) -> Option<TrendSplit> {
        let n = self.points.len();
        if n < 2 {
            return None;
        }
        let k = n / 2;
        let values = self.values();
        let before = mean(&values[..k])?;
        let after = mean(&values[n - k..])?;

        Some(TrendSplit {
            before,
            after,
            change: percent_change(before, after),
            segment_len: k,
            periods: n,
            first: values[0],
            last: values[n - 1],
        })
    }

    /// Row samples of the later segment (the last `n / 2` periods)
    pub fn later_samples(&self) -> Option<Vec<f64>> {
        let split = self.split()?;
        Some(
            self.points[split.periods - split.segment_len..]
                .iter()
                .flat_map(|p| p.samples.iter().copied())
                .collect(),
        )
    }
}

pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
