//! Metric drop rules (ROAS, CTR)
//!
//! Detects a decline between the earlier and later halves of the observed
//! period, for the whole dataset and for each campaign. Scoring re-derives the
//! per-period series from the raw table and maps the size of the decline to a
//! confidence relative to the configured drop threshold.

use crate::config::Thresholds;
use crate::error::Result;
use crate::series::MetricSeries;
use crate::summary::SummaryMap;
use crate::table::{columns, Table};

use super::rules::{Assessment, Candidate, Rule};
use super::scoring::magnitude_to_confidence;
use super::types::{Hypothesis, HypothesisType, Scope, TrendEvidence};

/// Rule for a decline in one metric column
pub struct MetricDropRule {
    kind: HypothesisType,
    name: &'static str,
    /// Column holding the metric
    metric: &'static str,
    /// Display label used in statements and evidence
    label: &'static str,
    /// Decimal places when printing metric values
    precision: usize,
    threshold: fn(&Thresholds) -> f64,
}

impl MetricDropRule {
    /// ROAS decline beyond `roas_drop_pct`
    pub fn roas() -> Self {
        Self {
            kind: HypothesisType::RoasDrop,
            name: "ROAS Drop",
            metric: columns::ROAS,
            label: "ROAS",
            precision: 2,
            threshold: |t| t.roas_drop_pct,
        }
    }

    /// CTR decline beyond `ctr_drop_pct`
    pub fn ctr() -> Self {
        Self {
            kind: HypothesisType::CtrDrop,
            name: "CTR Drop",
            metric: columns::CTR,
            label: "CTR",
            precision: 4,
            threshold: Thresholds::ctr_drop_pct,
        }
    }

    fn subject(&self, scope: Option<&Scope>) -> String {
        match scope {
            Some(scope) => format!("{} for {} '{}'", self.label, scope.dimension, scope.value),
            None => self.label.to_string(),
        }
    }
}

impl Rule for MetricDropRule {
    fn kind(&self) -> HypothesisType {
        self.kind.clone()
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn detect(&self, summary: &SummaryMap, thresholds: &Thresholds) -> Vec<Candidate> {
        let threshold = (self.threshold)(thresholds);
        let p = self.precision;

        let dataset = summary
            .metric(self.metric)
            .map(|stats| (None, stats))
            .into_iter();
        let entities = summary
            .entities(columns::CAMPAIGN, self.metric)
            .map(|(scope, stats)| (Some(scope), stats));

        dataset
            .chain(entities)
            .filter_map(|(scope, stats)| {
                let (Some(before), Some(after), Some(change)) =
                    (stats.before, stats.after, stats.change)
                else {
                    return None;
                };
                if change > -threshold {
                    return None;
                }
                let statement = format!(
                    "{} declined {:.1}% from {:.p$} to {:.p$} between the earlier and later halves of the period.",
                    self.subject(scope.as_ref()),
                    change.abs() * 100.0,
                    before,
                    after,
                );
                Some(Candidate::new(statement, scope))
            })
            .collect()
    }

    fn evaluate(
        &self,
        table: &Table,
        hypothesis: &Hypothesis,
        thresholds: &Thresholds,
    ) -> Result<Option<Assessment>> {
        let scope = hypothesis.scope.as_ref();
        let Some(series) = MetricSeries::extract(table, self.metric, scope)? else {
            return Ok(None);
        };
        let Some(split) = series.split() else {
            return Ok(None);
        };

        let threshold = (self.threshold)(thresholds);
        let confidence = magnitude_to_confidence(-split.change, threshold);
        let p = self.precision;

        let evidence = format!(
            "{} moved from {:.p$} (mean of first {k} periods) to {:.p$} (mean of last {k} periods), \
             a {:+.1}% change against a {:.1}% drop threshold; first period {:.p$}, last period {:.p$}.",
            self.subject(scope),
            split.before,
            split.after,
            split.change * 100.0,
            threshold * 100.0,
            split.first,
            split.last,
            k = split.segment_len,
        );

        let details = TrendEvidence {
            metric: self.metric.to_string(),
            before: split.before,
            after: split.after,
            change: split.change,
            threshold,
            periods: split.periods,
            segment_len: split.segment_len,
        };

        Ok(Some(Assessment {
            confidence,
            evidence,
            details: serde_json::to_value(&details).unwrap_or_default(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::summarize;

    fn roas_table(values: &[f64]) -> Table {
        let mut table = Table::new(["date", "roas"]);
        for (i, v) in values.iter().enumerate() {
            table
                .push_row([format!("2024-01-{:02}", i + 1), v.to_string()])
                .unwrap();
        }
        table
    }

    fn thresholds() -> Thresholds {
        Thresholds::new(0.15, 0.007).unwrap()
    }

    #[test]
    fn test_detect_dataset_drop() {
        let table = roas_table(&[4.0, 3.8, 3.5, 3.0, 2.5, 2.0]);
        let summary = summarize(&table).unwrap();

        let candidates = MetricDropRule::roas().detect(&summary, &thresholds());
        assert_eq!(candidates.len(), 1);
        assert!(candidates[0].scope.is_none());
        assert!(candidates[0].statement.starts_with("ROAS declined 33.6%"));
    }

    #[test]
    fn test_detect_ignores_small_drop() {
        let table = roas_table(&[2.0, 2.0, 1.9, 1.9]);
        let summary = summarize(&table).unwrap();
        assert!(MetricDropRule::roas()
            .detect(&summary, &thresholds())
            .is_empty());
    }

    #[test]
    fn test_detect_missing_key() {
        let summary = SummaryMap::new();
        assert!(MetricDropRule::ctr().detect(&summary, &thresholds()).is_empty());
    }

    #[test]
    fn test_evaluate_evidence_cites_values() {
        let table = roas_table(&[4.0, 3.8, 3.5, 3.0, 2.5, 2.0]);
        let h = Hypothesis::new("H1", HypothesisType::RoasDrop, "ROAS dropped over time.");

        let assessment = MetricDropRule::roas()
            .evaluate(&table, &h, &thresholds())
            .unwrap()
            .unwrap();

        assert_eq!(assessment.confidence, 1.0);
        assert!(assessment.evidence.contains("ROAS moved from 3.77"));
        assert!(assessment.evidence.contains("to 2.50"));
        assert!(assessment.evidence.contains("-33.6%"));
        assert!(assessment.evidence.contains("first period 4.00, last period 2.00"));
        assert_eq!(assessment.details["periods"], 6);
    }

    #[test]
    fn test_evaluate_rising_series_scores_zero() {
        let table = roas_table(&[1.0, 1.5, 2.0, 2.5]);
        let h = Hypothesis::new("H1", HypothesisType::RoasDrop, "ROAS dropped.");
        let assessment = MetricDropRule::roas()
            .evaluate(&table, &h, &thresholds())
            .unwrap()
            .unwrap();
        assert_eq!(assessment.confidence, 0.0);
        assert!(assessment.evidence.contains("+"));
    }

    #[test]
    fn test_ctr_uses_own_threshold() {
        let thresholds = Thresholds::new(0.5, 0.007)
            .unwrap()
            .with_ctr_drop_pct(0.1)
            .unwrap();
        let mut table = Table::new(["date", "ctr"]);
        for (d, v) in [("2024-01-01", "0.020"), ("2024-01-02", "0.015")] {
            table.push_row([d, v]).unwrap();
        }
        let h = Hypothesis::new("H1", HypothesisType::CtrDrop, "CTR dropped.");
        let assessment = MetricDropRule::ctr()
            .evaluate(&table, &h, &thresholds)
            .unwrap()
            .unwrap();
        // 25% drop against a 10% threshold saturates
        assert_eq!(assessment.confidence, 1.0);
        assert!(assessment.evidence.contains("0.0200"));
        assert!(assessment.evidence.contains("10.0% drop threshold"));
    }
}
