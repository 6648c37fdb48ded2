//! Low CTR rule
//!
//! Proposes a hypothesis when average CTR sits below the configured floor and
//! scores it by the share of recent rows (the later half of the period) that
//! fall below that floor.

use crate::config::Thresholds;
use crate::error::Result;
use crate::series::{mean, MetricSeries};
use crate::summary::SummaryMap;
use crate::table::{columns, Table};

use super::rules::{Assessment, Candidate, Rule};
use super::scoring::clamp_confidence;
use super::types::{Hypothesis, HypothesisType, LowCtrEvidence};

/// Rule for CTR below the `low_ctr` floor
pub struct LowCtrRule;

impl LowCtrRule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LowCtrRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for LowCtrRule {
    fn kind(&self) -> HypothesisType {
        HypothesisType::LowCtr
    }

    fn name(&self) -> &'static str {
        "Low CTR"
    }

    fn detect(&self, summary: &SummaryMap, thresholds: &Thresholds) -> Vec<Candidate> {
        let floor = thresholds.low_ctr;
        let mut candidates = Vec::new();

        if let Some(stats) = summary.metric(columns::CTR) {
            if stats.mean < floor {
                candidates.push(Candidate::new(
                    format!(
                        "Average CTR of {:.4} is below the {:.4} floor, pointing to weak or fatigued creatives.",
                        stats.mean, floor
                    ),
                    None,
                ));
            }
        }

        for (scope, stats) in summary.entities(columns::CAMPAIGN, columns::CTR) {
            if stats.mean < floor {
                let statement = format!(
                    "CTR for {} '{}' averages {:.4}, below the {:.4} floor; its creatives may be underperforming.",
                    scope.dimension, scope.value, stats.mean, floor
                );
                candidates.push(Candidate::new(statement, Some(scope)));
            }
        }

        candidates
    }

    fn evaluate(
        &self,
        table: &Table,
        hypothesis: &Hypothesis,
        thresholds: &Thresholds,
    ) -> Result<Option<Assessment>> {
        let scope = hypothesis.scope.as_ref();
        let Some(series) = MetricSeries::extract(table, columns::CTR, scope)? else {
            return Ok(None);
        };
        let Some(recent) = series.later_samples() else {
            return Ok(None);
        };
        let Some(recent_mean) = mean(&recent) else {
            return Ok(None);
        };

        let floor = thresholds.low_ctr;
        let below = recent.iter().filter(|&&v| v < floor).count();
        let total = recent.len();
        let confidence = clamp_confidence(below as f64 / total as f64);

        let subject = match scope {
            Some(scope) => format!("For {} '{}', ", scope.dimension, scope.value),
            None => String::new(),
        };
        let evidence = format!(
            "{}{} of {} recent rows ({:.0}%) had CTR below the {:.4} floor; recent mean CTR {:.4}.",
            subject,
            below,
            total,
            confidence * 100.0,
            floor,
            recent_mean
        );

        let details = LowCtrEvidence {
            floor,
            below,
            total,
            recent_mean,
        };

        Ok(Some(Assessment {
            confidence,
            evidence,
            details: serde_json::to_value(&details).unwrap_or_default(),
        }))
    }
}
