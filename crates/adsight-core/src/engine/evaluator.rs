//! Evidence evaluator

use tracing::debug;

use crate::config::Thresholds;
use crate::error::Result;
use crate::table::Table;

use super::rules::RuleRegistry;
use super::scoring::clamp_confidence;
use super::types::{Evaluation, Hypothesis};

/// Scores hypotheses against the raw table
pub struct EvidenceEvaluator<'a> {
    registry: &'a RuleRegistry,
    thresholds: &'a Thresholds,
}

impl<'a> EvidenceEvaluator<'a> {
    pub fn new(registry: &'a RuleRegistry, thresholds: &'a Thresholds) -> Self {
        Self {
            registry,
            thresholds,
        }
    }

    /// Evaluate each hypothesis with the rule registered for its type
    ///
    /// Hypotheses with an unknown type, or whose data is absent or too short,
    /// produce no evaluation. Malformed cell values are returned as errors.
    pub fn evaluate(&self, table: &Table, hypotheses: &[Hypothesis]) -> Result<Vec<Evaluation>> {
        let mut evaluations = Vec::with_capacity(hypotheses.len());

        for hypothesis in hypotheses {
            let Some(rule) = self.registry.get(&hypothesis.kind) else {
                debug!(
                    hypothesis = %hypothesis.id,
                    kind = hypothesis.kind.as_str(),
                    "No rule registered for hypothesis type, skipping"
                );
                continue;
            };

            let Some(assessment) = rule.evaluate(table, hypothesis, self.thresholds)? else {
                debug!(
                    hypothesis = %hypothesis.id,
                    kind = hypothesis.kind.as_str(),
                    "Insufficient data to evaluate hypothesis, skipping"
                );
                continue;
            };

            evaluations.push(Evaluation {
                hypothesis_id: hypothesis.id.clone(),
                hypothesis: hypothesis.statement.clone(),
                kind: hypothesis.kind.clone(),
                confidence: clamp_confidence(assessment.confidence),
                evidence: assessment.evidence,
                scope: hypothesis.scope.clone(),
                details: assessment.details,
            });
        }

        Ok(evaluations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{HypothesisType, Scope};

    fn thresholds() -> Thresholds {
        Thresholds::new(0.15, 0.007).unwrap()
    }

    fn series_table(roas: &[&str]) -> Table {
        let mut table = Table::new(["date", "roas", "ctr", "creative_type"]);
        let ctr = ["0.01", "0.011", "0.009", "0.008", "0.007", "0.006"];
        for (i, value) in roas.iter().enumerate() {
            table
                .push_row([
                    format!("2024-01-{:02}", i + 1),
                    value.to_string(),
                    ctr[i % ctr.len()].to_string(),
                    "image".to_string(),
                ])
                .unwrap();
        }
        table
    }

    fn roas_hypothesis() -> Hypothesis {
        Hypothesis::new("H1", HypothesisType::RoasDrop, "ROAS dropped over time.")
    }

    fn evaluate(table: &Table, hypotheses: &[Hypothesis]) -> Vec<Evaluation> {
        let registry = RuleRegistry::new();
        let thresholds = thresholds();
        EvidenceEvaluator::new(&registry, &thresholds)
            .evaluate(table, hypotheses)
            .unwrap()
    }

    #[test]
    fn test_roas_drop_basic() {
        let table = series_table(&["4.0", "3.8", "3.5", "3.0", "2.5", "2.0"]);
        let evaluations = evaluate(&table, &[roas_hypothesis()]);

        assert_eq!(evaluations.len(), 1);
        let ev = &evaluations[0];
        assert_eq!(ev.hypothesis_id, "H1");
        assert_eq!(ev.hypothesis, "ROAS dropped over time.");
        assert_eq!(ev.kind, HypothesisType::RoasDrop);
        assert!((0.0..=1.0).contains(&ev.confidence));
        assert!(ev.confidence >= 0.8);
        assert!(ev.evidence.to_lowercase().contains("roas"));
    }

    #[test]
    fn test_flat_series_scores_zero() {
        let table = series_table(&["2.0", "2.0", "2.0"]);
        let evaluations = evaluate(&table, &[roas_hypothesis()]);

        assert_eq!(evaluations.len(), 1);
        assert_eq!(evaluations[0].confidence, 0.0);
    }

    #[test]
    fn test_single_point_is_skipped() {
        let table = series_table(&["2.0"]);
        let hypotheses = [
            roas_hypothesis(),
            Hypothesis::new("H2", HypothesisType::CtrDrop, "CTR dropped."),
            Hypothesis::new("H3", HypothesisType::LowCtr, "CTR is low."),
        ];
        assert!(evaluate(&table, &hypotheses).is_empty());
    }

    #[test]
    fn test_missing_column_is_skipped() {
        let mut table = Table::new(["date", "ctr"]);
        table.push_row(["2024-01-01", "0.01"]).unwrap();
        table.push_row(["2024-01-02", "0.02"]).unwrap();

        let evaluations = evaluate(&table, &[roas_hypothesis()]);
        assert!(evaluations.is_empty());
    }

    #[test]
    fn test_unknown_type_is_skipped() {
        let table = series_table(&["4.0", "3.0"]);
        let hypotheses = [
            Hypothesis::new("H1", "audience_saturation", "Audience is saturated."),
            Hypothesis::new("H2", HypothesisType::RoasDrop, "ROAS dropped."),
        ];
        let evaluations = evaluate(&table, &hypotheses);
        assert_eq!(evaluations.len(), 1);
        assert_eq!(evaluations[0].hypothesis_id, "H2");
    }

    #[test]
    fn test_unknown_scope_value_scores_nothing() {
        let mut table = Table::new(["date", "campaign_name", "roas"]);
        table.push_row(["2024-01-01", "Alpha", "4.0"]).unwrap();
        table.push_row(["2024-01-02", "Alpha", "2.0"]).unwrap();

        let h = roas_hypothesis().with_scope(Scope::new("campaign_name", "Gamma"));
        assert!(evaluate(&table, &[h]).is_empty());
    }

    #[test]
    fn test_larger_decline_not_less_confident() {
        let mild = series_table(&["2.0", "2.0", "1.9", "1.8"]);
        let steep = series_table(&["2.0", "2.0", "1.2", "1.0"]);

        let mild_conf = evaluate(&mild, &[roas_hypothesis()])[0].confidence;
        let steep_conf = evaluate(&steep, &[roas_hypothesis()])[0].confidence;
        assert!(steep_conf >= mild_conf);
        assert!(mild_conf > 0.0);
    }

    #[test]
    fn test_malformed_cell_propagates() {
        let table = series_table(&["4.0", "lots"]);
        let registry = RuleRegistry::new();
        let thresholds = thresholds();
        let result = EvidenceEvaluator::new(&registry, &thresholds)
            .evaluate(&table, &[roas_hypothesis()]);
        assert!(result.is_err());
    }
}
