//! Hypothesis generator

use tracing::debug;

use crate::config::Thresholds;
use crate::summary::SummaryMap;

use super::rules::RuleRegistry;
use super::types::Hypothesis;

/// Proposes hypotheses from a summary using the registered rules
pub struct HypothesisGenerator<'a> {
    registry: &'a RuleRegistry,
    thresholds: &'a Thresholds,
}

impl<'a> HypothesisGenerator<'a> {
    pub fn new(registry: &'a RuleRegistry, thresholds: &'a Thresholds) -> Self {
        Self {
            registry,
            thresholds,
        }
    }

    /// Run every rule in registration order, numbering hypotheses H1, H2, ...
    pub fn generate(&self, summary: &SummaryMap) -> Vec<Hypothesis> {
        let mut hypotheses = Vec::new();

        for rule in self.registry.iter() {
            let candidates = rule.detect(summary, self.thresholds);
            debug!(
                rule = rule.kind().as_str(),
                count = candidates.len(),
                "Rule detection complete"
            );

            for candidate in candidates {
                let id = format!("H{}", hypotheses.len() + 1);
                let mut hypothesis = Hypothesis::new(id, rule.kind(), candidate.statement);
                hypothesis.scope = candidate.scope;
                hypotheses.push(hypothesis);
            }
        }

        hypotheses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::summarize;
    use crate::table::Table;

    fn declining_table() -> Table {
        let mut table = Table::new(["date", "campaign_name", "roas", "ctr"]);
        let rows = [
            ("2024-01-01", "Alpha", "4.0", "0.020"),
            ("2024-01-02", "Alpha", "3.0", "0.015"),
            ("2024-01-03", "Alpha", "2.0", "0.008"),
            ("2024-01-04", "Alpha", "1.0", "0.005"),
        ];
        for (d, c, r, t) in rows {
            table.push_row([d, c, r, t]).unwrap();
        }
        table
    }

    #[test]
    fn test_generate_follows_registration_order() {
        let summary = summarize(&declining_table()).unwrap();
        let thresholds = Thresholds::new(0.15, 0.013).unwrap();
        let registry = RuleRegistry::new();

        let hypotheses = HypothesisGenerator::new(&registry, &thresholds).generate(&summary);
        let kinds: Vec<&str> = hypotheses.iter().map(|h| h.kind.as_str()).collect();
        let ids: Vec<&str> = hypotheses.iter().map(|h| h.id.as_str()).collect();

        // Dataset candidate first, then the campaign candidate, for each rule
        assert_eq!(
            kinds,
            vec!["roas_drop", "roas_drop", "ctr_drop", "ctr_drop", "low_ctr", "low_ctr"]
        );
        assert_eq!(ids, vec!["H1", "H2", "H3", "H4", "H5", "H6"]);
        assert!(hypotheses[0].scope.is_none());
        assert_eq!(
            hypotheses[1].scope.as_ref().map(|s| s.value.as_str()),
            Some("Alpha")
        );
    }

    #[test]
    fn test_generate_is_deterministic() {
        let summary = summarize(&declining_table()).unwrap();
        let thresholds = Thresholds::new(0.15, 0.013).unwrap();
        let registry = RuleRegistry::new();
        let generator = HypothesisGenerator::new(&registry, &thresholds);

        let first = generator.generate(&summary);
        let second = generator.generate(&summary);
        assert_eq!(first, second);
    }

    #[test]
    fn test_generate_empty_summary() {
        let thresholds = Thresholds::new(0.15, 0.01).unwrap();
        let registry = RuleRegistry::new();
        let hypotheses =
            HypothesisGenerator::new(&registry, &thresholds).generate(&SummaryMap::new());
        assert!(hypotheses.is_empty());
    }

    #[test]
    fn test_generate_with_empty_registry() {
        let summary = summarize(&declining_table()).unwrap();
        let thresholds = Thresholds::new(0.15, 0.01).unwrap();
        let registry = RuleRegistry::empty();
        let hypotheses = HypothesisGenerator::new(&registry, &thresholds).generate(&summary);
        assert!(hypotheses.is_empty());
    }
}
