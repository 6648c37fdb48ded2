//! Hypothesis Engine - proposes and scores explanations for metric movements
//!
//! The engine is a pure transform over its inputs:
//!
//! - **Generator** reads a [`SummaryMap`] and runs each registered rule's
//!   detector, numbering the resulting hypotheses in registration order
//! - **Evaluator** re-derives each hypothesis' metric series from the raw
//!   [`Table`] and asks the matching rule for a confidence and evidence
//! - **Scoring** holds the shared change and confidence functions
//!
//! ## Usage
//!
//! ```rust,ignore
//! use adsight_core::engine::Engine;
//!
//! let engine = Engine::new(config.thresholds.clone())?;
//! let hypotheses = engine.generate(&summary);
//! let evaluations = engine.evaluate(&table, &hypotheses)?;
//! ```

pub mod evaluator;
pub mod generator;
pub mod low_ctr;
pub mod metric_drop;
pub mod rules;
pub mod scoring;
pub mod types;

pub use evaluator::EvidenceEvaluator;
pub use generator::HypothesisGenerator;
pub use low_ctr::LowCtrRule;
pub use metric_drop::MetricDropRule;
pub use rules::{Assessment, Candidate, Rule, RuleRegistry};
pub use types::{
    Evaluation, Hypothesis, HypothesisType, LowCtrEvidence, Scope, TrendEvidence,
};

use crate::config::Thresholds;
use crate::error::Result;
use crate::summary::SummaryMap;
use crate::table::Table;

/// Validated thresholds plus the rule set they apply to
pub struct Engine {
    thresholds: Thresholds,
    registry: RuleRegistry,
}

impl Engine {
    /// Create an engine with the built-in rules; invalid thresholds are fatal
    pub fn new(thresholds: Thresholds) -> Result<Self> {
        Self::with_registry(thresholds, RuleRegistry::new())
    }

    /// Create an engine with a custom rule set
    pub fn with_registry(thresholds: Thresholds, registry: RuleRegistry) -> Result<Self> {
        thresholds.validate()?;
        Ok(Self {
            thresholds,
            registry,
        })
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Propose hypotheses from a summary
    pub fn generate(&self, summary: &SummaryMap) -> Vec<Hypothesis> {
        HypothesisGenerator::new(&self.registry, &self.thresholds).generate(summary)
    }

    /// Score hypotheses against the raw table
    pub fn evaluate(&self, table: &Table, hypotheses: &[Hypothesis]) -> Result<Vec<Evaluation>> {
        EvidenceEvaluator::new(&self.registry, &self.thresholds).evaluate(table, hypotheses)
    }
}
