//! Rule registry: each hypothesis type pairs a detector with an evaluator

use crate::config::Thresholds;
use crate::error::Result;
use crate::summary::SummaryMap;
use crate::table::Table;

use super::low_ctr::LowCtrRule;
use super::metric_drop::MetricDropRule;
use super::types::{Hypothesis, HypothesisType, Scope};

/// A triggered detection, before an id is assigned
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub statement: String,
    pub scope: Option<Scope>,
}

impl Candidate {
    pub fn new(statement: impl Into<String>, scope: Option<Scope>) -> Self {
        Self {
            statement: statement.into(),
            scope,
        }
    }
}

/// Score and evidence produced by a rule for one hypothesis
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub confidence: f64,
    pub evidence: String,
    pub details: serde_json::Value,
}

/// A hypothesis type: how to propose it and how to score it
pub trait Rule: Send + Sync {
    /// Tag this rule detects and evaluates
    fn kind(&self) -> HypothesisType;

    /// Human-readable name
    fn name(&self) -> &'static str;

    /// Propose candidates from the summary; missing keys mean "not triggered"
    fn detect(&self, summary: &SummaryMap, thresholds: &Thresholds) -> Vec<Candidate>;

    /// Score a hypothesis against the raw table
    ///
    /// `Ok(None)` means the data needed is absent or too short to score.
    fn evaluate(
        &self,
        table: &Table,
        hypothesis: &Hypothesis,
        thresholds: &Thresholds,
    ) -> Result<Option<Assessment>>;
}

/// Ordered set of rules; registration order fixes hypothesis id order
pub struct RuleRegistry {
    rules: Vec<Box<dyn Rule>>,
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleRegistry {
    /// Create a registry with the built-in rules
    pub fn new() -> Self {
        let mut registry = Self::empty();

        registry.register(Box::new(MetricDropRule::roas()));
        registry.register(Box::new(MetricDropRule::ctr()));
        registry.register(Box::new(LowCtrRule::new()));

        registry
    }

    /// Create a registry with no rules
    pub fn empty() -> Self {
        Self { rules: vec![] }
    }

    /// Register a rule, replacing any rule already registered for its tag
    pub fn register(&mut self, rule: Box<dyn Rule>) {
        let kind = rule.kind();
        if let Some(slot) = self.rules.iter_mut().find(|r| r.kind() == kind) {
            tracing::debug!(rule = kind.as_str(), "Replacing registered rule");
            *slot = rule;
        } else {
            self.rules.push(rule);
        }
    }

    /// Rule registered for a tag
    pub fn get(&self, kind: &HypothesisType) -> Option<&dyn Rule> {
        self.rules
            .iter()
            .find(|r| r.kind() == *kind)
            .map(|r| r.as_ref())
    }

    /// Rules in registration order
    pub fn iter(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules.iter().map(|r| r.as_ref())
    }

    /// Registered tags in registration order
    pub fn kinds(&self) -> Vec<HypothesisType> {
        self.rules.iter().map(|r| r.kind()).collect()
    }
}
