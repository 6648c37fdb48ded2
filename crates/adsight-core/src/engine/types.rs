//! Core types for the hypothesis engine

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Detection rule tag carried by a hypothesis
///
/// Unknown tags are preserved as `Other` so hypotheses produced by newer rule
/// sets survive serialization and are skipped, not rejected, by the evaluator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum HypothesisType {
    /// ROAS declined between the earlier and later halves of the period
    RoasDrop,
    /// CTR declined between the earlier and later halves of the period
    CtrDrop,
    /// CTR sits below the configured floor
    LowCtr,
    /// A tag no registered rule knows about
    Other(String),
}

impl HypothesisType {
    pub fn as_str(&self) -> &str {
        match self {
            HypothesisType::RoasDrop => "roas_drop",
            HypothesisType::CtrDrop => "ctr_drop",
            HypothesisType::LowCtr => "low_ctr",
            HypothesisType::Other(tag) => tag,
        }
    }
}

impl fmt::Display for HypothesisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for HypothesisType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "roas_drop" => HypothesisType::RoasDrop,
            "ctr_drop" => HypothesisType::CtrDrop,
            "low_ctr" => HypothesisType::LowCtr,
            other => HypothesisType::Other(other.to_string()),
        })
    }
}

impl From<String> for HypothesisType {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(kind) => kind,
            Err(never) => match never {},
        }
    }
}

impl From<&str> for HypothesisType {
    fn from(s: &str) -> Self {
        HypothesisType::from(s.to_string())
    }
}

impl From<HypothesisType> for String {
    fn from(kind: HypothesisType) -> Self {
        kind.as_str().to_string()
    }
}

/// Restricts a hypothesis to the rows of one entity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scope {
    /// Column holding the entity name (e.g. "campaign_name")
    pub dimension: String,
    pub value: String,
}

impl Scope {
    pub fn new(dimension: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            dimension: dimension.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.dimension, self.value)
    }
}

/// A candidate explanation for an observed metric movement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hypothesis {
    /// Sequential id within one run ("H1", "H2", ...)
    pub id: String,
    #[serde(rename = "type")]
    pub kind: HypothesisType,
    #[serde(alias = "hypothesis")]
    pub statement: String,
    /// Entity the hypothesis is about; `None` means the whole dataset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
}

impl Hypothesis {
    pub fn new(
        id: impl Into<String>,
        kind: impl Into<HypothesisType>,
        statement: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            statement: statement.into(),
            scope: None,
        }
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }
}

/// Scored, evidence-backed outcome of checking a hypothesis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub hypothesis_id: String,
    /// Statement of the evaluated hypothesis
    pub hypothesis: String,
    #[serde(rename = "type")]
    pub kind: HypothesisType,
    /// Support in the raw data, always within [0.0, 1.0]
    pub confidence: f64,
    /// Human-readable sentence citing the observed values
    pub evidence: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
    /// Rule-specific structured values behind the score
    #[serde(default)]
    pub details: serde_json::Value,
}

/// Values behind a trend-drop score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendEvidence {
    pub metric: String,
    pub before: f64,
    pub after: f64,
    pub change: f64,
    pub threshold: f64,
    pub periods: usize,
    pub segment_len: usize,
}

/// Values behind a low-CTR score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LowCtrEvidence {
    pub floor: f64,
    pub below: usize,
    pub total: usize,
    pub recent_mean: f64,
}
