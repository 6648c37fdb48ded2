//! Adsight Core Library
//!
//! Shared functionality for the adsight ad performance analyst:
//! - CSV dataset loading and per-campaign metric summaries
//! - Hypothesis engine (rule registry, generator, evidence evaluator)
//! - Shared scoring policy for change and confidence
//! - Query planner and low-CTR creative recommender
//! - Markdown/JSON run reports and the end-to-end pipeline
//! - Layered YAML configuration

pub mod config;
pub mod creative;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod planner;
pub mod report;
pub mod series;
pub mod summary;
pub mod table;

pub use config::{AppConfig, CreativeSettings, Paths, Thresholds};
pub use creative::{CreativeRecommendation, CreativeRecommender};
pub use engine::{
    Engine, Evaluation, EvidenceEvaluator, Hypothesis, HypothesisGenerator, HypothesisType, Rule,
    RuleRegistry, Scope,
};
pub use error::{Error, Result};
pub use pipeline::{
    write_artifacts, ArtifactPaths, NoopObserver, Pipeline, PipelineObserver, RunArtifacts, Stage,
    TracingObserver,
};
pub use planner::{PlanStep, Planner};
pub use report::{DatasetInfo, RunReport};
pub use series::{MetricSeries, TrendSplit};
pub use summary::{summarize, MetricSummary, SummaryMap, Trend};
pub use table::{DataLoader, Table};
