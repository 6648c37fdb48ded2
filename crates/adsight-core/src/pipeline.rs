//! Analysis pipeline
//!
//! Runs one query end to end: plan, load, summarize, generate hypotheses,
//! evaluate them, recommend creatives. Progress goes to a
//! [`PipelineObserver`]; observers never affect the result.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::creative::CreativeRecommender;
use crate::engine::{Engine, Hypothesis};
use crate::error::Result;
use crate::planner::{PlanStep, Planner};
use crate::report::{save_json, save_markdown, DatasetInfo, RunReport};
use crate::summary::{summarize, SummaryMap};
use crate::table::{DataLoader, Table};

pub const INSIGHTS_FILE: &str = "insights.json";
pub const CREATIVES_FILE: &str = "creatives.json";
pub const REPORT_FILE: &str = "report.md";

/// Pipeline stage, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Plan,
    Load,
    Summarize,
    Hypothesize,
    Evaluate,
    Recommend,
    Report,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Plan => "plan",
            Stage::Load => "load",
            Stage::Summarize => "summarize",
            Stage::Hypothesize => "hypothesize",
            Stage::Evaluate => "evaluate",
            Stage::Recommend => "recommend",
            Stage::Report => "report",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Receives progress events from a run
pub trait PipelineObserver {
    fn run_started(&self, _query: &str) {}

    /// `count` is the number of items the stage produced
    fn stage_completed(&self, _stage: Stage, _count: usize) {}

    fn artifacts_written(&self, _paths: &ArtifactPaths) {}
}

/// Forwards pipeline events to `tracing`
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn run_started(&self, query: &str) {
        tracing::info!(query = %query, "Starting analysis run");
    }

    fn stage_completed(&self, stage: Stage, count: usize) {
        tracing::info!(stage = stage.as_str(), count, "Stage complete");
    }

    fn artifacts_written(&self, paths: &ArtifactPaths) {
        tracing::info!(
            insights = %paths.insights.display(),
            creatives = %paths.creatives.display(),
            report = %paths.report.display(),
            "Run completed"
        );
    }
}

/// Observer that drops every event
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}

/// Output of one run
#[derive(Debug, Clone)]
pub struct RunArtifacts {
    pub report: RunReport,
    pub summary: SummaryMap,
    pub hypotheses: Vec<Hypothesis>,
}

/// Files written for a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactPaths {
    pub insights: PathBuf,
    pub creatives: PathBuf,
    pub report: PathBuf,
}

pub struct Pipeline<'a> {
    config: &'a AppConfig,
    engine: Engine,
    planner: Planner,
    recommender: CreativeRecommender,
    observer: &'a dyn PipelineObserver,
}

impl<'a> Pipeline<'a> {
    /// Build a pipeline; fails if the configured thresholds are invalid
    pub fn new(config: &'a AppConfig, observer: &'a dyn PipelineObserver) -> Result<Self> {
        let engine = Engine::new(config.thresholds.clone())?;
        let recommender = CreativeRecommender::new(&config.thresholds, &config.creative);
        Ok(Self {
            config,
            engine,
            planner: Planner::new(),
            recommender,
            observer,
        })
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Run a query against the configured dataset
    pub fn run(&self, query: &str) -> Result<RunArtifacts> {
        self.observer.run_started(query);
        let plan = self.plan(query);

        let loader = DataLoader::new(&self.config.paths.dataset);
        let table = loader.load()?;
        self.observer.stage_completed(Stage::Load, table.len());

        self.analyze(query, plan, &table, loader.path())
    }

    /// Run a query against an already loaded table
    pub fn run_on_table(&self, query: &str, table: &Table, source: &Path) -> Result<RunArtifacts> {
        self.observer.run_started(query);
        let plan = self.plan(query);
        self.observer.stage_completed(Stage::Load, table.len());
        self.analyze(query, plan, table, source)
    }

    /// Write the run's artifacts to the configured output directory
    pub fn save(&self, report: &RunReport) -> Result<ArtifactPaths> {
        let paths = write_artifacts(report, &self.config.paths.outputs)?;
        self.observer.stage_completed(Stage::Report, 3);
        self.observer.artifacts_written(&paths);
        Ok(paths)
    }

    fn plan(&self, query: &str) -> Vec<PlanStep> {
        let plan = self.planner.plan(query);
        self.observer.stage_completed(Stage::Plan, plan.len());
        plan
    }

    fn analyze(
        &self,
        query: &str,
        plan: Vec<PlanStep>,
        table: &Table,
        source: &Path,
    ) -> Result<RunArtifacts> {
        let summary = summarize(table)?;
        self.observer.stage_completed(Stage::Summarize, summary.len());

        let hypotheses = self.engine.generate(&summary);
        self.observer.stage_completed(Stage::Hypothesize, hypotheses.len());

        let evaluations = self.engine.evaluate(table, &hypotheses)?;
        self.observer.stage_completed(Stage::Evaluate, evaluations.len());

        let mut rng = StdRng::seed_from_u64(self.config.random_seed);
        let creatives = self.recommender.generate(table, &mut rng)?;
        self.observer.stage_completed(Stage::Recommend, creatives.len());

        let report = RunReport {
            query: query.to_string(),
            generated_at: Utc::now(),
            dataset: DatasetInfo {
                path: source.to_path_buf(),
                rows: table.len(),
                digest: table.digest().map(str::to_string),
            },
            plan,
            evaluations,
            creatives,
        };

        Ok(RunArtifacts {
            report,
            summary,
            hypotheses,
        })
    }
}

/// Write insights.json, creatives.json and report.md into `dir`
pub fn write_artifacts(report: &RunReport, dir: &Path) -> Result<ArtifactPaths> {
    let paths = ArtifactPaths {
        insights: dir.join(INSIGHTS_FILE),
        creatives: dir.join(CREATIVES_FILE),
        report: dir.join(REPORT_FILE),
    };

    save_json(&report.evaluations, &paths.insights)?;
    save_json(&report.creatives, &paths.creatives)?;
    save_markdown(&report.render_markdown(), &paths.report)?;

    Ok(paths)
}
