//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `analyze` - Full analysis run (plan, hypotheses, evaluations, creatives, report)
//! - `summarize` - Metric summary of a dataset
//! - `config` - Resolved configuration display

pub mod analyze;
pub mod config;
pub mod summarize;

use std::path::{Path, PathBuf};

use adsight_core::AppConfig;
use anyhow::{Context, Result};

// Re-export command functions for main.rs
pub use analyze::*;
pub use config::*;
pub use summarize::*;

/// Resolve the run configuration (explicit path, user override, built-in)
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    AppConfig::load(path).context("Failed to load configuration")
}

/// Apply command-line overrides on top of the loaded configuration
pub fn apply_overrides(
    config: &mut AppConfig,
    dataset: Option<PathBuf>,
    output: Option<PathBuf>,
    seed: Option<u64>,
) {
    if let Some(dataset) = dataset {
        config.paths.dataset = dataset;
    }
    if let Some(output) = output {
        config.paths.outputs = output;
    }
    if let Some(seed) = seed {
        config.random_seed = seed;
    }
}

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
