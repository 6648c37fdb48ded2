//! Run configuration
//!
//! Config is loaded with a layered resolution:
//! 1. An explicit path (e.g. `--config`), which must exist
//! 2. The user override (~/.config/adsight/config.yaml)
//! 3. The embedded default (compiled into binary)
//!
//! Thresholds are validated once at load time and are read-only afterwards.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/config.yaml");

/// Detection and scoring thresholds shared by every rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Minimum fractional ROAS decline considered significant (0.15 = 15%)
    pub roas_drop_pct: f64,
    /// CTR below this value marks a row as low-CTR
    pub low_ctr: f64,
    /// Minimum fractional CTR decline; falls back to `roas_drop_pct`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ctr_drop_pct: Option<f64>,
}

impl Thresholds {
    /// Create validated thresholds
    pub fn new(roas_drop_pct: f64, low_ctr: f64) -> Result<Self> {
        let thresholds = Self {
            roas_drop_pct,
            low_ctr,
            ctr_drop_pct: None,
        };
        thresholds.validate()?;
        Ok(thresholds)
    }

    /// Set an explicit CTR drop threshold
    pub fn with_ctr_drop_pct(mut self, pct: f64) -> Result<Self> {
        self.ctr_drop_pct = Some(pct);
        self.validate()?;
        Ok(self)
    }

    /// Effective CTR drop threshold
    pub fn ctr_drop_pct(&self) -> f64 {
        self.ctr_drop_pct.unwrap_or(self.roas_drop_pct)
    }

    /// Reject thresholds no rule can score against
    pub fn validate(&self) -> Result<()> {
        check_positive("roas_drop_pct", self.roas_drop_pct)?;
        check_positive("low_ctr", self.low_ctr)?;
        if let Some(pct) = self.ctr_drop_pct {
            check_positive("ctr_drop_pct", pct)?;
        }
        Ok(())
    }
}

fn check_positive(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(Error::Config(format!(
            "threshold '{}' must be a positive number, got {}",
            name, value
        )));
    }
    Ok(())
}

/// Input and output locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paths {
    /// CSV dataset to analyze
    pub dataset: PathBuf,
    /// Directory for the JSON run log
    pub logs: PathBuf,
    /// Directory for insights.json, creatives.json and report.md
    pub outputs: PathBuf,
}

/// Creative recommender settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreativeSettings {
    /// Maximum number of adsets to produce copy suggestions for
    #[serde(default = "default_max_recommendations")]
    pub max_recommendations: usize,
}

impl Default for CreativeSettings {
    fn default() -> Self {
        Self {
            max_recommendations: default_max_recommendations(),
        }
    }
}

fn default_max_recommendations() -> usize {
    10
}

fn default_seed() -> u64 {
    42
}

/// Complete run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Seed for the creative template RNG
    #[serde(default = "default_seed")]
    pub random_seed: u64,
    pub paths: Paths,
    pub thresholds: Thresholds,
    #[serde(default)]
    pub creative: CreativeSettings,
}

impl AppConfig {
    /// Load configuration (explicit path, then user override, then embedded default)
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (content, source) = match path {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::NotFound(format!(
                        "config file {}",
                        path.display()
                    )));
                }
                (read_config(path)?, path.display().to_string())
            }
            None => match default_config_path().filter(|p| p.exists()) {
                Some(user_path) => (read_config(&user_path)?, user_path.display().to_string()),
                None => (DEFAULT_CONFIG.to_string(), "embedded default".to_string()),
            },
        };

        let config = Self::from_yaml_str(&content)?;
        tracing::debug!(source = %source, "Loaded configuration");
        Ok(config)
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: AppConfig = serde_yaml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid config: {}", e)))?;
        config.thresholds.validate()?;
        Ok(config)
    }

    /// The embedded default configuration
    pub fn embedded() -> Result<Self> {
        Self::from_yaml_str(DEFAULT_CONFIG)
    }
}

/// Default user config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("adsight").join("config.yaml"))
}

fn read_config(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read config {}: {}", path.display(), e)))
}
