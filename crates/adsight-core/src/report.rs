//! Run report and artifact writers

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::creative::CreativeRecommendation;
use crate::engine::Evaluation;
use crate::error::Result;
use crate::planner::PlanStep;

/// Where the analyzed data came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetInfo {
    pub path: PathBuf,
    pub rows: usize,
    /// Hex SHA-256 of the dataset file
    pub digest: Option<String>,
}

/// Everything one analysis run produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub query: String,
    pub generated_at: DateTime<Utc>,
    pub dataset: DatasetInfo,
    pub plan: Vec<PlanStep>,
    pub evaluations: Vec<Evaluation>,
    pub creatives: Vec<CreativeRecommendation>,
}

impl RunReport {
    /// Render the report as Markdown
    pub fn render_markdown(&self) -> String {
        let mut lines = vec![
            "# Ad Performance Analysis Report".to_string(),
            String::new(),
            "## User Query".to_string(),
            format!("`{}`", self.query),
            String::new(),
            "## Dataset".to_string(),
            String::new(),
            format!("- Source: `{}`", self.dataset.path.display()),
            format!("- Rows: {}", self.dataset.rows),
        ];
        if let Some(digest) = &self.dataset.digest {
            lines.push(format!("- SHA-256: `{}`", digest));
        }
        lines.push(format!(
            "- Generated: {}",
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));

        lines.push(String::new());
        lines.push("## Planner Steps".to_string());
        lines.push(String::new());
        for step in &self.plan {
            lines.push(format!(
                "- **Step {} - {}**: {}",
                step.step, step.name, step.description
            ));
        }

        lines.push(String::new());
        lines.push("## Validated Insights".to_string());
        lines.push(String::new());
        if self.evaluations.is_empty() {
            lines.push("_No hypotheses generated/evaluated._".to_string());
        } else {
            for ev in &self.evaluations {
                lines.push(format!("### {}: {}", ev.hypothesis_id, ev.hypothesis));
                lines.push(format!("- Type: `{}`", ev.kind));
                if let Some(scope) = &ev.scope {
                    lines.push(format!("- Scope: {}", scope));
                }
                lines.push(format!("- Confidence: **{:.2}**", ev.confidence));
                lines.push(format!("- Evidence: {}", ev.evidence));
                lines.push(String::new());
            }
        }

        lines.push(String::new());
        lines.push("## Creative Recommendations (Low CTR)".to_string());
        lines.push(String::new());
        if self.creatives.is_empty() {
            lines.push("_No low-CTR campaigns detected under the configured threshold._".to_string());
        } else {
            for rec in &self.creatives {
                let roas = rec
                    .original_roas
                    .map(|r| format!("{:.2}", r))
                    .unwrap_or_else(|| "n/a".to_string());
                lines.push(format!(
                    "### Campaign: {} | Adset: {}",
                    rec.campaign_name, rec.adset_name
                ));
                lines.push(format!(
                    "- Original CTR: {:.4}, Original ROAS: {}",
                    rec.original_ctr, roas
                ));
                lines.push(format!(
                    "- Audience: {} | Platform: {}",
                    rec.audience_type, rec.platform
                ));
                lines.push(format!("- Original Message: {}", rec.original_creative_message));
                lines.push("- Suggested Headlines:".to_string());
                for headline in &rec.suggested_headlines {
                    lines.push(format!("  - {}", headline));
                }
                lines.push(format!("- Suggested CTAs: {}", rec.suggested_ctas.join(", ")));
                lines.push(format!("- Rationale: {}", rec.rationale));
                lines.push(String::new());
            }
        }

        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}

/// Write a value as pretty JSON, creating parent directories
pub fn save_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<()> {
    ensure_parent(path)?;
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}

/// Write Markdown text, creating parent directories
pub fn save_markdown(text: &str, path: &Path) -> Result<()> {
    ensure_parent(path)?;
    fs::write(path, text)?;
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}
