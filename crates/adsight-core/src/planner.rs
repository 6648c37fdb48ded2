//! Run planner
//!
//! Turns a free-text query into the ordered list of steps a run performs.
//! The step list itself is fixed; the query only shapes the wording of the
//! hypothesis and evaluation steps.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// One step of an analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanStep {
    pub step: usize,
    pub name: String,
    pub description: String,
}

impl PlanStep {
    fn new(step: usize, name: &str, description: impl Into<String>) -> Self {
        Self {
            step,
            name: name.to_string(),
            description: description.into(),
        }
    }
}

/// Builds the step plan for a query
pub struct Planner {
    roas: Regex,
    ctr: Regex,
    creative: Regex,
}

impl Planner {
    pub fn new() -> Self {
        Self {
            roas: Regex::new(r"(?i)\broas\b|return on ad spend").expect("valid regex"),
            ctr: Regex::new(r"(?i)\bctr\b|click").expect("valid regex"),
            creative: Regex::new(r"(?i)creative|headline|copy").expect("valid regex"),
        }
    }

    /// Metrics named in the query, in a stable order
    pub fn focus(&self, query: &str) -> Vec<&'static str> {
        let mut focus = Vec::new();
        if self.roas.is_match(query) {
            focus.push("ROAS");
        }
        if self.ctr.is_match(query) {
            focus.push("CTR");
        }
        if self.creative.is_match(query) {
            focus.push("creative performance");
        }
        focus
    }

    pub fn plan(&self, query: &str) -> Vec<PlanStep> {
        let focus = self.focus(query);
        let target = if focus.is_empty() {
            "ROAS and CTR".to_string()
        } else {
            focus.join(", ")
        };

        tracing::debug!(query = %query, focus = ?focus, "Planning run");

        vec![
            PlanStep::new(
                1,
                "Load data",
                "Load the ad performance dataset and fingerprint the source file.",
            ),
            PlanStep::new(
                2,
                "Summarize metrics",
                "Compute per-metric statistics and earlier/later trend halves for the dataset and each campaign.",
            ),
            PlanStep::new(
                3,
                "Generate hypotheses",
                format!("Propose explanations for movements in {}.", target),
            ),
            PlanStep::new(
                4,
                "Evaluate hypotheses",
                format!(
                    "Score each hypothesis against the raw {} series and record the evidence.",
                    target
                ),
            ),
            PlanStep::new(
                5,
                "Recommend creatives",
                "Suggest new headlines and calls to action for low-CTR adsets.",
            ),
            PlanStep::new(
                6,
                "Write report",
                "Save insights, creative recommendations and a Markdown report.",
            ),
        ]
    }
}

impl Default for Planner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_has_six_ordered_steps() {
        let plan = Planner::new().plan("Analyze ROAS drop");
        assert_eq!(plan.len(), 6);
        let steps: Vec<usize> = plan.iter().map(|s| s.step).collect();
        assert_eq!(steps, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(plan[0].name, "Load data");
        assert_eq!(plan[5].name, "Write report");
    }

    #[test]
    fn test_focus_matches_case_insensitively() {
        let planner = Planner::new();
        assert_eq!(planner.focus("why did roas fall?"), vec!["ROAS"]);
        assert_eq!(planner.focus("Click-through is weak"), vec!["CTR"]);
        assert_eq!(
            planner.focus("ROAS and CTR, plus new creative ideas"),
            vec!["ROAS", "CTR", "creative performance"]
        );
        // "roast" is not ROAS
        assert!(planner.focus("coffee roast sales").is_empty());
    }

    #[test]
    fn test_plan_wording_follows_focus() {
        let planner = Planner::new();
        let focused = planner.plan("Analyze CTR");
        assert!(focused[2].description.contains("CTR"));
        assert!(!focused[2].description.contains("ROAS"));

        let general = planner.plan("How are my ads doing?");
        assert!(general[2].description.contains("ROAS and CTR"));
    }
}
