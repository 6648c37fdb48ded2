//! Analyze command implementation

use std::path::PathBuf;

use adsight_core::{AppConfig, Pipeline, TracingObserver};
use anyhow::{Context, Result};

use super::apply_overrides;

pub fn cmd_analyze(
    mut config: AppConfig,
    query: &str,
    dataset: Option<PathBuf>,
    output: Option<PathBuf>,
    seed: Option<u64>,
) -> Result<()> {
    apply_overrides(&mut config, dataset, output, seed);

    let observer = TracingObserver;
    let pipeline = Pipeline::new(&config, &observer).context("Invalid thresholds")?;
    let artifacts = pipeline.run(query).with_context(|| {
        format!(
            "Analysis failed for dataset {}",
            config.paths.dataset.display()
        )
    })?;
    let paths = pipeline
        .save(&artifacts.report)
        .context("Failed to write run artifacts")?;

    let report = &artifacts.report;
    println!();
    println!("📊 Analysis complete");
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Query: {}", report.query);
    println!(
        "   Dataset: {} ({} rows)",
        report.dataset.path.display(),
        report.dataset.rows
    );
    println!("   Hypotheses: {}", artifacts.hypotheses.len());
    for metric in ["roas", "ctr"] {
        let Some(summary) = artifacts.summary.metric(metric) else {
            continue;
        };
        if let (Some(trend), Some(change)) = (summary.trend, summary.change) {
            println!(
                "   {} trend: {} ({:+.1}% over {} periods)",
                metric.to_uppercase(),
                trend,
                change * 100.0,
                summary.periods
            );
        }
    }
    println!();

    if report.evaluations.is_empty() {
        println!("   No hypotheses triggered under the configured thresholds.");
    } else {
        println!("   {:4} │ {:10} │ {:>10} │ Hypothesis", "ID", "Type", "Confidence");
        println!("   ─────┼────────────┼────────────┼──────────────────────────────");
        for ev in &report.evaluations {
            println!(
                "   {:4} │ {:10} │ {:>10.2} │ {}",
                ev.hypothesis_id,
                ev.kind.as_str(),
                ev.confidence,
                ev.hypothesis
            );
        }
    }

    println!();
    println!("   Creative recommendations: {}", report.creatives.len());
    println!();
    println!("   Insights:  {}", paths.insights.display());
    println!("   Creatives: {}", paths.creatives.display());
    println!("   Report:    {}", paths.report.display());

    Ok(())
}
