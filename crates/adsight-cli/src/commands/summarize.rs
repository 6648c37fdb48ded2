//! Summarize command implementation

use std::path::PathBuf;

use adsight_core::{summarize, AppConfig, DataLoader};
use anyhow::{Context, Result};

use super::apply_overrides;

pub fn cmd_summarize(mut config: AppConfig, dataset: Option<PathBuf>, json: bool) -> Result<()> {
    apply_overrides(&mut config, dataset, None, None);

    let table = DataLoader::new(&config.paths.dataset)
        .load()
        .with_context(|| format!("Failed to load {}", config.paths.dataset.display()))?;
    let summary = summarize(&table).context("Failed to summarize dataset")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!();
    println!("📈 Metric Summary");
    println!(
        "   Dataset: {} ({} rows)",
        config.paths.dataset.display(),
        table.len()
    );
    println!("   ─────────────────────────────────────────────────────────────");

    if summary.is_empty() {
        println!("   No known metric columns found.");
        return Ok(());
    }

    println!(
        "   {:40} │ {:>10} │ {:>10} │ {:>8} │ {:5}",
        "Key", "Mean", "Later", "Change", "Trend"
    );
    println!("   ─────────────────────────────────────────┼────────────┼────────────┼──────────┼──────");
    for (key, stats) in summary.iter() {
        let later = stats
            .after
            .map(|v| format!("{:.4}", v))
            .unwrap_or_else(|| "-".to_string());
        let change = stats
            .change
            .map(|c| format!("{:+.1}%", c * 100.0))
            .unwrap_or_else(|| "-".to_string());
        let trend = stats.trend.map(|t| t.as_str()).unwrap_or("-");
        println!(
            "   {:40} │ {:>10.4} │ {:>10} │ {:>8} │ {:5}",
            super::truncate(key, 40),
            stats.mean,
            later,
            change,
            trend
        );
    }

    Ok(())
}
