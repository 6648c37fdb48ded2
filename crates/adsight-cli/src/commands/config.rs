//! Config command implementation

use std::path::Path;

use adsight_core::config::default_config_path;
use adsight_core::AppConfig;
use anyhow::Result;

pub fn cmd_config(config: &AppConfig, explicit: Option<&Path>) -> Result<()> {
    let user_path = default_config_path();
    let source = match (explicit, &user_path) {
        (Some(path), _) => path.display().to_string(),
        (None, Some(path)) if path.exists() => path.display().to_string(),
        _ => "built-in default".to_string(),
    };

    println!();
    println!("⚙️  Adsight Configuration");
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Source: {}", source);
    if let Some(path) = user_path {
        println!("   User override path: {}", path.display());
    }
    println!();
    println!("   Dataset: {}", config.paths.dataset.display());
    println!("   Outputs: {}", config.paths.outputs.display());
    println!("   Logs:    {}", config.paths.logs.display());
    println!("   Seed:    {}", config.random_seed);
    println!();
    println!("   Thresholds:");
    println!(
        "     roas_drop_pct: {:.1}%",
        config.thresholds.roas_drop_pct * 100.0
    );
    println!(
        "     ctr_drop_pct:  {:.1}%{}",
        config.thresholds.ctr_drop_pct() * 100.0,
        if config.thresholds.ctr_drop_pct.is_none() {
            " (from roas_drop_pct)"
        } else {
            ""
        }
    );
    println!("     low_ctr:       {:.4}", config.thresholds.low_ctr);
    println!();
    println!(
        "   Max creative recommendations: {}",
        config.creative.max_recommendations
    );

    Ok(())
}
