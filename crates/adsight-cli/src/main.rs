//! Adsight CLI - Hypothesis-driven ad performance analyst
//!
//! Usage:
//!   adsight analyze "Analyze ROAS drop"   Run the full analysis
//!   adsight summarize --json              Print the metric summary
//!   adsight config                        Show the resolved configuration

mod cli;
mod commands;


use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

/// JSON run log written inside `paths.logs`
const LOG_FILE: &str = "adsight.log";

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = commands::load_config(cli.config.as_deref())?;

    init_logging(cli.verbose, &config.paths.logs);

    match cli.command {
        Commands::Analyze {
            query,
            dataset,
            output,
            seed,
        } => commands::cmd_analyze(config, &query, dataset, output, seed),
        Commands::Summarize { dataset, json } => commands::cmd_summarize(config, dataset, json),
        Commands::Config => commands::cmd_config(&config, cli.config.as_deref()),
    }
}

/// Console output plus a JSON log file
///
/// Priority: RUST_LOG env var > --verbose flag > default (info)
fn init_logging(verbose: bool, log_dir: &Path) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    // An unwritable log directory only loses the file copy of the log
    let log_file = fs::create_dir_all(log_dir).and_then(|_| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_dir.join(LOG_FILE))
    });
    let (json_layer, file_error) = match log_file {
        Ok(file) => (
            Some(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(Mutex::new(file)),
            ),
            None,
        ),
        Err(e) => (None, Some(e)),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .with(json_layer)
        .init();

    if let Some(e) = file_error {
        tracing::warn!(
            dir = %log_dir.display(),
            error = %e,
            "Could not open log file, logging to console only"
        );
    }
}
