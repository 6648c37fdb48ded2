//! CLI argument definitions using clap
//!
//! This module contains the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Adsight - Explain ad performance movements
#[derive(Parser)]
#[command(name = "adsight")]
#[command(about = "Hypothesis-driven ad performance analyst", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to ~/.config/adsight/config.yaml, then the built-in config)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full analysis and write insights, creatives and a report
    Analyze {
        /// What to analyze, e.g. "Analyze ROAS drop"
        query: String,

        /// Dataset CSV (overrides paths.dataset)
        #[arg(short, long)]
        dataset: Option<PathBuf>,

        /// Output directory (overrides paths.outputs)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Seed for creative template selection (overrides random_seed)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Print the metric summary the hypothesis rules read
    Summarize {
        /// Dataset CSV (overrides paths.dataset)
        #[arg(short, long)]
        dataset: Option<PathBuf>,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the resolved configuration
    Config,
}
