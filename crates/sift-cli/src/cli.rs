//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Sift - Categorize bank transactions
#[derive(Parser)]
#[command(name = "sift")]
#[command(about = "Hybrid rule + embedding transaction categorizer", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Settings file (defaults to the data-dir override, then built-in defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Merchant rule table (TOML)
    #[arg(long, global = true)]
    pub rules: Option<PathBuf>,

    /// Personal names file, one name per line
    #[arg(long, global = true)]
    pub names: Option<PathBuf>,

    /// Embedding backend: ollama, openai_compatible or mock
    ///
    /// Overrides the settings file and EMBEDDING_BACKEND.
    #[arg(long, global = true)]
    pub backend: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Categorize every row of a CSV statement
    Categorize {
        /// CSV file to categorize
        #[arg(short, long)]
        file: PathBuf,

        /// Description column (auto-detected if not specified)
        #[arg(short, long)]
        column: Option<String>,

        /// Output CSV (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Trim cells, tidy descriptions and drop duplicate rows first
        #[arg(long)]
        clean: bool,

        /// Add a Confidence column
        #[arg(long)]
        confidence: bool,

        /// Print a spend summary after categorizing
        #[arg(long)]
        summary: bool,
    },

    /// Categorize a single description
    Classify {
        /// Transaction description
        description: String,

        /// Print the decision as JSON
        #[arg(long)]
        json: bool,
    },

    /// Inspect the merchant rule table
    Rules {
        #[command(subcommand)]
        action: Option<RulesAction>,
    },

    /// Show the category set and tag vocabulary
    Vocab,

    /// Show the embedding backend and check that it responds
    Backend,
}

#[derive(Subcommand)]
pub enum RulesAction {
    /// List all rules in match order
    List,

    /// Show every rule and name check that matches a description
    Test {
        /// Transaction description
        description: String,
    },
}
