//! Sift CLI - Hybrid transaction categorizer
//!
//! Usage:
//!   sift categorize --file statement.csv   Categorize a CSV statement
//!   sift classify "UPI-SWIGGY-ORDER"       Categorize one description
//!   sift rules test "IMPS TO RAHUL"        Explain rule and name matches
//!   sift backend                           Check the embedding backend

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;
use commands::EngineOptions;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    // Logs go to stderr so categorized CSV on stdout stays clean
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();

    let opts = EngineOptions {
        config: cli.config,
        rules: cli.rules,
        names: cli.names,
        backend: cli.backend,
    };

    match cli.command {
        Commands::Categorize {
            file,
            column,
            output,
            clean,
            confidence,
            summary,
        } => commands::cmd_categorize(
            &opts,
            &file,
            column.as_deref(),
            output.as_deref(),
            clean,
            confidence,
            summary,
        ),
        Commands::Classify { description, json } => {
            commands::cmd_classify(&opts, &description, json)
        }
        Commands::Rules { action } => match action {
            None | Some(RulesAction::List) => commands::cmd_rules_list(&opts),
            Some(RulesAction::Test { description }) => {
                commands::cmd_rules_test(&opts, &description)
            }
        },
        Commands::Vocab => commands::cmd_vocab(&opts),
        Commands::Backend => commands::cmd_backend(&opts),
    }
}
