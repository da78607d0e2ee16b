//! Batch categorization command and spend summary rendering

use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use sift_core::{categorize_table, clean_table, summarize, SpendSummary, Table};

use super::core::{build_engine, EngineOptions};

/// Categorize a CSV statement
///
/// Status lines go to stderr: stdout may be carrying the CSV itself.
pub fn cmd_categorize(
    opts: &EngineOptions,
    file: &Path,
    column: Option<&str>,
    output: Option<&Path>,
    clean: bool,
    confidence: bool,
    summary: bool,
) -> Result<()> {
    let mut table = Table::from_path(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    eprintln!("📂 Read {} rows from {}", table.len(), file.display());

    if clean {
        let cleaned = clean_table(&table, column).context("Failed to clean table")?;
        if cleaned.duplicates_removed > 0 {
            eprintln!("   Removed {} duplicate rows", cleaned.duplicates_removed);
        }
        table = cleaned.table;
    }

    let engine = build_engine(opts)?;
    let categorized = categorize_table(&engine, &table, column, confidence)
        .context("Categorization failed")?;

    match output {
        Some(path) => {
            categorized
                .table
                .write_path(path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!(
                "✅ Categorized {} rows ({}) → {}",
                categorized.results.len(),
                categorized.description_column,
                path.display()
            );
        }
        None => {
            categorized
                .table
                .write_to(io::stdout().lock())
                .context("Failed to write CSV to stdout")?;
        }
    }

    if summary {
        let threshold = engine.settings().semantic_threshold;
        eprintln!();
        eprint!("{}", render_summary(&summarize(&categorized), threshold));
    }

    Ok(())
}

/// Text rendering of a spend summary
pub fn render_summary(summary: &SpendSummary, semantic_threshold: f32) -> String {
    let mut out = String::new();
    out.push_str("📊 Summary\n");
    out.push_str(&format!("   Rows: {}\n", summary.rows));
    for (method, count) in &summary.methods {
        if *count > 0 {
            out.push_str(&format!("   {:<18} {}\n", method.as_str(), count));
        }
    }
    if summary.low_confidence > 0 {
        out.push_str(&format!(
            "   ⚠️  {} semantic decisions below similarity {:.2}\n",
            summary.low_confidence, semantic_threshold
        ));
    }

    match &summary.spend {
        None => out.push_str("\n   No Debit column, spend summary skipped\n"),
        Some(spend) if spend.categories.is_empty() => {
            out.push_str("\n   No debit transactions found\n")
        }
        Some(spend) => {
            if let Some(highest) = spend.highest() {
                out.push_str(&format!("\n   Highest spend: {}\n", highest.category));
            }
            out.push_str(&format!(
                "   Total debit:   {:.2} ({} rows)\n",
                spend.total, spend.debit_rows
            ));
            out.push_str("\n   Top categories:\n");
            for (rank, item) in spend.top(3).iter().enumerate() {
                out.push_str(&format!(
                    "   {}. {:<22} {:>12.2}\n",
                    rank + 1,
                    item.category,
                    item.total
                ));
            }
        }
    }

    out
}
