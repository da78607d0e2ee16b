//! Optional pre-processing for raw statement exports
//!
//! Never required by the engine. Applied before categorization when asked
//! for (`sift categorize --clean`).

use std::collections::HashSet;

use tracing::debug;

use crate::batch::{resolve_description_column, Table};
use crate::error::Result;

/// Headers whose cells are treated as amounts (case-insensitive)
const AMOUNT_COLUMNS: &[&str] = &["debit", "credit", "balance"];

/// Headers whose cells get the description tidy-up (case-insensitive)
const REFERENCE_COLUMNS: &[&str] = &["ref/cheque no.", "ref no.", "cheque no."];

/// Result of a cleaning pass
#[derive(Debug, Clone, PartialEq)]
pub struct Cleaned {
    pub table: Table,
    pub duplicates_removed: usize,
}

/// Clean a table
///
/// - every cell is trimmed
/// - the description and `Ref/Cheque No.` cells have whitespace runs
///   collapsed and `#`, `_`, `*` replaced by spaces
/// - amount cells lose thousands separators; blank or `-` becomes `0`
/// - exact duplicate rows are dropped, first occurrence kept
pub fn clean_table(table: &Table, column: Option<&str>) -> Result<Cleaned> {
    let description = resolve_description_column(table.headers(), column)?;
    let amount_columns = columns_named(table, AMOUNT_COLUMNS);
    let reference_columns = columns_named(table, REFERENCE_COLUMNS);

    let mut seen = HashSet::new();
    let mut rows = Vec::with_capacity(table.len());
    let mut duplicates_removed = 0;

    for row in table.rows() {
        let cleaned: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                if i == description || reference_columns.contains(&i) {
                    clean_description(cell)
                } else if amount_columns.contains(&i) {
                    clean_amount(cell)
                } else {
                    cell.trim().to_string()
                }
            })
            .collect();

        if seen.insert(cleaned.clone()) {
            rows.push(cleaned);
        } else {
            duplicates_removed += 1;
        }
    }

    debug!(
        rows = rows.len(),
        duplicates_removed, "Cleaned table"
    );

    Ok(Cleaned {
        table: Table::new(table.headers().to_vec(), rows),
        duplicates_removed,
    })
}

fn columns_named(table: &Table, names: &[&str]) -> Vec<usize> {
    table
        .headers()
        .iter()
        .enumerate()
        .filter(|(_, h)| names.contains(&h.trim().to_lowercase().as_str()))
        .map(|(i, _)| i)
        .collect()
}

/// Trim, collapse whitespace, then blank out `#`, `_` and `*`
pub fn clean_description(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace(['#', '_', '*'], " ")
}

/// Strip thousands separators; blank and `-` mean zero
pub fn clean_amount(text: &str) -> String {
    let stripped = text.trim().replace(',', "");
    if stripped.is_empty() || stripped == "-" {
        "0".to_string()
    } else {
        stripped
    }
}
