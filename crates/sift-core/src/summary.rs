//! Spend-by-category summary of a categorized table

use std::collections::HashMap;

use serde::Serialize;

use crate::batch::CategorizedTable;
use crate::engine::Method;

/// Header of the spend column (case-insensitive)
pub const DEBIT_COLUMN: &str = "debit";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySpend {
    pub category: String,
    pub total: f64,
}

/// Debit totals, largest first
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpendBreakdown {
    pub categories: Vec<CategorySpend>,
    pub total: f64,
    /// Rows with a positive debit
    pub debit_rows: usize,
}

impl SpendBreakdown {
    pub fn highest(&self) -> Option<&CategorySpend> {
        self.categories.first()
    }

    pub fn top(&self, n: usize) -> &[CategorySpend] {
        &self.categories[..n.min(self.categories.len())]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpendSummary {
    pub rows: usize,
    /// Row count per method, in cascade order
    pub methods: Vec<(Method, usize)>,
    /// Semantic decisions under the acceptance threshold
    pub low_confidence: usize,
    /// `None` when the table has no debit column
    pub spend: Option<SpendBreakdown>,
}

/// Parse a statement amount: commas dropped, blank or `-` is zero,
/// anything unparseable is zero
pub fn parse_amount(cell: &str) -> f64 {
    let cleaned = cell.trim().replace(',', "");
    if cleaned.is_empty() || cleaned == "-" {
        return 0.0;
    }
    cleaned.parse().unwrap_or(0.0)
}

pub fn summarize(categorized: &CategorizedTable) -> SpendSummary {
    let results = &categorized.results;

    let methods = Method::all()
        .iter()
        .map(|m| (*m, results.iter().filter(|r| r.method == *m).count()))
        .collect();
    let low_confidence = results.iter().filter(|r| r.is_low_confidence()).count();

    let table = &categorized.table;
    let spend = table
        .headers()
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(DEBIT_COLUMN))
        .map(|debit| {
            let mut order: Vec<String> = Vec::new();
            let mut totals: HashMap<String, f64> = HashMap::new();
            let mut debit_rows = 0;

            for (amount, result) in table.column(debit).map(parse_amount).zip(results) {
                if amount <= 0.0 {
                    continue;
                }
                debit_rows += 1;
                let total = totals.entry(result.category.clone()).or_insert_with(|| {
                    order.push(result.category.clone());
                    0.0
                });
                *total += amount;
            }

            let mut categories: Vec<CategorySpend> = order
                .into_iter()
                .map(|category| {
                    let total = totals[&category];
                    CategorySpend { category, total }
                })
                .collect();
            // Stable: equal totals keep first-seen order
            categories.sort_by(|a, b| b.total.total_cmp(&a.total));

            SpendBreakdown {
                total: categories.iter().map(|c| c.total).sum(),
                categories,
                debit_rows,
            }
        });

    SpendSummary {
        rows: results.len(),
        methods,
        low_confidence,
        spend,
    }
}
