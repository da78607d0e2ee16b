//! Tabular input and the batch runner
//!
//! A statement export is read into a `Table` of text cells, the description
//! column is located, every row goes through the categorizer, and the
//! decision columns are appended. Cells outside those columns are carried
//! through unchanged.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};
use tracing::{debug, info, warn};

use crate::engine::{CategorizationResult, Categorizer};
use crate::error::{Error, Result};

/// Columns appended to every categorized table
pub const OUTPUT_COLUMNS: [&str; 5] = ["Category", "Tag_1", "Tag_2", "Tag_3", "Method"];

/// Optional similarity/confidence column
pub const CONFIDENCE_COLUMN: &str = "Confidence";

/// Header names accepted as the description column (case-insensitive)
const DESCRIPTION_NAMES: &[&str] = &[
    "description",
    "desc",
    "narration",
    "memo",
    "details",
    "transaction description",
    "transaction",
    "remark",
    "remarks",
];

/// Fragments accepted anywhere in a header name (case-insensitive)
const DESCRIPTION_FRAGMENTS: &[&str] = &["desc", "narr", "memo", "detail", "remark"];

/// An in-memory table of text cells
///
/// Every row has exactly one cell per header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Build a table, padding short rows with empty cells
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { headers, rows }
    }

    /// Read CSV with a header row
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = rdr.headers()?.iter().map(String::from).collect();
        let mut rows = Vec::new();

        for (line, result) in rdr.records().enumerate() {
            let record = result?;
            if record.len() > headers.len() {
                warn!(
                    row = line + 1,
                    cells = record.len(),
                    columns = headers.len(),
                    "Row has more cells than headers, extra cells dropped"
                );
            }
            rows.push(record.iter().take(headers.len()).map(String::from).collect());
        }

        debug!("Read {} rows with {} columns", rows.len(), headers.len());
        Ok(Self::new(headers, rows))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        Self::from_reader(File::open(path)?)
    }

    /// Write CSV with a header row
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = WriterBuilder::new().from_writer(writer);
        wtr.write_record(&self.headers)?;
        for row in &self.rows {
            wtr.write_record(row)?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn write_path(&self, path: &Path) -> Result<()> {
        self.write_to(File::create(path)?)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the column with exactly this name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cells of one column, top to bottom
    pub fn column(&self, index: usize) -> impl Iterator<Item = &str> {
        self.rows.iter().map(move |row| row[index].as_str())
    }

    /// Append a column, returning the header actually used
    ///
    /// Existing columns are never touched: a clashing name gets the first
    /// free `_1`, `_2`, ... suffix.
    pub fn append_column(&mut self, name: &str, values: Vec<String>) -> String {
        debug_assert_eq!(values.len(), self.rows.len());
        let header = self.free_header(name);
        if header != name {
            warn!(column = %name, renamed = %header, "Output column already exists in input");
        }
        self.headers.push(header.clone());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
        header
    }

    fn free_header(&self, name: &str) -> String {
        if self.column_index(name).is_none() {
            return name.to_string();
        }
        (1..)
            .map(|n| format!("{}_{}", name, n))
            .find(|candidate| self.column_index(candidate).is_none())
            .unwrap_or_else(|| name.to_string())
    }
}

/// Locate the description column
///
/// Resolution order: the explicit name if present, then a case-insensitive
/// match against well-known header names, then a case-insensitive fragment
/// match. Fails with every available column listed.
pub fn resolve_description_column(headers: &[String], explicit: Option<&str>) -> Result<usize> {
    if let Some(name) = explicit {
        if let Some(index) = headers.iter().position(|h| h == name) {
            return Ok(index);
        }
        warn!(column = %name, "Requested description column not found, auto-detecting");
    }

    let lowered: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();

    for candidate in DESCRIPTION_NAMES {
        if let Some(index) = lowered.iter().position(|h| h == candidate) {
            return Ok(index);
        }
    }

    for fragment in DESCRIPTION_FRAGMENTS {
        if let Some(index) = lowered.iter().position(|h| h.contains(fragment)) {
            return Ok(index);
        }
    }

    Err(Error::MissingDescriptionColumn {
        available: headers.to_vec(),
    })
}

/// A categorized table plus the per-row decisions behind it
#[derive(Debug, Clone)]
pub struct CategorizedTable {
    pub table: Table,
    pub results: Vec<CategorizationResult>,
    /// Header of the column that was categorized
    pub description_column: String,
    /// Headers of the appended columns, suffixed where the input already
    /// used the name
    pub output_columns: Vec<String>,
}

/// Categorize every row of `table`
///
/// The input is never modified: on a backend failure the error is returned
/// and no partial output exists.
pub fn categorize_table(
    engine: &Categorizer,
    table: &Table,
    column: Option<&str>,
    with_confidence: bool,
) -> Result<CategorizedTable> {
    let index = resolve_description_column(table.headers(), column)?;
    let description_column = table.headers()[index].clone();

    let descriptions: Vec<&str> = table.column(index).collect();
    let results = engine.categorize_many(&descriptions)?;

    let mut output = table.clone();
    let mut category = Vec::with_capacity(results.len());
    let mut tags: [Vec<String>; 3] = Default::default();
    let mut method = Vec::with_capacity(results.len());
    let mut confidence = Vec::with_capacity(results.len());

    for result in &results {
        category.push(result.category.clone());
        for (column, tag) in tags.iter_mut().zip(&result.tags) {
            column.push(tag.clone().unwrap_or_default());
        }
        method.push(result.method.to_string());
        confidence.push(format!("{:.4}", result.confidence));
    }

    let [tag_1, tag_2, tag_3] = tags;
    let mut output_columns: Vec<String> = OUTPUT_COLUMNS
        .iter()
        .zip([category, tag_1, tag_2, tag_3, method])
        .map(|(name, values)| output.append_column(name, values))
        .collect();
    if with_confidence {
        output_columns.push(output.append_column(CONFIDENCE_COLUMN, confidence));
    }

    info!(
        rows = results.len(),
        column = %description_column,
        "Categorized table"
    );

    Ok(CategorizedTable {
        table: output,
        results,
        description_column,
        output_columns,
    })
}
