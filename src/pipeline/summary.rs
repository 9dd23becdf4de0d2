//! Combined summary: the three columns a lab actually reads.
//!
//! Spectrophotometer reports name their columns inconsistently across
//! firmware versions, so each target column is found by substring over a
//! list of known spellings. The first matching column wins.

use crate::pipeline::numbers::fix_swedish_numbers;
use crate::table::{Cell, Table};

/// Name of the provenance column prepended to every summary row.
pub const SOURCE_COLUMN: &str = "Source File";

/// Output column name and the spellings that identify it.
const TARGETS: &[(&str, &[&str])] = &[
    ("Sample", &["Sample", "sample", "Sample Name", "sample name"]),
    (
        "ng/ul",
        &["ng/ul", "ng/uL", "ng/µl", "Concentration", "concentration"],
    ),
    ("260/280", &["260/280", "260 / 280", "A260/A280", "Ratio"]),
];

/// Index of the first column whose name contains any of `patterns`.
fn find_column(table: &Table, patterns: &[&str]) -> Option<usize> {
    table
        .columns
        .iter()
        .position(|col| patterns.iter().any(|p| col.contains(p)))
}

/// Pull `Source File`, `Sample`, `ng/ul` and `260/280` out of `table`.
///
/// Returns `None` when none of the three target columns exist or the table
/// has no rows.
pub fn extract_summary_data(table: &Table, source_file: &str) -> Option<Table> {
    let found: Vec<(&str, usize)> = TARGETS
        .iter()
        .filter_map(|(name, patterns)| find_column(table, patterns).map(|idx| (*name, idx)))
        .collect();

    if found.is_empty() || table.rows.is_empty() {
        return None;
    }

    let mut columns = vec![SOURCE_COLUMN.to_string()];
    columns.extend(found.iter().map(|(name, _)| name.to_string()));

    let rows = table
        .rows
        .iter()
        .map(|row| {
            let mut out = vec![Cell::Text(source_file.to_string())];
            out.extend(
                found
                    .iter()
                    .map(|(_, idx)| row.get(*idx).cloned().unwrap_or_default()),
            );
            out
        })
        .collect();

    let mut summary = Table::new(columns, rows);
    fix_swedish_numbers(&mut summary);
    Some(summary)
}

/// Stack the summaries of several tables or files into one.
pub fn combine(summaries: impl IntoIterator<Item = Table>) -> Option<Table> {
    Table::concat(summaries)
}
