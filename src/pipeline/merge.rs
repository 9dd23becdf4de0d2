//! Merging tables that tabula split across page breaks.
//!
//! A long table printed over several pages comes back as one fragment per
//! page. A fragment either repeats the header exactly, or (when the page
//! break fell mid-table) has a blank first header cell, which the extractor
//! names `Unnamed: 0`. Both cases are glued onto the table before them.

use crate::table::Table;
use tracing::debug;

/// Merge consecutive fragments of the same table.
///
/// - Zero or one table is returned unchanged.
/// - Empty tables are dropped.
/// - A table continues the previous one when the column lists are equal or
///   its first column is `Unnamed…`; otherwise it starts a new table.
pub fn merge_fragmented_tables(tables: Vec<Table>) -> Vec<Table> {
    if tables.len() <= 1 {
        return tables;
    }

    let input_count = tables.len();
    let mut merged: Vec<Table> = Vec::new();
    let mut current: Option<Table> = None;

    for table in tables {
        if table.is_empty() {
            continue;
        }

        match current.as_mut() {
            Some(cur) if is_continuation(cur, &table) => cur.append(table),
            _ => {
                if let Some(done) = current.replace(table) {
                    merged.push(done);
                }
            }
        }
    }

    if let Some(last) = current {
        merged.push(last);
    }

    debug!("merged {} fragment(s) into {} table(s)", input_count, merged.len());
    merged
}

fn is_continuation(current: &Table, next: &Table) -> bool {
    next.columns == current.columns
        || next
            .columns
            .first()
            .is_some_and(|c| c.starts_with("Unnamed"))
}
