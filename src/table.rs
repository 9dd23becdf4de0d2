//! In-memory table model shared by every pipeline stage.
//!
//! A [`Table`] is a header row plus data rows, the shape tabula reports and
//! the shape a worksheet is written in. Rows are always as wide as
//! `columns`; every constructor and mutator pads short rows with
//! [`Cell::Empty`].

use serde::{Deserialize, Serialize};

/// One cell of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Cell {
    /// Nothing was extracted at this position.
    #[default]
    Empty,
    Number(f64),
    Text(String),
}

impl Cell {
    /// Build a cell from raw extracted text; blank text becomes [`Cell::Empty`].
    pub fn from_text(text: &str) -> Self {
        if text.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(text.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::from_text(s)
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

/// A header row plus data rows.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Build a table, padding or truncating each row to the header width.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Cell::Empty);
                row
            })
            .collect();
        Self { columns, rows }
    }

    /// A table with no columns or no rows carries no data.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() || self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Iterate over the cells of one column, top to bottom.
    pub fn column(&self, idx: usize) -> impl Iterator<Item = &Cell> + '_ {
        self.rows.iter().filter_map(move |r| r.get(idx))
    }

    /// Mutable access to every cell, row-major.
    pub fn cells_mut(&mut self) -> impl Iterator<Item = &mut Cell> + '_ {
        self.rows.iter_mut().flat_map(|r| r.iter_mut())
    }

    /// Append `other` below `self`, aligning columns by name.
    ///
    /// Columns of `other` that `self` lacks are added to the right; cells
    /// that have no counterpart on either side stay [`Cell::Empty`].
    pub fn append(&mut self, other: Table) {
        for name in &other.columns {
            if self.column_index(name).is_none() {
                self.columns.push(name.clone());
            }
        }
        let width = self.columns.len();
        for row in &mut self.rows {
            row.resize(width, Cell::Empty);
        }

        let mapping: Vec<usize> = other
            .columns
            .iter()
            .map(|name| self.column_index(name).unwrap_or(0))
            .collect();

        for row in other.rows {
            let mut out = vec![Cell::Empty; width];
            for (cell, &dst) in row.into_iter().zip(&mapping) {
                out[dst] = cell;
            }
            self.rows.push(out);
        }
    }

    /// Concatenate tables top to bottom with [`Table::append`] semantics.
    pub fn concat(tables: impl IntoIterator<Item = Table>) -> Option<Table> {
        let mut iter = tables.into_iter();
        let mut first = iter.next()?;
        for t in iter {
            first.append(t);
        }
        Some(first)
    }
}
