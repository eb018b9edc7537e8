//! The table object: a fixed-width sequence of equal-height labeled
//! columns.

use std::collections::HashMap;

use crate::column::ColumnRef;
use crate::error::{Error, Result};

/// An immutable sequence of labeled, equal-height columns.
pub struct Table {
    columns: Vec<ColumnRef>,
    labels: Vec<String>,
    index_of: HashMap<String, usize>,
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("labels", &self.labels)
            .field("num_columns", &self.columns.len())
            .finish()
    }
}

impl Table {
    /// Builds a table from `columns` and `labels`, which must be the same
    /// length, have unique labels, and have columns of equal
    /// [`Column::size`].
    pub fn new(columns: Vec<ColumnRef>, labels: Vec<String>) -> Result<Self> {
        if columns.len() != labels.len() {
            return Err(Error::InvalidTable(format!(
                "{} columns but {} labels",
                columns.len(),
                labels.len()
            )));
        }
        let height = columns.first().map(|c| c.size());
        for (col, label) in columns.iter().zip(&labels) {
            if Some(col.size()) != height {
                return Err(Error::InvalidTable(format!(
                    "column {label:?} has height {} but table height is {}",
                    col.size(),
                    height.unwrap_or(0)
                )));
            }
        }
        let mut index_of = HashMap::with_capacity(labels.len());
        for (i, label) in labels.iter().enumerate() {
            if index_of.insert(label.clone(), i).is_some() {
                return Err(Error::InvalidTable(format!("duplicate column label {label:?}")));
            }
        }
        Ok(Self { columns, labels, index_of })
    }

    /// Number of columns (the table's width).
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Number of rows (the table's height); `0` for a zero-column table.
    pub fn height(&self) -> usize {
        self.columns.first().map(|c| c.size()).unwrap_or(0)
    }

    /// All column labels, in column order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// All columns, in declared order.
    pub fn columns(&self) -> &[ColumnRef] {
        &self.columns
    }

    /// The column at position `i`, if in range.
    pub fn column_at(&self, i: usize) -> Option<&ColumnRef> {
        self.columns.get(i)
    }

    /// The column labeled `label`, if present.
    pub fn column(&self, label: &str) -> Option<&ColumnRef> {
        self.index_of.get(label).and_then(|&i| self.columns.get(i))
    }

    /// The index of the column labeled `label`, if present.
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.index_of.get(label).copied()
    }
}
