//! Table types.

use super::BBox;
use serde::{Deserialize, Serialize};

/// A table recovered from aligned text, as a grid of cell strings.
///
/// Every row has the same number of cells; missing cells are empty strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableBlock {
    pub page_index: usize,
    pub bbox: BBox,
    pub rows: Vec<Vec<String>>,
}

impl TableBlock {
    /// Create a table, padding short rows to the widest row.
    pub fn new(page_index: usize, bbox: BBox, mut rows: Vec<Vec<String>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(width, String::new());
        }
        Self {
            page_index,
            bbox,
            rows,
        }
    }

    /// Get the number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get the number of columns.
    pub fn column_count(&self) -> usize {
        self.rows.first().map(Vec::len).unwrap_or(0)
    }

    /// Check if the table has no cells at all.
    pub fn is_empty(&self) -> bool {
        self.row_count() == 0 || self.column_count() == 0
    }

    /// Cells of one column, top to bottom.
    pub fn column(&self, index: usize) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .map(move |row| row.get(index).map(String::as_str).unwrap_or(""))
    }

    /// Whether every cell of the column is empty after trimming.
    pub fn is_column_empty(&self, index: usize) -> bool {
        self.column(index).all(|cell| cell.trim().is_empty())
    }

    /// Get plain text representation of the table.
    pub fn plain_text(&self) -> String {
        self.rows
            .iter()
            .map(|row| row.join("\t"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
