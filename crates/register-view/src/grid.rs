//! Grid layout
//!
//! Chunks an ordered sequence into fixed-width rows. The last row may be
//! short; it is never padded.

use serde::Serialize;

use crate::error::{RegisterError, Result};

/// Size of a device word in bytes, used for row offset labels
pub const WORD_BYTES: usize = 4;

/// Items arranged into rows of `columns` entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayGrid<T> {
    columns: usize,
    rows: Vec<Vec<T>>,
}

impl<T> DisplayGrid<T> {
    /// Arrange `items` into rows of `columns`, preserving traversal order
    pub fn layout<I>(items: I, columns: usize) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
    {
        if columns == 0 {
            return Err(RegisterError::InvalidColumns(columns));
        }

        let mut rows = Vec::new();
        let mut row = Vec::with_capacity(columns);
        for item in items {
            row.push(item);
            if row.len() == columns {
                rows.push(std::mem::replace(&mut row, Vec::with_capacity(columns)));
            }
        }
        if !row.is_empty() {
            rows.push(row);
        }

        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> &[Vec<T>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn into_rows(self) -> Vec<Vec<T>> {
        self.rows
    }

    /// All entries in row-major order
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.rows.iter().flatten()
    }

    /// Byte offset of the first word in `row`, when the grid holds words
    pub fn row_byte_offset(&self, row: usize) -> usize {
        row * self.columns * WORD_BYTES
    }

    /// Transform every entry, keeping the row structure
    pub fn map<U, F>(self, mut f: F) -> DisplayGrid<U>
    where
        F: FnMut(T) -> U,
    {
        DisplayGrid {
            columns: self.columns,
            rows: self
                .rows
                .into_iter()
                .map(|row| row.into_iter().map(&mut f).collect())
                .collect(),
        }
    }
}
