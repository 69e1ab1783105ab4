//! In-memory tabular dataset model.
//!
//! A [`Dataset`] is an ordered list of named columns of equal length. Each
//! dataset also remembers, for every row and every column, the position it
//! had in the uploaded file. Audit records keep pointing at raw rows after
//! rows are removed, and columns keep their statistics and header plan after
//! columns are removed, even when two raw headers are identical.

mod cell;
mod snapshot;

pub use cell::{CellValue, MissingKind};
pub use snapshot::{AnalyzedDataset, CleanedDataset, RawDataset};

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A named column of typed cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<CellValue>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<CellValue>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Build a column from raw strings, typing each cell with [`CellValue::from_raw`].
    pub fn from_raw<'a, I>(name: impl Into<String>, raw: I) -> Self
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        Self::new(name, raw.into_iter().map(CellValue::from_raw).collect())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Non-missing numeric values (formatted text is parsed).
    pub fn numeric_values(&self) -> Vec<f64> {
        self.values
            .iter()
            .filter(|v| !v.is_missing_like())
            .filter_map(CellValue::as_f64)
            .collect()
    }

    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_missing()).count()
    }
}

/// Ordered collection of equal-length columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    columns: Vec<Column>,
    row_origin: Vec<usize>,
    column_origin: Vec<usize>,
}

impl Dataset {
    /// Create a dataset, rejecting columns of differing lengths.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let rows = columns.first().map(Column::len).unwrap_or(0);
        if let Some(bad) = columns.iter().find(|c| c.len() != rows) {
            return Err(PipelineError::RaggedColumns {
                column: bad.name.clone(),
                expected: rows,
                found: bad.len(),
            });
        }
        Ok(Self {
            column_origin: (0..columns.len()).collect(),
            columns,
            row_origin: (0..rows).collect(),
        })
    }

    /// Build a dataset from a header row and raw string rows.
    ///
    /// Short rows are padded with nulls; surplus cells are ignored.
    pub fn from_raw_rows<H, R, C>(headers: &[H], rows: R) -> Result<Self>
    where
        H: AsRef<str>,
        R: IntoIterator<Item = Vec<Option<C>>>,
        C: AsRef<str>,
    {
        let mut columns: Vec<Column> = headers
            .iter()
            .map(|h| Column::new(h.as_ref(), Vec::new()))
            .collect();

        for row in rows {
            let mut cells = row.into_iter();
            for column in columns.iter_mut() {
                let raw = cells.next().flatten();
                let raw: Option<&str> = raw.as_ref().map(|c| c.as_ref());
                column.values.push(CellValue::from_raw(raw));
            }
        }

        Self::new(columns)
    }

    pub fn row_count(&self) -> usize {
        self.row_origin.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Zero rows or zero columns.
    pub fn is_empty(&self) -> bool {
        self.row_count() == 0 || self.column_count() == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Look up a column, returning `ColumnNotFound` when absent.
    pub fn require_column(&self, name: &str) -> Result<&Column> {
        self.column(name)
            .ok_or_else(|| PipelineError::ColumnNotFound(name.to_string()))
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&CellValue> {
        self.columns.get(column).and_then(|c| c.values.get(row))
    }

    pub fn row(&self, row: usize) -> Vec<&CellValue> {
        self.columns
            .iter()
            .filter_map(|c| c.values.get(row))
            .collect()
    }

    /// Row position in the uploaded dataset for a current row.
    pub fn origin(&self, row: usize) -> usize {
        self.row_origin.get(row).copied().unwrap_or(row)
    }

    pub fn row_origins(&self) -> &[usize] {
        &self.row_origin
    }

    /// Column position in the uploaded dataset for a current column.
    pub fn source_position(&self, column: usize) -> usize {
        self.column_origin.get(column).copied().unwrap_or(column)
    }

    /// Current index of the column uploaded at `position`, if it survives.
    pub fn index_of_source(&self, position: usize) -> Option<usize> {
        self.column_origin.iter().position(|&p| p == position)
    }

    pub fn total_cells(&self) -> usize {
        self.row_count() * self.column_count()
    }

    pub fn total_missing(&self) -> usize {
        self.columns.iter().map(Column::missing_count).sum()
    }

    /// Indices of rows that repeat an earlier row across all columns.
    pub fn duplicate_rows(&self) -> Vec<usize> {
        let mut seen = HashSet::with_capacity(self.row_count());
        (0..self.row_count())
            .filter(|&row| !seen.insert(self.row_key(row)))
            .collect()
    }

    fn row_key(&self, row: usize) -> Vec<String> {
        self.columns
            .iter()
            .map(|c| c.values[row].equality_key())
            .collect()
    }

    // ---------------------------------------------------------------------
    // Working-copy mutation. Snapshots never hand out `&mut Dataset`.
    // ---------------------------------------------------------------------

    pub(crate) fn set_cell(&mut self, row: usize, column: usize, value: CellValue) {
        if let Some(cell) = self
            .columns
            .get_mut(column)
            .and_then(|c| c.values.get_mut(row))
        {
            *cell = value;
        }
    }

    pub(crate) fn rename_column(&mut self, index: usize, name: impl Into<String>) {
        if let Some(column) = self.columns.get_mut(index) {
            column.name = name.into();
        }
    }

    pub(crate) fn remove_column(&mut self, index: usize) -> Option<Column> {
        if index >= self.columns.len() {
            return None;
        }
        self.column_origin.remove(index);
        Some(self.columns.remove(index))
    }

    /// Remove several columns by current index.
    pub(crate) fn remove_columns(&mut self, indices: &[usize]) -> Vec<Column> {
        let mut sorted = indices.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        let mut removed: Vec<Column> = sorted
            .into_iter()
            .rev()
            .filter_map(|index| self.remove_column(index))
            .collect();
        removed.reverse();
        removed
    }

    /// Keep only rows where `keep[row]` is true.
    pub(crate) fn retain_rows(&mut self, keep: &[bool]) {
        for column in self.columns.iter_mut() {
            let mut flags = keep.iter();
            column
                .values
                .retain(|_| flags.next().copied().unwrap_or(true));
        }
        let mut flags = keep.iter();
        self.row_origin
            .retain(|_| flags.next().copied().unwrap_or(true));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        Dataset::from_raw_rows(
            &["id", "city"],
            vec![
                vec![Some("1"), Some("Paris")],
                vec![Some("2"), Some("")],
                vec![Some("1"), Some("Paris")],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_ragged_columns_rejected() {
        let result = Dataset::new(vec![
            Column::from_raw("a", [Some("1"), Some("2")]),
            Column::from_raw("b", [Some("1")]),
        ]);
        assert!(matches!(result, Err(PipelineError::RaggedColumns { .. })));
    }

    #[test]
    fn test_from_raw_rows_pads_short_rows() {
        let ds = Dataset::from_raw_rows(&["a", "b"], vec![vec![Some("x")]]).unwrap();
        assert_eq!(ds.row_count(), 1);
        assert_eq!(
            ds.cell(0, 1),
            Some(&CellValue::Missing(MissingKind::Null))
        );
    }

    #[test]
    fn test_shape_and_lookup() {
        let ds = sample();
        assert_eq!(ds.row_count(), 3);
        assert_eq!(ds.column_count(), 2);
        assert_eq!(ds.column_names(), vec!["id", "city"]);
        assert_eq!(ds.column_index("city"), Some(1));
        assert!(ds.require_column("zip").is_err());
        assert_eq!(ds.total_missing(), 1);
    }

    #[test]
    fn test_duplicate_rows() {
        assert_eq!(sample().duplicate_rows(), vec![2]);
    }

    #[test]
    fn test_retain_rows_tracks_origin() {
        let mut ds = sample();
        ds.retain_rows(&[true, false, true]);
        assert_eq!(ds.row_count(), 2);
        assert_eq!(ds.row_origins(), &[0, 2]);
        assert_eq!(ds.origin(1), 2);
    }

    #[test]
    fn test_removed_columns_keep_source_positions() {
        let mut ds = Dataset::from_raw_rows(
            &["year", "year", "city"],
            vec![vec![Some("2009"), Some("Paris"), Some("Oslo")]],
        )
        .unwrap();
        let removed = ds.remove_columns(&[0]);
        assert_eq!(removed[0].values, vec![CellValue::Numeric(2009.0)]);
        assert_eq!(ds.column_names(), vec!["year", "city"]);
        assert_eq!(ds.source_position(0), 1);
        assert_eq!(ds.source_position(1), 2);
        assert_eq!(ds.index_of_source(2), Some(1));
        assert_eq!(ds.index_of_source(0), None);
    }

    #[test]
    fn test_empty_dataset() {
        let no_rows = Dataset::from_raw_rows::<_, Vec<Vec<Option<&str>>>, &str>(&["a"], vec![])
            .unwrap();
        assert!(no_rows.is_empty());
        let no_columns = Dataset::new(vec![]).unwrap();
        assert!(no_columns.is_empty());
    }
}
