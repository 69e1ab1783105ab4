//! Shared statistical types.

use serde::{Deserialize, Serialize};

/// Logical type of a column, in tie-breaking priority order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Numeric,
    Date,
    Boolean,
    #[default]
    Text,
}

impl ColumnType {
    /// All types, highest priority first.
    pub const PRIORITY: [ColumnType; 4] = [
        ColumnType::Numeric,
        ColumnType::Date,
        ColumnType::Boolean,
        ColumnType::Text,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Date => "date",
            Self::Boolean => "boolean",
            Self::Text => "text",
        }
    }
}

/// Missing-value counts by category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingCounts {
    /// Absent values and null tokens (`N/A`, `null`, ...)
    pub null: usize,
    /// Empty strings
    pub empty: usize,
    /// Whitespace-only strings
    pub whitespace: usize,
}

impl MissingCounts {
    pub fn total(&self) -> usize {
        self.null + self.empty + self.whitespace
    }
}

/// Statistical signature of a single column.
///
/// Computed once by the profiler and attached to the analyzed snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStatistics {
    pub name: String,
    pub inferred_type: ColumnType,
    pub row_count: usize,
    pub missing: MissingCounts,
    /// Number of distinct non-missing values
    pub cardinality: usize,
    /// Distinct values divided by non-missing values
    pub distinct_ratio: f64,
    pub likely_identifier: bool,
    pub is_constant: bool,
    /// At least half of the cells are missing
    pub high_missing: bool,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub skew: Option<f64>,
    pub outlier_likely: bool,
    /// Most frequent value for non-numeric columns
    pub top_value: Option<String>,
    pub top_frequency: usize,
}

impl ColumnStatistics {
    pub fn missing_fraction(&self) -> f64 {
        if self.row_count == 0 {
            0.0
        } else {
            self.missing.total() as f64 / self.row_count as f64
        }
    }

    pub fn non_missing(&self) -> usize {
        self.row_count.saturating_sub(self.missing.total())
    }
}

/// Dataset-level profile: per-column statistics plus shape and duplicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetStatistics {
    pub row_count: usize,
    pub column_count: usize,
    /// Rows that repeat an earlier row
    pub duplicate_rows: usize,
    pub columns: Vec<ColumnStatistics>,
}

impl DatasetStatistics {
    pub fn column(&self, name: &str) -> Option<&ColumnStatistics> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Statistics of the column at `position` in the profiled dataset.
    pub fn column_at(&self, position: usize) -> Option<&ColumnStatistics> {
        self.columns.get(position)
    }

    pub fn total_missing(&self) -> usize {
        self.columns.iter().map(|c| c.missing.total()).sum()
    }

    pub fn duplicate_fraction(&self) -> f64 {
        if self.row_count == 0 {
            0.0
        } else {
            self.duplicate_rows as f64 / self.row_count as f64
        }
    }
}

/// One entry of the header-normalization mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderMapping {
    /// Column position in the uploaded file
    pub position: usize,
    pub original: String,
    pub normalized: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_type_priority_order() {
        let mut types = vec![ColumnType::Text, ColumnType::Boolean, ColumnType::Numeric];
        types.sort();
        assert_eq!(
            types,
            vec![ColumnType::Numeric, ColumnType::Boolean, ColumnType::Text]
        );
    }

    #[test]
    fn test_missing_counts_total() {
        let counts = MissingCounts {
            null: 2,
            empty: 1,
            whitespace: 3,
        };
        assert_eq!(counts.total(), 6);
    }

    #[test]
    fn test_column_type_serialization() {
        let json = serde_json::to_string(&ColumnType::Numeric).unwrap();
        assert_eq!(json, "\"numeric\"");
    }
}
