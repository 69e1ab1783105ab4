//! Immutable lifecycle snapshots.
//!
//! Each snapshot is produced exactly once by its stage and only exposes
//! shared references afterwards. The analyzed snapshot shares the raw data
//! through an `Arc`, so attaching statistics never copies or touches it.

use super::Dataset;
use crate::types::{DatasetStatistics, HeaderMapping};
use std::sync::Arc;

/// The dataset as uploaded, with its original headers.
#[derive(Debug, Clone)]
pub struct RawDataset {
    source_name: String,
    data: Arc<Dataset>,
}

impl RawDataset {
    pub fn new(source_name: impl Into<String>, data: Dataset) -> Self {
        Self {
            source_name: source_name.into(),
            data: Arc::new(data),
        }
    }

    /// File name (or label) the dataset was uploaded as.
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn data(&self) -> &Dataset {
        &self.data
    }

    pub(crate) fn shared(&self) -> Arc<Dataset> {
        Arc::clone(&self.data)
    }
}

/// Raw data plus the statistics computed from it.
#[derive(Debug, Clone)]
pub struct AnalyzedDataset {
    data: Arc<Dataset>,
    statistics: Arc<DatasetStatistics>,
}

impl AnalyzedDataset {
    pub(crate) fn new(data: Arc<Dataset>, statistics: DatasetStatistics) -> Self {
        Self {
            data,
            statistics: Arc::new(statistics),
        }
    }

    pub fn data(&self) -> &Dataset {
        &self.data
    }

    pub fn statistics(&self) -> &DatasetStatistics {
        &self.statistics
    }
}

/// Output of rule application, with normalized headers.
#[derive(Debug, Clone)]
pub struct CleanedDataset {
    data: Arc<Dataset>,
    header_mapping: Vec<HeaderMapping>,
}

impl CleanedDataset {
    pub(crate) fn new(data: Dataset, header_mapping: Vec<HeaderMapping>) -> Self {
        Self {
            data: Arc::new(data),
            header_mapping,
        }
    }

    pub fn data(&self) -> &Dataset {
        &self.data
    }

    /// Old → new header names, in original column order.
    pub fn header_mapping(&self) -> &[HeaderMapping] {
        &self.header_mapping
    }

    /// Header mapping entry of the cleaned column at `index`.
    pub fn mapping_at(&self, index: usize) -> Option<&HeaderMapping> {
        let position = self.data.source_position(index);
        self.header_mapping.iter().find(|m| m.position == position)
    }

    /// Header the cleaned column at `index` had before normalization.
    pub fn original_name(&self, index: usize) -> Option<&str> {
        self.mapping_at(index).map(|m| m.original.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyzed_shares_raw_data() {
        let data = Dataset::from_raw_rows(&["a"], vec![vec![Some("1")]]).unwrap();
        let raw = RawDataset::new("a.csv", data);
        let stats = DatasetStatistics {
            row_count: 1,
            column_count: 1,
            duplicate_rows: 0,
            columns: vec![],
        };
        let analyzed = AnalyzedDataset::new(raw.shared(), stats);
        assert!(std::ptr::eq(raw.data(), analyzed.data()));
        assert_eq!(raw.source_name(), "a.csv");
    }

    #[test]
    fn test_original_name_keyed_by_position() {
        let mut data = Dataset::from_raw_rows(
            &["year", "Year (2)"],
            vec![vec![Some("2009"), Some("Paris")]],
        )
        .unwrap();
        data.rename_column(0, "Year");
        let mapping = vec![
            HeaderMapping {
                position: 0,
                original: "year".to_string(),
                normalized: "Year".to_string(),
            },
            HeaderMapping {
                position: 1,
                original: "year".to_string(),
                normalized: "Year (2)".to_string(),
            },
        ];
        let cleaned = CleanedDataset::new(data, mapping);
        assert_eq!(cleaned.original_name(0), Some("year"));
        assert_eq!(cleaned.original_name(1), Some("year"));
        assert_eq!(cleaned.mapping_at(1).map(|m| m.normalized.as_str()), Some("Year (2)"));
        assert_eq!(cleaned.original_name(2), None);
    }
}
