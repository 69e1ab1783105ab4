//! Statistical profiling of datasets.
//!
//! The profiler is read-only: it computes one [`ColumnStatistics`] per column
//! plus dataset-level shape and duplicate counts, and never mutates its input.

pub mod statistics;
mod type_inference;

pub use type_inference::infer_column_type;

use crate::config::CleaningConfig;
use crate::dataset::{CellValue, Column, Dataset, MissingKind};
use crate::error::{PipelineError, Result};
use crate::types::{ColumnStatistics, ColumnType, DatasetStatistics, MissingCounts};
use std::collections::HashSet;
use tracing::{debug, info};

/// Computes per-column statistical signatures.
#[derive(Debug, Clone, Copy)]
pub struct StatisticalProfiler {
    identifier_ratio: f64,
    skew_threshold: f64,
}

impl Default for StatisticalProfiler {
    fn default() -> Self {
        Self::from_config(&CleaningConfig::default())
    }
}

impl StatisticalProfiler {
    pub fn from_config(config: &CleaningConfig) -> Self {
        Self {
            identifier_ratio: config.identifier_ratio,
            skew_threshold: config.skew_threshold,
        }
    }

    /// Profile every column of the dataset.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::EmptyDataset`] if the dataset has zero rows or
    /// zero columns.
    pub fn profile(&self, dataset: &Dataset) -> Result<DatasetStatistics> {
        if dataset.is_empty() {
            return Err(PipelineError::EmptyDataset {
                rows: dataset.row_count(),
                columns: dataset.column_count(),
            });
        }

        info!(
            "Profiling dataset: {} rows x {} columns",
            dataset.row_count(),
            dataset.column_count()
        );

        let columns: Vec<ColumnStatistics> = dataset
            .columns()
            .iter()
            .map(|column| self.profile_column(column))
            .collect();

        let duplicate_rows = dataset.duplicate_rows().len();
        debug!("Found {} duplicate rows", duplicate_rows);

        Ok(DatasetStatistics {
            row_count: dataset.row_count(),
            column_count: dataset.column_count(),
            duplicate_rows,
            columns,
        })
    }

    /// Profile a single column.
    pub fn profile_column(&self, column: &Column) -> ColumnStatistics {
        let row_count = column.len();
        let missing = count_missing(&column.values);
        let inferred_type = infer_column_type(column);

        let present: Vec<&CellValue> = column
            .values
            .iter()
            .filter(|cell| !cell.is_missing_like())
            .collect();

        let distinct: HashSet<String> = present.iter().map(|cell| cell.to_string()).collect();
        let cardinality = distinct.len();
        let distinct_ratio = if present.is_empty() {
            0.0
        } else {
            cardinality as f64 / present.len() as f64
        };
        let likely_identifier = present.len() > 1 && distinct_ratio >= self.identifier_ratio;

        let mut stats = ColumnStatistics {
            name: column.name.clone(),
            inferred_type,
            row_count,
            missing,
            cardinality,
            distinct_ratio,
            likely_identifier,
            is_constant: cardinality == 1,
            high_missing: row_count > 0 && missing.total() * 2 >= row_count,
            mean: None,
            median: None,
            std: None,
            min: None,
            max: None,
            skew: None,
            outlier_likely: false,
            top_value: None,
            top_frequency: 0,
        };

        if inferred_type == ColumnType::Numeric {
            let values: Vec<f64> = present.iter().filter_map(|cell| cell.as_f64()).collect();
            if !values.is_empty() {
                let skew = statistics::calculate_skewness(&values);
                stats.mean = statistics::mean(&values);
                stats.median = statistics::median(&values);
                stats.std = Some(statistics::calculate_std(&values));
                stats.min = values.iter().copied().reduce(f64::min);
                stats.max = values.iter().copied().reduce(f64::max);
                stats.skew = Some(skew);
                stats.outlier_likely = skew.abs() > self.skew_threshold;
            }
        } else if let Some((value, count)) =
            statistics::mode(present.iter().map(|cell| cell.to_string()))
        {
            stats.top_value = Some(value);
            stats.top_frequency = count;
        }

        debug!(
            column = %stats.name,
            inferred_type = stats.inferred_type.display_name(),
            missing = stats.missing.total(),
            cardinality = stats.cardinality,
            "Profiled column"
        );

        stats
    }
}

fn count_missing(values: &[CellValue]) -> MissingCounts {
    let mut counts = MissingCounts::default();
    for kind in values.iter().filter_map(CellValue::missing_kind) {
        match kind {
            MissingKind::Null => counts.null += 1,
            MissingKind::Empty => counts.empty += 1,
            MissingKind::Whitespace => counts.whitespace += 1,
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Dataset {
        Dataset::from_raw_rows(
            &["id", "price", "city", "notes"],
            vec![
                vec![Some("1"), Some("10"), Some("Paris"), Some("")],
                vec![Some("2"), Some("$12"), Some("Paris"), Some("  ")],
                vec![Some("3"), Some("N/A"), Some("Rome"), None],
                vec![Some("4"), Some("11"), Some("Paris"), Some("ok")],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_empty_dataset_error() {
        let profiler = StatisticalProfiler::default();
        let no_columns = Dataset::new(vec![]).unwrap();
        let result = profiler.profile(&no_columns);
        assert!(matches!(result, Err(PipelineError::EmptyDataset { .. })));

        let no_rows =
            Dataset::from_raw_rows::<_, Vec<Vec<Option<&str>>>, &str>(&["a"], vec![]).unwrap();
        assert!(matches!(
            profiler.profile(&no_rows),
            Err(PipelineError::EmptyDataset { rows: 0, columns: 1 })
        ));
    }

    #[test]
    fn test_profile_does_not_mutate() {
        let ds = dataset();
        let before = ds.clone();
        StatisticalProfiler::default().profile(&ds).unwrap();
        assert_eq!(ds, before);
    }

    #[test]
    fn test_missing_by_category() {
        let stats = StatisticalProfiler::default().profile(&dataset()).unwrap();
        let notes = stats.column("notes").unwrap();
        assert_eq!(notes.missing.empty, 1);
        assert_eq!(notes.missing.whitespace, 1);
        assert_eq!(notes.missing.null, 1);
        assert!(notes.high_missing);

        let price = stats.column("price").unwrap();
        assert_eq!(price.missing.null, 1);
    }

    #[test]
    fn test_numeric_statistics() {
        let stats = StatisticalProfiler::default().profile(&dataset()).unwrap();
        let price = stats.column("price").unwrap();
        assert_eq!(price.inferred_type, ColumnType::Numeric);
        assert_eq!(price.mean, Some(11.0));
        assert_eq!(price.median, Some(11.0));
        assert_eq!(price.min, Some(10.0));
        assert_eq!(price.max, Some(12.0));
        assert!(!price.outlier_likely);
    }

    #[test]
    fn test_identifier_flag() {
        let stats = StatisticalProfiler::default().profile(&dataset()).unwrap();
        assert!(stats.column("id").unwrap().likely_identifier);
        assert!(!stats.column("city").unwrap().likely_identifier);
    }

    #[test]
    fn test_text_mode() {
        let stats = StatisticalProfiler::default().profile(&dataset()).unwrap();
        let city = stats.column("city").unwrap();
        assert_eq!(city.inferred_type, ColumnType::Text);
        assert_eq!(city.top_value.as_deref(), Some("Paris"));
        assert_eq!(city.top_frequency, 3);
        assert_eq!(city.cardinality, 2);
    }

    #[test]
    fn test_outlier_flag_uses_skew_threshold() {
        let ds = Dataset::from_raw_rows(
            &["v"],
            ["1", "1", "1", "2", "2", "3", "50"]
                .iter()
                .map(|v| vec![Some(*v)])
                .collect::<Vec<_>>(),
        )
        .unwrap();
        let stats = StatisticalProfiler::default().profile(&ds).unwrap();
        assert!(stats.columns[0].outlier_likely);
    }

    #[test]
    fn test_duplicate_rows_counted() {
        let ds = Dataset::from_raw_rows(
            &["a", "b"],
            vec![
                vec![Some("1"), Some("x")],
                vec![Some("1"), Some("x")],
                vec![Some("2"), Some("y")],
            ],
        )
        .unwrap();
        let stats = StatisticalProfiler::default().profile(&ds).unwrap();
        assert_eq!(stats.duplicate_rows, 1);
    }
}
