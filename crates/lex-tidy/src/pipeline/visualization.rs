//! Chart-ready summaries for the Visualization stage.
//!
//! Nothing here draws; hosts render these series however they like.

use crate::dataset::{AnalyzedDataset, CellValue, CleanedDataset, Column};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const HISTOGRAM_BINS: usize = 10;
const TOP_CATEGORIES: usize = 5;

/// Missing cells per column before and after cleaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingComparison {
    /// Header as uploaded
    pub original: String,
    /// Header after cleaning, `None` when the column was dropped
    pub cleaned: Option<String>,
    pub before: usize,
    pub after: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub column: String,
    pub bins: Vec<HistogramBin>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub value: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopCategories {
    pub column: String,
    pub categories: Vec<CategoryCount>,
}

/// Everything the Visualization stage produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualizationData {
    pub missing: Vec<MissingComparison>,
    pub histograms: Vec<Histogram>,
    pub top_categories: Vec<TopCategories>,
}

impl VisualizationData {
    /// Build chart data from the cleaned snapshot, taking "before" figures
    /// and identifier flags from the analyzed statistics.
    pub fn build(analyzed: &AnalyzedDataset, cleaned: &CleanedDataset) -> Self {
        let stats = analyzed.statistics();
        let data = cleaned.data();

        let missing = stats
            .columns
            .iter()
            .enumerate()
            .map(|(position, col)| {
                let index = data.index_of_source(position);
                MissingComparison {
                    original: col.name.clone(),
                    cleaned: index.map(|i| data.columns()[i].name.clone()),
                    before: col.missing.total(),
                    after: index.map(|i| data.columns()[i].missing_count()),
                }
            })
            .collect();

        let mut histograms = Vec::new();
        let mut top_categories = Vec::new();

        for (index, column) in data.columns().iter().enumerate() {
            if is_numeric(column) {
                histograms.push(Histogram {
                    column: column.name.clone(),
                    bins: histogram(&column.numeric_values()),
                });
                continue;
            }

            let identifier = stats
                .column_at(data.source_position(index))
                .is_some_and(|s| s.likely_identifier);
            if !identifier {
                let categories = top_values(column);
                if !categories.is_empty() {
                    top_categories.push(TopCategories {
                        column: column.name.clone(),
                        categories,
                    });
                }
            }
        }

        Self {
            missing,
            histograms,
            top_categories,
        }
    }
}

fn is_numeric(column: &Column) -> bool {
    let mut present = column.values.iter().filter(|v| !v.is_missing()).peekable();
    present.peek().is_some() && present.all(|v| matches!(v, CellValue::Numeric(_)))
}

/// Equal-width bins over `[min, max]`; the last bin is closed.
fn histogram(values: &[f64]) -> Vec<HistogramBin> {
    let Some((min, max)) = values.iter().fold(None, |acc: Option<(f64, f64)>, &v| {
        Some(acc.map_or((v, v), |(lo, hi)| (lo.min(v), hi.max(v))))
    }) else {
        return Vec::new();
    };

    if min == max {
        return vec![HistogramBin {
            lower: min,
            upper: max,
            count: values.len(),
        }];
    }

    let width = (max - min) / HISTOGRAM_BINS as f64;
    let mut bins: Vec<HistogramBin> = (0..HISTOGRAM_BINS)
        .map(|i| HistogramBin {
            lower: min + width * i as f64,
            upper: if i + 1 == HISTOGRAM_BINS {
                max
            } else {
                min + width * (i + 1) as f64
            },
            count: 0,
        })
        .collect();

    for &v in values {
        let index = (((v - min) / width) as usize).min(HISTOGRAM_BINS - 1);
        bins[index].count += 1;
    }
    bins
}

/// Most frequent display values, ties broken alphabetically.
fn top_values(column: &Column) -> Vec<CategoryCount> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for value in column.values.iter().filter(|v| !v.is_missing()) {
        *counts.entry(value.to_string()).or_default() += 1;
    }

    let mut categories: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(value, count)| CategoryCount { value, count })
        .collect();
    categories.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    categories.truncate(TOP_CATEGORIES);
    categories
}
