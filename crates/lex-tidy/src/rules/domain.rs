//! Domain-constraint rules: configured value maps, numeric ranges, future dates.

use super::RuleContext;
use crate::audit::Change;
use crate::config::RangeAction;
use crate::dataset::{CellValue, Dataset, MissingKind};
use crate::error::Result;
use crate::profiler::statistics;
use tracing::debug;

/// Replace configured values, e.g. `M → Male`.
pub(super) fn categorical_mapping(
    rule_id: &str,
    ctx: &RuleContext<'_>,
    data: &mut Dataset,
) -> Result<Vec<Change>> {
    let mut changes = Vec::new();

    for (key, mapping) in &ctx.config.categorical_mapping {
        let col = ctx.require(rule_id, data, key)?;
        let rows = data.row_count();
        for row in 0..rows {
            let Some(cell) = data.cell(row, col) else {
                continue;
            };
            if cell.is_missing() {
                continue;
            }
            let rendered = cell.to_string();
            let Some(target) = mapping.get(rendered.trim()) else {
                continue;
            };
            let replacement = CellValue::from_raw(Some(target));
            if &replacement != cell {
                let name = &data.columns()[col].name;
                changes.push(Change::cell(
                    name,
                    data.origin(row),
                    cell.clone(),
                    replacement.clone(),
                ));
                data.set_cell(row, col, replacement);
            }
        }
    }

    Ok(changes)
}

/// Enforce configured min/max bounds.
pub(super) fn numeric_range(
    rule_id: &str,
    ctx: &RuleContext<'_>,
    data: &mut Dataset,
) -> Result<Vec<Change>> {
    let mut changes = Vec::new();

    for (key, range) in &ctx.config.ranges {
        let col = ctx.require(rule_id, data, key)?;
        let column = &data.columns()[col];
        let name = column.name.clone();

        let violations: Vec<(usize, f64)> = column
            .values
            .iter()
            .enumerate()
            .filter(|(_, cell)| !cell.is_missing_like())
            .filter_map(|(row, cell)| cell.as_f64().map(|v| (row, v)))
            .filter(|(_, v)| !range.contains(*v))
            .collect();

        if violations.is_empty() {
            continue;
        }
        debug!(column = %name, count = violations.len(), "Out-of-range values");

        if range.action == RangeAction::DropRow {
            let mut keep = vec![true; data.row_count()];
            for (row, _) in &violations {
                keep[*row] = false;
                let rendered = data.row(*row).iter().map(|c| c.to_string()).collect();
                changes.push(Change::row_removed(data.origin(*row), rendered));
            }
            data.retain_rows(&keep);
            continue;
        }

        let in_range: Vec<f64> = column
            .numeric_values()
            .into_iter()
            .filter(|v| range.contains(*v))
            .collect();
        let median = statistics::median(&in_range);

        for (row, value) in violations {
            let replacement = match range.action {
                RangeAction::Clip => CellValue::Numeric(range.clamp(value)),
                RangeAction::Null => CellValue::Missing(MissingKind::Null),
                RangeAction::Median => {
                    CellValue::Numeric(median.unwrap_or_else(|| range.clamp(value)))
                }
                RangeAction::DropRow => continue,
            };
            if let Some(before) = data.cell(row, col).cloned() {
                changes.push(Change::cell(
                    &name,
                    data.origin(row),
                    before,
                    replacement.clone(),
                ));
            }
            data.set_cell(row, col, replacement);
        }
    }

    Ok(changes)
}

/// Dates after today become missing.
pub(super) fn no_future_dates(ctx: &RuleContext<'_>, data: &mut Dataset) -> Vec<Change> {
    let mut changes = Vec::new();

    for col in 0..data.column_count() {
        if ctx.effective_type(data, col) != crate::types::ColumnType::Date {
            continue;
        }
        let name = data.columns()[col].name.clone();
        for row in 0..data.row_count() {
            let Some(cell) = data.cell(row, col) else {
                continue;
            };
            if cell.as_date().is_some_and(|d| d > ctx.today) {
                let missing = CellValue::Missing(MissingKind::Null);
                changes.push(Change::cell(
                    &name,
                    data.origin(row),
                    cell.clone(),
                    missing.clone(),
                ));
                data.set_cell(row, col, missing);
            }
        }
    }

    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CleaningConfig, RangeConstraint};
    use crate::error::PipelineError;
    use crate::rules::test_support::{context_parts, today};

    fn run<F>(config: &CleaningConfig, data: &mut Dataset, f: F) -> Result<Vec<Change>>
    where
        F: Fn(&RuleContext<'_>, &mut Dataset) -> Result<Vec<Change>>,
    {
        let (stats, plan) = context_parts(config, data);
        let ctx = RuleContext {
            config,
            statistics: &stats,
            header_plan: &plan,
            today: today(),
        };
        f(&ctx, data)
    }

    fn ages() -> Dataset {
        Dataset::from_raw_rows(
            &["age"],
            ["34", "-2", "41", "250", "29"]
                .iter()
                .map(|v| vec![Some(*v)])
                .collect::<Vec<_>>(),
        )
        .unwrap()
    }

    fn range_config(action: RangeAction) -> CleaningConfig {
        let range = RangeConstraint {
            action,
            ..RangeConstraint::new(Some(0.0), Some(120.0))
        };
        CleaningConfig::builder().range("age", range).build().unwrap()
    }

    // ==================== categorical mapping tests ====================

    #[test]
    fn test_categorical_mapping() {
        let config = CleaningConfig::builder()
            .map_value("sex", "M", "Male")
            .map_value("sex", "F", "Female")
            .build()
            .unwrap();
        let mut data = Dataset::from_raw_rows(
            &["sex"],
            vec![vec![Some("M")], vec![Some(" F ")], vec![Some("Male")]],
        )
        .unwrap();

        let changes = run(&config, &mut data, |ctx, d| {
            categorical_mapping("domain.categorical_mapping", ctx, d)
        })
        .unwrap();

        assert_eq!(changes.len(), 2);
        assert_eq!(data.cell(0, 0), Some(&CellValue::Text("Male".into())));
        assert_eq!(data.cell(1, 0), Some(&CellValue::Text("Female".into())));
    }

    #[test]
    fn test_categorical_mapping_unknown_column() {
        let config = CleaningConfig::builder()
            .map_value("gender", "M", "Male")
            .build()
            .unwrap();
        let mut data = ages();
        let result = run(&config, &mut data, |ctx, d| {
            categorical_mapping("domain.categorical_mapping", ctx, d)
        });
        assert!(matches!(result, Err(PipelineError::RuleApplication { .. })));
    }

    // ==================== numeric range tests ====================

    #[test]
    fn test_range_clip() {
        let config = range_config(RangeAction::Clip);
        let mut data = ages();
        let changes = run(&config, &mut data, |ctx, d| numeric_range("r", ctx, d)).unwrap();
        assert_eq!(changes.len(), 2);
        assert_eq!(data.cell(1, 0), Some(&CellValue::Numeric(0.0)));
        assert_eq!(data.cell(3, 0), Some(&CellValue::Numeric(120.0)));
    }

    #[test]
    fn test_range_null_and_median() {
        let mut data = ages();
        run(&range_config(RangeAction::Null), &mut data, |ctx, d| {
            numeric_range("r", ctx, d)
        })
        .unwrap();
        assert!(data.cell(1, 0).unwrap().is_missing());

        let mut data = ages();
        run(&range_config(RangeAction::Median), &mut data, |ctx, d| {
            numeric_range("r", ctx, d)
        })
        .unwrap();
        // median of 34, 41, 29
        assert_eq!(data.cell(3, 0), Some(&CellValue::Numeric(34.0)));
    }

    #[test]
    fn test_range_drop_row_records_raw_positions() {
        let mut data = ages();
        let changes = run(&range_config(RangeAction::DropRow), &mut data, |ctx, d| {
            numeric_range("r", ctx, d)
        })
        .unwrap();
        assert_eq!(data.row_count(), 3);
        let rows: Vec<usize> = changes.iter().flat_map(|c| c.rows.clone()).collect();
        assert_eq!(rows, vec![1, 3]);
        assert_eq!(data.row_origins(), &[0, 2, 4]);
    }

    // ==================== future date tests ====================

    #[test]
    fn test_future_dates_become_missing() {
        let config = CleaningConfig::builder()
            .no_future_dates(true)
            .build()
            .unwrap();
        let mut data = Dataset::from_raw_rows(
            &["released"],
            vec![vec![Some("2020-05-01")], vec![Some("2031-01-01")]],
        )
        .unwrap();
        let changes = run(&config, &mut data, |ctx, d| Ok(no_future_dates(ctx, d))).unwrap();
        assert_eq!(changes.len(), 1);
        assert!(data.cell(1, 0).unwrap().is_missing());
    }
}
