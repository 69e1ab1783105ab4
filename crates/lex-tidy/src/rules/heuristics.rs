//! Statistical heuristics: empty-column removal, imputation, outlier
//! clipping and scaling.

use super::RuleContext;
use crate::audit::Change;
use crate::config::{NumericImputation, ScalingMethod, TextImputation};
use crate::dataset::{CellValue, Column, Dataset};
use crate::error::{PipelineError, Result};
use crate::profiler::statistics;
use crate::types::ColumnType;
use tracing::debug;

/// Remove columns with no present value, unless nullable or required.
pub(super) fn drop_empty_columns(ctx: &RuleContext<'_>, data: &mut Dataset) -> Vec<Change> {
    let empty: Vec<usize> = (0..data.column_count())
        .filter(|&col| data.columns()[col].values.iter().all(CellValue::is_missing_like))
        .filter(|&col| {
            let names = ctx.names(data, col);
            !ctx.config.is_nullable(&names) && !ctx.config.is_required(&names)
        })
        .collect();

    data.remove_columns(&empty)
        .into_iter()
        .map(|column| {
            debug!(column = %column.name, "Dropped empty column");
            Change::column_removed(&column.name)
        })
        .collect()
}

/// Fill missing cells by column type. Nullable columns are left alone.
pub(super) fn impute_missing(ctx: &RuleContext<'_>, data: &mut Dataset) -> Vec<Change> {
    let mut changes = Vec::new();

    for col in 0..data.column_count() {
        if ctx.config.is_nullable(&ctx.names(data, col)) {
            continue;
        }
        let column = &data.columns()[col];
        let name = column.name.clone();
        if !column.values.iter().any(CellValue::is_missing_like) {
            continue;
        }

        let fills: Vec<(usize, CellValue)> = match ctx.effective_type(data, col) {
            ColumnType::Numeric => numeric_fill(ctx, column)
                .map(|v| fill_all(column, CellValue::Numeric(v)))
                .unwrap_or_default(),
            ColumnType::Text => fill_all(column, text_fill(ctx, column)),
            ColumnType::Boolean => boolean_fill(column)
                .map(|b| fill_all(column, CellValue::Boolean(b)))
                .unwrap_or_default(),
            ColumnType::Date => date_fill(column),
        };

        for (row, value) in fills {
            if let Some(before) = data.cell(row, col).cloned() {
                changes.push(Change::cell(&name, data.origin(row), before, value.clone()));
            }
            data.set_cell(row, col, value);
        }
    }

    changes
}

fn fill_all(column: &Column, value: CellValue) -> Vec<(usize, CellValue)> {
    column
        .values
        .iter()
        .enumerate()
        .filter(|(_, cell)| cell.is_missing_like())
        .map(|(row, _)| (row, value.clone()))
        .collect()
}

fn numeric_fill(ctx: &RuleContext<'_>, column: &Column) -> Option<f64> {
    let values = column.numeric_values();
    if values.is_empty() {
        return None;
    }
    match ctx.config.numeric_imputation {
        NumericImputation::Mean => statistics::mean(&values),
        NumericImputation::Median => statistics::median(&values),
        NumericImputation::Zero => Some(0.0),
    }
}

fn text_fill(ctx: &RuleContext<'_>, column: &Column) -> CellValue {
    let mode = match ctx.config.text_imputation {
        TextImputation::Constant => None,
        TextImputation::Mode => statistics::mode(
            column
                .values
                .iter()
                .filter(|cell| !cell.is_missing_like())
                .map(|cell| cell.to_string()),
        ),
    };
    CellValue::Text(mode.map_or_else(|| ctx.config.text_fill_value.clone(), |(value, _)| value))
}

fn boolean_fill(column: &Column) -> Option<bool> {
    let values = column.values.iter().filter_map(CellValue::as_bool);
    statistics::mode(values.map(|b| b.to_string())).map(|(mode, _)| mode == "true")
}

/// Forward-fill, then back-fill leading gaps.
fn date_fill(column: &Column) -> Vec<(usize, CellValue)> {
    let mut fills = Vec::new();
    let mut last = None;
    let mut leading = Vec::new();

    for (row, cell) in column.values.iter().enumerate() {
        if cell.is_missing_like() {
            match last {
                Some(date) => fills.push((row, CellValue::Date(date))),
                None => leading.push(row),
            }
        } else if let Some(date) = cell.as_date() {
            last = Some(date);
        }
    }

    let first = column
        .values
        .iter()
        .filter(|cell| !cell.is_missing_like())
        .find_map(CellValue::as_date);
    if let Some(first) = first {
        fills.extend(leading.into_iter().map(|row| (row, CellValue::Date(first))));
    }
    fills.sort_by_key(|(row, _)| *row);
    fills
}

/// Clip numeric columns into the configured envelope.
///
/// Integer-valued identifier columns (row IDs, codes) are left alone.
pub(super) fn clip_outliers(ctx: &RuleContext<'_>, data: &mut Dataset) -> Vec<Change> {
    let mut changes = Vec::new();

    for col in 0..data.column_count() {
        if ctx.effective_type(data, col) != ColumnType::Numeric || is_identifier(ctx, data, col) {
            continue;
        }
        let column = &data.columns()[col];
        let name = column.name.clone();

        let values = column.numeric_values();
        let Some((lower, upper)) = ctx.config.outlier_envelope(&values) else {
            continue;
        };

        let clipped: Vec<(usize, CellValue, f64)> = column
            .values
            .iter()
            .enumerate()
            .filter_map(|(row, cell)| match cell {
                CellValue::Numeric(v) if *v < lower => Some((row, cell.clone(), lower)),
                CellValue::Numeric(v) if *v > upper => Some((row, cell.clone(), upper)),
                _ => None,
            })
            .collect();

        if !clipped.is_empty() {
            debug!(column = %name, count = clipped.len(), lower, upper, "Clipping outliers");
        }
        for (row, before, bound) in clipped {
            let after = CellValue::Numeric(bound);
            changes.push(Change::cell(&name, data.origin(row), before, after.clone()));
            data.set_cell(row, col, after);
        }
    }

    changes
}

fn is_identifier(ctx: &RuleContext<'_>, data: &Dataset, col: usize) -> bool {
    ctx.column_stats(data, col)
        .is_some_and(|s| s.likely_identifier)
        && data.columns()[col]
            .numeric_values()
            .iter()
            .all(|v| v.fract() == 0.0)
}

/// Min-max or z-score scaling of configured columns.
pub(super) fn scale(
    rule_id: &str,
    ctx: &RuleContext<'_>,
    data: &mut Dataset,
) -> Result<Vec<Change>> {
    let mut changes = Vec::new();

    for key in &ctx.config.scaling.columns {
        let col = ctx.require(rule_id, data, key)?;
        let column = &data.columns()[col];
        let name = column.name.clone();

        let non_numeric = column
            .values
            .iter()
            .any(|cell| !cell.is_missing() && !matches!(cell, CellValue::Numeric(_)));
        if non_numeric || ctx.effective_type(data, col) != ColumnType::Numeric {
            return Err(PipelineError::rule(
                rule_id,
                &name,
                "scaling requires a numeric column",
            ));
        }

        let values = column.numeric_values();
        let transform: Box<dyn Fn(f64) -> f64> = match ctx.config.scaling.method {
            ScalingMethod::None => continue,
            ScalingMethod::MinMax => {
                let min = values.iter().copied().fold(f64::INFINITY, f64::min);
                let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let span = max - min;
                Box::new(move |v| if span > 0.0 { (v - min) / span } else { 0.0 })
            }
            ScalingMethod::ZScore => {
                let mean = statistics::mean(&values).unwrap_or(0.0);
                let std = statistics::calculate_std(&values);
                Box::new(move |v| if std > 0.0 { (v - mean) / std } else { 0.0 })
            }
        };

        let scaled: Vec<(usize, f64, f64)> = column
            .values
            .iter()
            .enumerate()
            .filter_map(|(row, cell)| match cell {
                CellValue::Numeric(v) => Some((row, *v, transform(*v))),
                _ => None,
            })
            .filter(|(_, before, after)| before != after)
            .collect();

        for (row, before, after) in scaled {
            changes.push(Change::cell(
                &name,
                data.origin(row),
                CellValue::Numeric(before),
                CellValue::Numeric(after),
            ));
            data.set_cell(row, col, CellValue::Numeric(after));
        }
    }

    Ok(changes)
}
