//! Type-enforcement rules.

use super::RuleContext;
use crate::audit::Change;
use crate::dataset::{CellValue, Dataset, MissingKind};
use crate::error::{PipelineError, Result};
use crate::types::ColumnType;
use crate::utils::is_null_token;

/// Null tokens such as `N/A` become `Missing(Null)` in every column.
pub(super) fn null_tokens(data: &mut Dataset) -> Vec<Change> {
    let mut changes = Vec::new();

    for col in 0..data.column_count() {
        for row in 0..data.row_count() {
            let Some(cell) = data.cell(row, col) else {
                continue;
            };
            if cell.as_text().is_some_and(is_null_token) {
                let missing = CellValue::Missing(MissingKind::Null);
                changes.push(Change::cell(
                    &data.columns()[col].name,
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

/// Coerce every column whose effective type is `target`.
///
/// Values that cannot be converted become `Missing(Null)` so imputation can
/// fill them. A configured expected type that no value satisfies is an error.
pub(super) fn coerce(
    rule_id: &str,
    ctx: &RuleContext<'_>,
    data: &mut Dataset,
    target: ColumnType,
) -> Result<Vec<Change>> {
    for (key, _) in ctx
        .config
        .expected_types
        .iter()
        .filter(|(_, t)| **t == target)
    {
        ctx.require(rule_id, data, key)?;
    }

    let mut changes = Vec::new();

    for col in 0..data.column_count() {
        if ctx.effective_type(data, col) != target {
            continue;
        }
        let name = data.columns()[col].name.clone();

        let mut converted = Vec::new();
        let mut parsed = 0usize;
        let mut present = 0usize;
        for (row, cell) in data.columns()[col].values.iter().enumerate() {
            if cell.is_missing() {
                continue;
            }
            present += 1;
            let typed = convert(cell, target);
            if typed.is_some() {
                parsed += 1;
            }
            let replacement = typed.unwrap_or(CellValue::Missing(MissingKind::Null));
            if &replacement != cell {
                converted.push((row, cell.clone(), replacement));
            }
        }

        let names = ctx.names(data, col);
        let configured = ctx
            .config
            .expected_types
            .keys()
            .any(|k| names.contains(&k.as_str()));
        if configured && present > 0 && parsed == 0 {
            return Err(PipelineError::rule(
                rule_id,
                &name,
                format!("no value parses as {}", target.display_name()),
            ));
        }

        for (row, before, after) in converted {
            changes.push(Change::cell(&name, data.origin(row), before, after.clone()));
            data.set_cell(row, col, after);
        }
    }

    Ok(changes)
}

fn convert(cell: &CellValue, target: ColumnType) -> Option<CellValue> {
    match target {
        ColumnType::Numeric => cell.as_f64().map(CellValue::Numeric),
        ColumnType::Date => cell.as_date().map(CellValue::Date),
        ColumnType::Boolean => cell.as_bool().map(CellValue::Boolean),
        ColumnType::Text => Some(cell.clone()),
    }
}
