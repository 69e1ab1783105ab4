//! Cosmetic standardization: text cleanup, case, constant columns, headers
//! and duplicate rows.

use super::{RuleContext, RuleOutput};
use crate::audit::Change;
use crate::config::TextCase;
use crate::dataset::{CellValue, Dataset, MissingKind};
use crate::types::{ColumnType, HeaderMapping};
use crate::utils::{collapse_whitespace, sentence_case, strip_wrapping_quotes, title_case};
use std::collections::HashSet;
use tracing::debug;

/// Trim, strip wrapping quotes and collapse inner whitespace in text cells.
pub(super) fn sanitize_text(data: &mut Dataset) -> Vec<Change> {
    let mut changes = Vec::new();

    for col in 0..data.column_count() {
        for row in 0..data.row_count() {
            let Some(CellValue::Text(text)) = data.cell(row, col) else {
                continue;
            };
            let cleaned = collapse_whitespace(strip_wrapping_quotes(text.trim()));
            if cleaned == *text {
                continue;
            }
            let after = if cleaned.is_empty() {
                CellValue::Missing(MissingKind::Empty)
            } else {
                CellValue::Text(cleaned)
            };
            changes.push(Change::cell(
                &data.columns()[col].name,
                data.origin(row),
                CellValue::Text(text.clone()),
                after.clone(),
            ));
            data.set_cell(row, col, after);
        }
    }

    changes
}

/// Apply the configured case to text columns.
pub(super) fn normalize_case(ctx: &RuleContext<'_>, data: &mut Dataset) -> Vec<Change> {
    let convert: fn(&str) -> String = match ctx.config.text_case {
        TextCase::Preserve => return Vec::new(),
        TextCase::Lower => str::to_lowercase,
        TextCase::Upper => str::to_uppercase,
        TextCase::Title => title_case,
        TextCase::Sentence => sentence_case,
    };

    let mut changes = Vec::new();
    for col in 0..data.column_count() {
        if ctx.effective_type(data, col) != ColumnType::Text {
            continue;
        }
        let name = data.columns()[col].name.clone();
        for row in 0..data.row_count() {
            let Some(CellValue::Text(text)) = data.cell(row, col) else {
                continue;
            };
            let converted = convert(text);
            if converted != *text {
                let before = CellValue::Text(text.clone());
                let after = CellValue::Text(converted);
                changes.push(Change::cell(&name, data.origin(row), before, after.clone()));
                data.set_cell(row, col, after);
            }
        }
    }
    changes
}

/// Remove columns with at most one distinct present value. Required columns stay.
pub(super) fn drop_constant_columns(ctx: &RuleContext<'_>, data: &mut Dataset) -> Vec<Change> {
    let constant: Vec<usize> = (0..data.column_count())
        .filter(|&col| !ctx.config.is_required(&ctx.names(data, col)))
        .filter(|&col| {
            let distinct: HashSet<String> = data.columns()[col]
                .values
                .iter()
                .filter(|v| !v.is_missing_like())
                .map(CellValue::equality_key)
                .collect();
            distinct.len() <= 1
        })
        .collect();

    data.remove_columns(&constant)
        .into_iter()
        .map(|column| {
            debug!(column = %column.name, "Dropped constant column");
            Change::column_removed(&column.name)
        })
        .collect()
}

/// Rename surviving columns according to the header plan.
pub(super) fn normalize_headers(ctx: &RuleContext<'_>, data: &mut Dataset) -> RuleOutput {
    let mut changes = Vec::new();
    let mut mapping = Vec::with_capacity(data.column_count());

    for index in 0..data.column_count() {
        let [original, normalized] = ctx.names(data, index).map(str::to_string);
        if normalized != original {
            changes.push(Change::header_renamed(&original, &normalized));
            data.rename_column(index, normalized.clone());
        }
        mapping.push(HeaderMapping {
            position: data.source_position(index),
            original,
            normalized,
        });
    }

    RuleOutput {
        changes,
        header_mapping: Some(mapping),
    }
}

/// Remove rows equal to an earlier row across every column.
pub(super) fn dedupe_rows(data: &mut Dataset) -> Vec<Change> {
    let duplicates = data.duplicate_rows();
    if duplicates.is_empty() {
        return Vec::new();
    }

    let mut keep = vec![true; data.row_count()];
    let changes = duplicates
        .iter()
        .map(|&row| {
            keep[row] = false;
            let cells = data.row(row).iter().map(|c| c.to_string()).collect();
            Change::row_removed(data.origin(row), cells)
        })
        .collect();

    data.retain_rows(&keep);
    debug!("Removed {} duplicate rows", duplicates.len());
    changes
}
