//! Spreadsheet import (calamine) and workbook export (rust_xlsxwriter).

use super::ExportContents;
use crate::audit::AuditTrail;
use crate::dataset::{CellValue, Dataset};
use crate::error::{PipelineError, Result};
use crate::validation::ValidationFinding;
use calamine::{Data, Reader, open_workbook_auto};
use chrono::Datelike;
use rust_xlsxwriter::{ExcelDateTime, Format, Table, TableColumn, Workbook, Worksheet};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

const MAX_ROWS: usize = 1_048_575;
const MAX_COLUMNS: usize = 16_384;

/// Read the first worksheet, using its first row as the header.
pub fn read_excel(path: &Path) -> Result<Dataset> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| PipelineError::Excel(format!("{} has no worksheets", path.display())))??;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .unwrap_or_default();

    let body: Vec<Vec<Option<String>>> = rows
        .map(|row| row.iter().map(cell_text).collect())
        .collect();

    debug!(rows = body.len(), columns = headers.len(), "Loaded worksheet");
    Dataset::from_raw_rows(&headers, body)
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::DateTime(value) => value.as_datetime().map(|dt| {
            if dt.time() == chrono::NaiveTime::MIN {
                dt.date().format("%Y-%m-%d").to_string()
            } else {
                dt.format("%Y-%m-%d %H:%M:%S").to_string()
            }
        }),
        other => Some(other.to_string()),
    }
}

/// Write a cleaned-data workbook.
///
/// Sheets: `Clean_Data`, `Raw_Data`, `Validation_Report` and
/// `Corrections_Applied`. Each sheet has a frozen header row, a table over
/// its data and autofitted columns.
pub fn write_workbook(path: &Path, contents: ExportContents<'_>) -> Result<()> {
    let mut workbook = Workbook::new();

    write_dataset_sheet(workbook.add_worksheet(), "Clean_Data", contents.cleaned)?;
    write_dataset_sheet(workbook.add_worksheet(), "Raw_Data", contents.raw)?;
    write_findings_sheet(workbook.add_worksheet(), contents.findings)?;
    write_corrections_sheet(workbook.add_worksheet(), contents.trail)?;

    workbook.save(path)?;
    Ok(())
}

fn write_dataset_sheet(sheet: &mut Worksheet, name: &str, data: &Dataset) -> Result<()> {
    if data.row_count() > MAX_ROWS || data.column_count() > MAX_COLUMNS {
        return Err(PipelineError::Excel(format!(
            "{} rows x {} columns exceeds worksheet limits",
            data.row_count(),
            data.column_count()
        )));
    }

    sheet.set_name(name)?;
    let date_format = Format::new().set_num_format("yyyy-mm-dd");

    for (col, column) in data.columns().iter().enumerate() {
        let col = col as u16;
        sheet.write_string(0, col, &column.name)?;

        for (row, value) in column.values.iter().enumerate() {
            let row = row as u32 + 1;
            match value {
                CellValue::Numeric(v) => {
                    sheet.write_number(row, col, *v)?;
                }
                CellValue::Boolean(b) => {
                    sheet.write_boolean(row, col, *b)?;
                }
                CellValue::Date(d) => {
                    let date =
                        ExcelDateTime::from_ymd(d.year() as u16, d.month() as u8, d.day() as u8)?;
                    sheet.write_datetime_with_format(row, col, &date, &date_format)?;
                }
                CellValue::Text(s) => {
                    sheet.write_string(row, col, s)?;
                }
                CellValue::Missing(_) => {}
            }
        }
    }

    let headers: Vec<&str> = data.column_names();
    finish_sheet(sheet, &headers, data.row_count())
}

fn write_findings_sheet(sheet: &mut Worksheet, findings: &[ValidationFinding]) -> Result<()> {
    const HEADERS: [&str; 5] = ["Check", "Severity", "Column", "Rows", "Description"];

    sheet.set_name("Validation_Report")?;
    write_header(sheet, &HEADERS)?;

    for (i, finding) in findings.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, finding.check.display_name())?;
        sheet.write_string(row, 1, finding.severity.display_name())?;
        sheet.write_string(row, 2, finding.column.as_deref().unwrap_or_default())?;
        sheet.write_string(row, 3, join_rows(&finding.rows))?;
        sheet.write_string(row, 4, &finding.description)?;
    }

    finish_sheet(sheet, &HEADERS, findings.len())
}

fn write_corrections_sheet(sheet: &mut Worksheet, trail: &AuditTrail) -> Result<()> {
    const HEADERS: [&str; 8] = [
        "Sequence", "Rule", "Tier", "Change", "Column", "Rows", "Before", "After",
    ];

    sheet.set_name("Corrections_Applied")?;
    write_header(sheet, &HEADERS)?;

    for (i, record) in trail.records().iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_number(row, 0, record.sequence as f64)?;
        sheet.write_string(row, 1, &record.rule_id)?;
        sheet.write_string(row, 2, record.tier.display_name())?;
        sheet.write_string(row, 3, record.kind.display_name())?;
        sheet.write_string(row, 4, record.column.as_deref().unwrap_or_default())?;
        sheet.write_string(row, 5, join_rows(&record.rows))?;
        sheet.write_string(row, 6, record.before.to_string())?;
        sheet.write_string(row, 7, record.after.to_string())?;
    }

    finish_sheet(sheet, &HEADERS, trail.len())
}

fn write_header(sheet: &mut Worksheet, headers: &[&str]) -> Result<()> {
    for (col, header) in headers.iter().enumerate() {
        sheet.write_string(0, col as u16, *header)?;
    }
    Ok(())
}

/// Freeze the header, add a table over the data and autofit.
///
/// Tables need unique, non-empty headers; raw sheets that break this are
/// written without one.
fn finish_sheet(sheet: &mut Worksheet, headers: &[&str], rows: usize) -> Result<()> {
    sheet.set_freeze_panes(1, 0)?;

    let distinct: HashSet<String> = headers.iter().map(|h| h.to_lowercase()).collect();
    let tabular = distinct.len() == headers.len() && headers.iter().all(|h| !h.trim().is_empty());

    if rows > 0 && !headers.is_empty() && tabular {
        let columns: Vec<TableColumn> = headers
            .iter()
            .map(|h| TableColumn::new().set_header(*h))
            .collect();
        let table = Table::new().set_columns(&columns);
        sheet.add_table(0, 0, rows as u32, headers.len() as u16 - 1, &table)?;
    }

    sheet.autofit();
    Ok(())
}

fn join_rows(rows: &[usize]) -> String {
    rows.iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
