//! File ingestion and export.
//!
//! CSV goes through polars; spreadsheets go through calamine (read) and
//! rust_xlsxwriter (write) when the `excel` feature is enabled.

mod csv;
#[cfg(feature = "excel")]
mod excel;
mod frame;

pub use self::csv::{read_csv, write_csv};
#[cfg(feature = "excel")]
pub use excel::{read_excel, write_workbook};
pub use frame::{dataset_from_frame, dataset_to_frame};

use crate::audit::AuditTrail;
use crate::dataset::Dataset;
use crate::error::{PipelineError, Result};
use crate::validation::ValidationFinding;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Tabular file formats the pipeline reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataFormat {
    Csv,
    Excel,
}

impl DataFormat {
    /// Detect the format from a file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "csv" => Ok(Self::Csv),
            "xlsx" | "xls" | "xlsm" | "ods" if cfg!(feature = "excel") => Ok(Self::Excel),
            _ => Err(PipelineError::UnsupportedFormat(path.display().to_string())),
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Csv => "CSV",
            Self::Excel => "Excel",
        }
    }
}

/// Everything written by an export.
///
/// CSV exports carry only the cleaned data; workbooks add the raw data,
/// the validation findings and the applied corrections as extra sheets.
#[derive(Debug, Clone, Copy)]
pub struct ExportContents<'a> {
    pub cleaned: &'a Dataset,
    pub raw: &'a Dataset,
    pub findings: &'a [ValidationFinding],
    pub trail: &'a AuditTrail,
}

/// `<stem>_cleaned_data.<ext>`, keeping the source extension.
///
/// A source without an extension is exported as CSV. Spreadsheets are always
/// written as xlsx, so `.xls`, `.xlsm` and `.ods` sources export to `.xlsx`.
pub fn cleaned_file_name(source_name: &str) -> String {
    let path = Path::new(source_name);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("dataset");
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("csv");
    format!("{stem}_cleaned_data.{}", export_extension(extension))
}

fn export_extension(extension: &str) -> &str {
    match extension.to_ascii_lowercase().as_str() {
        "xls" | "xlsm" | "ods" => "xlsx",
        _ => extension,
    }
}

/// Path the cleaned file is exported to inside `output_dir`.
///
/// # Errors
///
/// Returns [`PipelineError::ExportBlocked`] if the path would overwrite the
/// source file.
pub fn export_path(source: &Path, output_dir: &Path) -> Result<PathBuf> {
    let source_name = source
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let target = output_dir.join(cleaned_file_name(source_name));

    if same_file(source, &target) {
        return Err(PipelineError::ExportBlocked(format!(
            "refusing to overwrite source file {}",
            source.display()
        )));
    }
    Ok(target)
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Read a dataset from a CSV or spreadsheet file.
pub fn read_dataset(path: &Path) -> Result<Dataset> {
    let format = DataFormat::from_path(path)?;
    info!("Reading {} file: {}", format.display_name(), path.display());

    match format {
        DataFormat::Csv => read_csv(path),
        #[cfg(feature = "excel")]
        DataFormat::Excel => read_excel(path),
        #[cfg(not(feature = "excel"))]
        DataFormat::Excel => Err(PipelineError::UnsupportedFormat(path.display().to_string())),
    }
}

/// Write an export to `path`, choosing the writer from its extension.
pub fn write_export(path: &Path, contents: ExportContents<'_>) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let format = DataFormat::from_path(path)?;
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    if format == DataFormat::Excel && !extension.eq_ignore_ascii_case("xlsx") {
        return Err(PipelineError::UnsupportedFormat(format!(
            "{} (workbooks are written as .xlsx)",
            path.display()
        )));
    }

    match format {
        DataFormat::Csv => write_csv(contents.cleaned, path),
        #[cfg(feature = "excel")]
        DataFormat::Excel => write_workbook(path, contents),
        #[cfg(not(feature = "excel"))]
        DataFormat::Excel => Err(PipelineError::UnsupportedFormat(path.display().to_string())),
    }?;

    info!("Exported cleaned dataset: {}", path.display());
    Ok(())
}
