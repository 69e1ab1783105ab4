//! CSV reading and writing through polars.

use super::frame::{dataset_from_frame, dataset_to_frame};
use crate::dataset::Dataset;
use crate::error::{Result, ResultExt};
use once_cell::sync::Lazy;
use polars::prelude::{CsvParseOptions, CsvReadOptions, CsvWriter, SerReader, SerWriter};
use regex::Regex;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// Suffix polars gives repeated header names.
static POLARS_DUPLICATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+)_duplicated_(\d+)$").expect("Invalid regex: polars duplicate"));

/// Read a CSV file with every column as text.
///
/// Schema inference is disabled and empty fields stay empty strings, so the
/// dataset sees exactly what the file contains.
pub fn read_csv(path: &Path) -> Result<Dataset> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .with_parse_options(
            CsvParseOptions::default()
                .with_missing_is_null(false)
                .with_quote_char(Some(b'"')),
        )
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .context(format!("Failed to open {}", path.display()))?
        .finish()
        .context(format!("Failed to parse {}", path.display()))?;

    debug!(rows = df.height(), columns = df.width(), "Loaded CSV");

    let mut data = dataset_from_frame(&df)?;
    restore_duplicate_headers(&mut data);
    Ok(data)
}

/// Write the dataset as CSV with a header row.
pub fn write_csv(data: &Dataset, path: &Path) -> Result<()> {
    let mut df = dataset_to_frame(data)?;
    let mut file = File::create(path).context(format!("Failed to create {}", path.display()))?;

    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b',')
        .with_quote_char(b'"')
        .finish(&mut df)
        .context(format!("Failed to write {}", path.display()))?;

    Ok(())
}

/// Rename `name_duplicated_N` back to `name.{N+1}`, the numbering the header
/// normalizer expects for repeated columns.
fn restore_duplicate_headers(data: &mut Dataset) {
    let renames: Vec<(usize, String)> = data
        .column_names()
        .iter()
        .enumerate()
        .filter_map(|(index, name)| {
            let caps = POLARS_DUPLICATE.captures(name)?;
            let base = &caps[1];
            let n: usize = caps[2].parse().ok()?;
            data.column(base).map(|_| (index, format!("{base}.{}", n + 1)))
        })
        .collect();

    for (index, name) in renames {
        data.rename_column(index, name);
    }
}
