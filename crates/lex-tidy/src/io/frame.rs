//! Conversion between polars `DataFrame`s and [`Dataset`]s.

use crate::dataset::{CellValue, Column, Dataset};
use crate::error::Result;
use polars::prelude::{DataFrame, DataType, IntoColumn, NamedFrom, PlSmallStr, Series};

/// Build a dataset from a frame, typing every cell from its string form.
///
/// Columns that are not already strings are cast first, so numeric columns
/// from a typed frame keep their literal text.
pub fn dataset_from_frame(df: &DataFrame) -> Result<Dataset> {
    let mut columns = Vec::with_capacity(df.width());

    for column in df.get_columns() {
        let series = column.as_materialized_series().cast(&DataType::String)?;
        let values = series.str()?;
        columns.push(Column::from_raw(column.name().as_str(), values.into_iter()));
    }

    Dataset::new(columns)
}

/// Build a typed frame from a dataset.
///
/// A column becomes integer, float or boolean when every present cell has
/// that type; anything else is written as text. Missing cells become nulls.
pub fn dataset_to_frame(data: &Dataset) -> Result<DataFrame> {
    let columns = data
        .columns()
        .iter()
        .map(|column| column_to_series(column).into_column())
        .collect();
    Ok(DataFrame::new(columns)?)
}

fn column_to_series(column: &Column) -> Series {
    let name = PlSmallStr::from(column.name.as_str());
    let present = || column.values.iter().filter(|v| !v.is_missing());

    if present().all(|v| matches!(v, CellValue::Numeric(_))) && present().next().is_some() {
        let integral = present()
            .filter_map(CellValue::as_f64)
            .all(|v| v.fract() == 0.0 && v.abs() < i64::MAX as f64);
        if integral {
            let values: Vec<Option<i64>> = column
                .values
                .iter()
                .map(|v| v.as_f64().map(|f| f as i64))
                .collect();
            return Series::new(name, values);
        }
        let values: Vec<Option<f64>> = column.values.iter().map(CellValue::as_f64).collect();
        return Series::new(name, values);
    }

    if present().all(|v| matches!(v, CellValue::Boolean(_))) && present().next().is_some() {
        let values: Vec<Option<bool>> = column.values.iter().map(CellValue::as_bool).collect();
        return Series::new(name, values);
    }

    let values: Vec<Option<String>> = column
        .values
        .iter()
        .map(|v| (!v.is_missing()).then(|| v.to_string()))
        .collect();
    Series::new(name, values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::MissingKind;

    fn sample() -> Dataset {
        Dataset::from_raw_rows(
            &["id", "price", "flag", "name"],
            vec![
                vec![Some("1"), Some("9.5"), Some("true"), Some("Ann")],
                vec![Some("2"), None, Some("false"), Some("2020-01-02")],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_to_frame_types() {
        let df = dataset_to_frame(&sample()).unwrap();
        assert_eq!(df.shape(), (2, 4));
        assert_eq!(df.column("id").unwrap().dtype(), &DataType::Int64);
        assert_eq!(df.column("price").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("flag").unwrap().dtype(), &DataType::Boolean);
        assert_eq!(df.column("name").unwrap().dtype(), &DataType::String);
        assert_eq!(df.column("price").unwrap().null_count(), 1);
    }

    #[test]
    fn test_from_frame_keeps_literal_text() {
        let df = DataFrame::new(vec![
            Series::new("amount".into(), &["$1,200", "", "7"]).into_column(),
        ])
        .unwrap();
        let data = dataset_from_frame(&df).unwrap();
        assert_eq!(
            data.cell(0, 0),
            Some(&CellValue::Text("$1,200".to_string()))
        );
        assert_eq!(data.cell(1, 0), Some(&CellValue::Missing(MissingKind::Empty)));
        assert_eq!(data.cell(2, 0), Some(&CellValue::Numeric(7.0)));
    }
}
