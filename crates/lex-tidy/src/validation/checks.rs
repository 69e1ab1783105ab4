//! Individual validation checks.

use super::{CheckKind, Severity, ValidationFinding};
use crate::config::{CleaningConfig, lookup};
use crate::dataset::{CellValue, CleanedDataset, Column, Dataset};
use crate::profiler::{infer_column_type, statistics};
use crate::types::{ColumnStatistics, ColumnType, DatasetStatistics};
use std::cmp::Ordering;

pub(super) struct CheckContext<'a> {
    pub config: &'a CleaningConfig,
    pub cleaned: &'a CleanedDataset,
    pub baseline: Option<&'a DatasetStatistics>,
}

impl<'a> CheckContext<'a> {
    fn data(&self) -> &'a Dataset {
        self.cleaned.data()
    }

    /// Cleaned and original names of the cleaned column at `col`.
    fn names(&self, col: usize) -> [&'a str; 2] {
        let name = self.data().columns()[col].name.as_str();
        [name, self.cleaned.original_name(col).unwrap_or(name)]
    }

    fn find(&self, key: &str) -> Option<&'a Column> {
        (0..self.data().column_count())
            .find(|&col| self.names(col).contains(&key))
            .map(|col| &self.data().columns()[col])
    }

    fn baseline_stats(&self, col: usize) -> Option<&'a ColumnStatistics> {
        let position = self.data().source_position(col);
        self.baseline.and_then(|b| b.column_at(position))
    }

    /// Expected type if configured, else the analyzed type, else inferred now.
    fn column_type(&self, col: usize) -> ColumnType {
        lookup(&self.config.expected_types, &self.names(col))
            .copied()
            .or_else(|| self.baseline_stats(col).map(|s| s.inferred_type))
            .unwrap_or_else(|| infer_column_type(&self.data().columns()[col]))
    }

    fn origins(&self, rows: impl IntoIterator<Item = usize>) -> Vec<usize> {
        let data = self.data();
        rows.into_iter().map(|row| data.origin(row)).collect()
    }
}

fn rows_where(column: &Column, predicate: impl Fn(&CellValue) -> bool) -> Vec<usize> {
    column
        .values
        .iter()
        .enumerate()
        .filter(|(_, cell)| predicate(*cell))
        .map(|(row, _)| row)
        .collect()
}

pub(super) fn missing_values(ctx: &CheckContext<'_>) -> Vec<ValidationFinding> {
    ctx.data()
        .columns()
        .iter()
        .enumerate()
        .filter(|(col, _)| !ctx.config.is_nullable(&ctx.names(*col)))
        .filter_map(|(_, column)| {
            let rows = rows_where(column, CellValue::is_missing_like);
            (!rows.is_empty()).then(|| {
                ValidationFinding::new(
                    CheckKind::MissingValues,
                    Severity::Fail,
                    Some(column.name.as_str()),
                    ctx.origins(rows.iter().copied()),
                    format!("{} missing values remain in '{}'", rows.len(), column.name),
                )
            })
        })
        .collect()
}

pub(super) fn duplicates(ctx: &CheckContext<'_>) -> Vec<ValidationFinding> {
    let rows = ctx.data().duplicate_rows();
    if rows.is_empty() {
        return Vec::new();
    }
    vec![ValidationFinding::new(
        CheckKind::Duplicates,
        Severity::Fail,
        None,
        ctx.origins(rows.iter().copied()),
        format!("{} duplicate rows remain", rows.len()),
    )]
}

pub(super) fn required_columns(ctx: &CheckContext<'_>) -> Vec<ValidationFinding> {
    ctx.config
        .required_columns
        .iter()
        .filter(|key| ctx.find(key).is_none())
        .map(|key| {
            ValidationFinding::new(
                CheckKind::RequiredColumns,
                Severity::Fail,
                Some(key.as_str()),
                Vec::new(),
                format!("Required column '{key}' is missing"),
            )
        })
        .collect()
}

pub(super) fn ranges(ctx: &CheckContext<'_>) -> Vec<ValidationFinding> {
    let mut findings = Vec::new();
    for (key, range) in &ctx.config.ranges {
        let Some(column) = ctx.find(key) else {
            continue;
        };
        let rows = rows_where(column, |cell| {
            !cell.is_missing_like() && cell.as_f64().is_some_and(|v| !range.contains(v))
        });
        if rows.is_empty() {
            continue;
        }
        let bounds = format!(
            "[{}, {}]",
            range.min.map_or("-inf".to_string(), |v| v.to_string()),
            range.max.map_or("inf".to_string(), |v| v.to_string())
        );
        findings.push(ValidationFinding::new(
            CheckKind::Range,
            range.severity,
            Some(column.name.as_str()),
            ctx.origins(rows.iter().copied()),
            format!(
                "{} values in '{}' outside {}",
                rows.len(),
                column.name,
                bounds
            ),
        ));
    }
    findings
}

/// Residual outliers: values outside the envelope of the cleaned column.
///
/// The envelope is computed on the cleaned values, after clipping. With
/// clipping enabled this only reports values clipping left behind; with
/// `outlier_action = keep` it reports every outlier.
pub(super) fn outliers(ctx: &CheckContext<'_>) -> Vec<ValidationFinding> {
    let mut findings = Vec::new();
    for (col, column) in ctx.data().columns().iter().enumerate() {
        if ctx.column_type(col) != ColumnType::Numeric {
            continue;
        }
        let values = column.numeric_values();
        let identifier = ctx.baseline_stats(col).is_some_and(|s| s.likely_identifier)
            && values.iter().all(|v| v.fract() == 0.0);
        if identifier {
            continue;
        }
        let Some((lower, upper)) = ctx.config.outlier_envelope(&values) else {
            continue;
        };
        let rows = rows_where(column, |cell| match cell {
            CellValue::Numeric(v) => *v < lower || *v > upper,
            _ => false,
        });
        if rows.is_empty() {
            continue;
        }
        findings.push(ValidationFinding::new(
            CheckKind::Outliers,
            Severity::Warn,
            Some(column.name.as_str()),
            ctx.origins(rows.iter().copied()),
            format!(
                "{} residual values in '{}' outside the cleaned envelope [{:.4}, {:.4}]",
                rows.len(),
                column.name,
                lower,
                upper
            ),
        ));
    }
    findings
}

pub(super) fn categorical(ctx: &CheckContext<'_>) -> Vec<ValidationFinding> {
    let mut findings = Vec::new();
    for (key, allowed) in &ctx.config.allowed_values {
        let Some(column) = ctx.find(key) else {
            continue;
        };
        let rows = rows_where(column, |cell| {
            !cell.is_missing_like() && !allowed.contains(&cell.to_string())
        });
        if rows.is_empty() {
            continue;
        }
        findings.push(ValidationFinding::new(
            CheckKind::Categorical,
            Severity::Warn,
            Some(column.name.as_str()),
            ctx.origins(rows.iter().copied()),
            format!(
                "{} values in '{}' outside the allowed set",
                rows.len(),
                column.name
            ),
        ));
    }
    findings
}

pub(super) fn date_format(ctx: &CheckContext<'_>) -> Vec<ValidationFinding> {
    let mut findings = Vec::new();
    for (col, column) in ctx.data().columns().iter().enumerate() {
        if ctx.column_type(col) != ColumnType::Date {
            continue;
        }
        let rows = rows_where(column, |cell| {
            !cell.is_missing_like() && !matches!(cell, CellValue::Date(_))
        });
        if rows.is_empty() {
            continue;
        }
        findings.push(ValidationFinding::new(
            CheckKind::DateFormat,
            Severity::Fail,
            Some(column.name.as_str()),
            ctx.origins(rows.iter().copied()),
            format!(
                "{} values in '{}' are not valid dates",
                rows.len(),
                column.name
            ),
        ));
    }
    findings
}

fn compare(left: &CellValue, right: &CellValue) -> Option<Ordering> {
    if left.is_missing_like() || right.is_missing_like() {
        return None;
    }
    if let (Some(l), Some(r)) = (left.as_f64(), right.as_f64()) {
        return l.partial_cmp(&r);
    }
    if let (Some(l), Some(r)) = (left.as_date(), right.as_date()) {
        return Some(l.cmp(&r));
    }
    Some(left.to_string().cmp(&right.to_string()))
}

pub(super) fn cross_column(ctx: &CheckContext<'_>) -> Vec<ValidationFinding> {
    let mut findings = Vec::new();
    for rule in &ctx.config.cross_column_rules {
        let (Some(left), Some(right)) = (ctx.find(&rule.left), ctx.find(&rule.right)) else {
            continue;
        };
        let rows: Vec<usize> = left
            .values
            .iter()
            .zip(&right.values)
            .enumerate()
            .filter_map(|(row, (l, r))| {
                let ordering = compare(l, r)?;
                // left <rel> right  <=>  ordering <rel> Equal
                (!rule.relation.holds(ordering, Ordering::Equal)).then_some(row)
            })
            .collect();
        if rows.is_empty() {
            continue;
        }
        findings.push(ValidationFinding::new(
            CheckKind::CrossColumn,
            rule.severity,
            Some(left.name.as_str()),
            ctx.origins(rows.iter().copied()),
            format!(
                "'{}' {} '{}' violated in {} rows",
                left.name,
                rule.relation.symbol(),
                right.name,
                rows.len()
            ),
        ));
    }
    findings
}

pub(super) fn drift(ctx: &CheckContext<'_>) -> Vec<ValidationFinding> {
    if ctx.baseline.is_none() {
        return Vec::new();
    }
    let mut findings = Vec::new();
    for (col, column) in ctx.data().columns().iter().enumerate() {
        if ctx.config.is_scaled(&ctx.names(col)) {
            continue;
        }
        let Some(base) = ctx.baseline_stats(col) else {
            continue;
        };
        let (Some(base_mean), Some(base_std)) = (base.mean, base.std) else {
            continue;
        };
        if base_std <= 0.0 {
            continue;
        }
        let Some(clean_mean) = statistics::mean(&column.numeric_values()) else {
            continue;
        };
        let shift = (clean_mean - base_mean).abs() / base_std;
        if shift > ctx.config.drift_threshold {
            findings.push(ValidationFinding::new(
                CheckKind::Drift,
                Severity::Warn,
                Some(column.name.as_str()),
                Vec::new(),
                format!(
                    "Mean of '{}' shifted by {:.2} standard deviations ({:.4} -> {:.4})",
                    column.name, shift, base_mean, clean_mean
                ),
            ));
        }
    }
    findings
}

#[cfg(test)]
mod tests {
    use super::super::ValidationEngine;
    use super::*;
    use crate::config::{CrossColumnRule, RangeConstraint, Relation};
    use crate::profiler::StatisticalProfiler;
    use crate::types::HeaderMapping;
    use pretty_assertions::assert_eq;

    fn cleaned(headers: &[&str], rows: Vec<Vec<Option<&str>>>) -> CleanedDataset {
        let data = Dataset::from_raw_rows(headers, rows).unwrap();
        let mapping = headers
            .iter()
            .enumerate()
            .map(|(position, h)| HeaderMapping {
                position,
                original: h.to_string(),
                normalized: h.to_string(),
            })
            .collect();
        CleanedDataset::new(data, mapping)
    }

    fn checks_of(findings: &[ValidationFinding]) -> Vec<CheckKind> {
        findings.iter().map(|f| f.check).collect()
    }

    #[test]
    fn test_clean_dataset_has_no_findings() {
        let ds = cleaned(
            &["a", "b"],
            vec![vec![Some("1"), Some("x")], vec![Some("2"), Some("y")]],
        );
        let findings = ValidationEngine::default().validate(&ds, None);
        assert!(findings.is_empty());
    }

    #[test]
    fn test_missing_and_duplicates_fail() {
        let ds = cleaned(
            &["a", "b"],
            vec![
                vec![Some("1"), None],
                vec![Some("2"), Some("y")],
                vec![Some("2"), Some("y")],
            ],
        );
        let findings = ValidationEngine::default().validate(&ds, None);
        assert_eq!(
            checks_of(&findings),
            vec![CheckKind::MissingValues, CheckKind::Duplicates]
        );
        assert!(findings.iter().all(|f| f.is_fail()));
        assert_eq!(findings[0].rows, vec![0]);
        assert_eq!(findings[1].rows, vec![2]);
    }

    #[test]
    fn test_nullable_column_not_reported() {
        let config = CleaningConfig::builder().nullable("b").build().unwrap();
        let ds = cleaned(&["a", "b"], vec![vec![Some("1"), None]]);
        assert!(ValidationEngine::new(config).validate(&ds, None).is_empty());
    }

    #[test]
    fn test_required_column_missing() {
        let config = CleaningConfig::builder().require_column("id").build().unwrap();
        let ds = cleaned(&["a"], vec![vec![Some("1")]]);
        let findings = ValidationEngine::new(config).validate(&ds, None);
        assert_eq!(checks_of(&findings), vec![CheckKind::RequiredColumns]);
        assert_eq!(findings[0].severity, Severity::Fail);
    }

    #[test]
    fn test_range_uses_configured_severity() {
        let range = RangeConstraint {
            severity: Severity::Fail,
            ..RangeConstraint::new(Some(0.0), Some(10.0))
        };
        let config = CleaningConfig::builder().range("score", range).build().unwrap();
        let ds = cleaned(&["score"], vec![vec![Some("5")], vec![Some("11")]]);
        let findings = ValidationEngine::new(config).validate(&ds, None);
        assert_eq!(checks_of(&findings), vec![CheckKind::Range]);
        assert_eq!(findings[0].severity, Severity::Fail);
        assert_eq!(findings[0].rows, vec![1]);
    }

    #[test]
    fn test_categorical_and_date_format() {
        let config = CleaningConfig::builder()
            .allowed_values("color", ["Color", "Black and White"])
            .expect_type("released", ColumnType::Date)
            .build()
            .unwrap();
        let ds = cleaned(
            &["color", "released"],
            vec![
                vec![Some("Color"), Some("2009-12-18")],
                vec![Some("Sepia"), Some("someday")],
            ],
        );
        let findings = ValidationEngine::new(config).validate(&ds, None);
        assert_eq!(
            checks_of(&findings),
            vec![CheckKind::Categorical, CheckKind::DateFormat]
        );
        assert_eq!(findings[0].severity, Severity::Warn);
        assert_eq!(findings[1].severity, Severity::Fail);
    }

    #[test]
    fn test_cross_column_relation() {
        let config = CleaningConfig::builder()
            .cross_column(CrossColumnRule {
                left: "start".into(),
                relation: Relation::LessOrEqual,
                right: "end".into(),
                severity: Severity::Warn,
            })
            .build()
            .unwrap();
        let ds = cleaned(
            &["start", "end"],
            vec![
                vec![Some("2020-01-01"), Some("2020-02-01")],
                vec![Some("2020-03-01"), Some("2020-02-01")],
            ],
        );
        let findings = ValidationEngine::new(config).validate(&ds, None);
        assert_eq!(checks_of(&findings), vec![CheckKind::CrossColumn]);
        assert_eq!(findings[0].rows, vec![1]);
    }

    #[test]
    fn test_drift_against_baseline() {
        let raw = Dataset::from_raw_rows(
            &["x"],
            ["1", "2", "3", "4"].iter().map(|v| vec![Some(*v)]).collect::<Vec<_>>(),
        )
        .unwrap();
        let baseline = StatisticalProfiler::default().profile(&raw).unwrap();
        let ds = cleaned(
            &["x"],
            ["10", "11", "12", "13"]
                .iter()
                .map(|v| vec![Some(*v)])
                .collect(),
        );
        let findings = ValidationEngine::default().validate(&ds, Some(&baseline));
        assert_eq!(checks_of(&findings), vec![CheckKind::Drift]);
        assert_eq!(findings[0].severity, Severity::Warn);

        // No baseline, no drift check
        assert!(ValidationEngine::default().validate(&ds, None).is_empty());
    }

    #[test]
    fn test_outliers_reported_only_when_left_in_place() {
        let values = ["10", "11", "12", "10", "11", "12", "11", "500"];
        let ds = cleaned(&["price"], values.iter().map(|v| vec![Some(*v)]).collect());
        let config = CleaningConfig::builder()
            .outlier_method(crate::config::OutlierMethod::Iqr)
            .build()
            .unwrap();
        let findings = ValidationEngine::new(config).validate(&ds, None);
        assert_eq!(checks_of(&findings), vec![CheckKind::Outliers]);
        assert_eq!(findings[0].rows, vec![7]);
        assert!(findings[0].description.contains("residual"));

        // the same column after clipping has nothing left to report
        let clipped = ["10", "11", "12", "10", "11", "12", "11", "13.5"];
        let ds = cleaned(&["price"], clipped.iter().map(|v| vec![Some(*v)]).collect());
        let config = CleaningConfig::builder()
            .outlier_method(crate::config::OutlierMethod::Iqr)
            .build()
            .unwrap();
        assert!(ValidationEngine::new(config).validate(&ds, None).is_empty());
    }

    #[test]
    fn test_baseline_matched_by_position_for_repeated_headers() {
        let rows = || {
            [("1", "100"), ("2", "200"), ("3", "300"), ("4", "400")]
                .iter()
                .map(|(a, b)| vec![Some(*a), Some(*b)])
                .collect::<Vec<_>>()
        };
        let raw = Dataset::from_raw_rows(&["score", "score"], rows()).unwrap();
        let baseline = StatisticalProfiler::default().profile(&raw).unwrap();
        let mapping = ["Score", "Score (2)"]
            .iter()
            .enumerate()
            .map(|(position, normalized)| HeaderMapping {
                position,
                original: "score".into(),
                normalized: normalized.to_string(),
            })
            .collect();
        let data = Dataset::from_raw_rows(&["Score", "Score (2)"], rows()).unwrap();
        let ds = CleanedDataset::new(data, mapping);

        // each column is compared with its own analyzed statistics, so nothing drifted
        let findings = ValidationEngine::default().validate(&ds, Some(&baseline));
        assert!(findings.is_empty(), "unexpected findings: {findings:?}");
    }

    #[test]
    fn test_validation_is_idempotent() {
        let ds = cleaned(
            &["a", "b"],
            vec![
                vec![Some("1"), None],
                vec![Some("1"), None],
                vec![Some("3"), Some("z")],
            ],
        );
        let engine = ValidationEngine::default();
        assert_eq!(engine.validate(&ds, None), engine.validate(&ds, None));
    }
}
