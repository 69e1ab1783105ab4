//! Post-cleaning validation.
//!
//! Validation is read-only and runs every check on every pass; a FAIL from one
//! check never stops another from running. Problems are reported as
//! [`ValidationFinding`] values, not errors.

mod checks;

use crate::config::CleaningConfig;
use crate::dataset::CleanedDataset;
use crate::types::DatasetStatistics;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Severity of a finding.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    Warn,
    Fail,
}

impl Severity {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Warn => "WARN",
            Self::Fail => "FAIL",
        }
    }
}

/// Which check produced a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    MissingValues,
    Duplicates,
    RequiredColumns,
    Range,
    Outliers,
    Categorical,
    DateFormat,
    CrossColumn,
    Drift,
}

impl CheckKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::MissingValues => "Missing values",
            Self::Duplicates => "Duplicate rows",
            Self::RequiredColumns => "Required columns",
            Self::Range => "Range",
            Self::Outliers => "Outliers",
            Self::Categorical => "Categorical values",
            Self::DateFormat => "Date format",
            Self::CrossColumn => "Cross-column consistency",
            Self::Drift => "Statistical drift",
        }
    }

    /// Whether findings of this kind are scored as constraint violations.
    pub fn is_constraint(&self) -> bool {
        matches!(
            self,
            Self::RequiredColumns
                | Self::Range
                | Self::Categorical
                | Self::DateFormat
                | Self::CrossColumn
        )
    }
}

/// A single data-quality issue found in the cleaned dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationFinding {
    pub check: CheckKind,
    pub severity: Severity,
    /// Cleaned column name, when the finding concerns one column
    pub column: Option<String>,
    /// Affected rows as positions in the uploaded dataset
    pub rows: Vec<usize>,
    pub description: String,
}

impl ValidationFinding {
    pub fn new(
        check: CheckKind,
        severity: Severity,
        column: Option<&str>,
        rows: Vec<usize>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            check,
            severity,
            column: column.map(str::to_string),
            rows,
            description: description.into(),
        }
    }

    pub fn is_fail(&self) -> bool {
        self.severity == Severity::Fail
    }
}

/// Highest severity among the findings, `None` when there are none.
pub fn worst_severity(findings: &[ValidationFinding]) -> Option<Severity> {
    findings.iter().map(|f| f.severity).max()
}

/// Runs every validation check against a cleaned dataset.
#[derive(Debug, Clone, Default)]
pub struct ValidationEngine {
    config: CleaningConfig,
}

impl ValidationEngine {
    pub fn new(config: CleaningConfig) -> Self {
        Self { config }
    }

    /// Validate the cleaned dataset.
    ///
    /// `baseline` is the analyzed-stage statistics used for drift detection
    /// and type expectations; without it the drift check is skipped.
    pub fn validate(
        &self,
        cleaned: &CleanedDataset,
        baseline: Option<&DatasetStatistics>,
    ) -> Vec<ValidationFinding> {
        let ctx = checks::CheckContext {
            config: &self.config,
            cleaned,
            baseline,
        };

        let mut findings = Vec::new();
        findings.extend(checks::missing_values(&ctx));
        findings.extend(checks::duplicates(&ctx));
        findings.extend(checks::required_columns(&ctx));
        findings.extend(checks::ranges(&ctx));
        findings.extend(checks::outliers(&ctx));
        findings.extend(checks::categorical(&ctx));
        findings.extend(checks::date_format(&ctx));
        findings.extend(checks::cross_column(&ctx));
        findings.extend(checks::drift(&ctx));

        findings.sort_by(|a, b| {
            a.check
                .cmp(&b.check)
                .then_with(|| a.column.cmp(&b.column))
                .then_with(|| a.description.cmp(&b.description))
        });

        for finding in &findings {
            debug!(
                check = finding.check.display_name(),
                severity = finding.severity.display_name(),
                "{}",
                finding.description
            );
        }
        info!(
            "Validation complete: {} findings ({} FAIL)",
            findings.len(),
            findings.iter().filter(|f| f.is_fail()).count()
        );

        findings
    }
}
