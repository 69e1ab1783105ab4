//! Configuration consumed by the rule engine, validation engine and scorer.
//!
//! All options have documented defaults so an empty JSON object is a valid
//! configuration. Use [`CleaningConfig::builder()`] for a fluent API or
//! [`CleaningConfig::from_json_file`] to load one from disk.
//!
//! Column names may be written either as they appear in the uploaded file
//! (`title_year`) or in their normalized form (`Title Year`).

use crate::error::{PipelineError, Result};
use crate::profiler::statistics;
use crate::types::ColumnType;
use crate::validation::Severity;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Version stamped into configs that do not set one.
pub const DEFAULT_CONFIG_VERSION: &str = "1.0";

/// Statistical envelope used for outlier clipping and outlier validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutlierMethod {
    /// mean ± z·std
    #[default]
    ZScore,
    /// [q1 − k·IQR, q3 + k·IQR]
    Iqr,
}

/// What the cleaning stage does with values outside the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutlierAction {
    /// Clip values to the envelope bounds
    #[default]
    Clip,
    /// Leave values untouched (validation still reports them)
    Keep,
}

/// Strategy for imputing missing numeric values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NumericImputation {
    #[default]
    Mean,
    Median,
    Zero,
}

/// Strategy for imputing missing text values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TextImputation {
    /// Most frequent value
    #[default]
    Mode,
    /// `text_fill_value`
    Constant,
}

/// What the range rule does with an out-of-range value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RangeAction {
    #[default]
    Clip,
    /// Replace with a missing marker (imputed later)
    Null,
    /// Replace with the column median
    Median,
    /// Remove the whole row
    DropRow,
}

/// Numeric bounds for one column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct RangeConstraint {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    /// Severity of residual violations found by validation
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub action: RangeAction,
}

impl RangeConstraint {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self {
            min,
            max,
            ..Default::default()
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min.is_none_or(|min| value >= min) && self.max.is_none_or(|max| value <= max)
    }

    pub fn clamp(&self, value: f64) -> f64 {
        let value = self.min.map_or(value, |min| value.max(min));
        self.max.map_or(value, |max| value.min(max))
    }
}

/// Relation that must hold between two columns of the same row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    LessThan,
    LessOrEqual,
    Equal,
    NotEqual,
    GreaterThan,
    GreaterOrEqual,
}

impl Relation {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::LessThan => "<",
            Self::LessOrEqual => "<=",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::GreaterThan => ">",
            Self::GreaterOrEqual => ">=",
        }
    }

    pub fn holds<T: PartialOrd>(&self, left: T, right: T) -> bool {
        match self {
            Self::LessThan => left < right,
            Self::LessOrEqual => left <= right,
            Self::Equal => left == right,
            Self::NotEqual => left != right,
            Self::GreaterThan => left > right,
            Self::GreaterOrEqual => left >= right,
        }
    }
}

/// A `left <relation> right` invariant checked on every row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossColumnRule {
    pub left: String,
    pub relation: Relation,
    pub right: String,
    #[serde(default)]
    pub severity: Severity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScalingMethod {
    #[default]
    None,
    MinMax,
    ZScore,
}

/// Scaling applied to an explicit list of columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ScalingConfig {
    #[serde(default)]
    pub method: ScalingMethod,
    #[serde(default)]
    pub columns: Vec<String>,
}

/// Case normalization for text values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TextCase {
    #[default]
    Preserve,
    Lower,
    Upper,
    Title,
    Sentence,
}

/// Weights used by the quality scorer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// Points for a fully missing column of importance 1.0
    pub missing_weight: f64,
    /// Points when every row is a duplicate
    pub duplicate_weight: f64,
    /// Base of the exponential duplicate curve (must be > 1)
    pub duplicate_penalty_base: f64,
    /// Fixed points per constraint-violation finding
    pub constraint_penalty: f64,
    /// Points when every row of a column is an outlier
    pub outlier_weight: f64,
    /// Cap for any single volume-scaled deduction
    pub max_issue_penalty: f64,
    /// Fixed points per drift finding
    pub drift_penalty: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            missing_weight: 20.0,
            duplicate_weight: 25.0,
            duplicate_penalty_base: 10.0,
            constraint_penalty: 5.0,
            outlier_weight: 10.0,
            max_issue_penalty: 15.0,
            drift_penalty: 3.0,
        }
    }
}

/// Configuration for one cleaning run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    /// Version label recorded in reports.
    /// Default: "1.0"
    pub version: String,

    /// Columns that must exist.
    pub required_columns: BTreeSet<String>,

    /// Expected types, overriding inference for type enforcement.
    pub expected_types: BTreeMap<String, ColumnType>,

    /// Per-column numeric bounds.
    pub ranges: BTreeMap<String, RangeConstraint>,

    /// Envelope used for outliers.
    /// Default: ZScore
    pub outlier_method: OutlierMethod,

    /// Z-score envelope half-width in standard deviations.
    /// Default: 3.0
    pub zscore_threshold: f64,

    /// IQR envelope multiplier.
    /// Default: 1.5
    pub iqr_multiplier: f64,

    /// Default: Clip
    pub outlier_action: OutlierAction,

    /// Default: Mean
    pub numeric_imputation: NumericImputation,

    /// Default: Mode
    pub text_imputation: TextImputation,

    /// Fill value for `TextImputation::Constant`.
    /// Default: "Unknown"
    pub text_fill_value: String,

    /// Column importance weights for the missing-value penalty.
    /// Unlisted columns get an inferred weight.
    pub importance: BTreeMap<String, f64>,

    /// Columns allowed to keep missing values.
    pub nullable_columns: BTreeSet<String>,

    pub cross_column_rules: Vec<CrossColumnRule>,

    /// Standardized mean shift above which a column is reported as drifted.
    /// Default: 1.0
    pub drift_threshold: f64,

    /// Distinct ratio at or above which a column is a likely identifier.
    /// Default: 0.95
    pub identifier_ratio: f64,

    /// |skew| above which a numeric column is flagged outlier-likely.
    /// Default: 1.0
    pub skew_threshold: f64,

    /// Enumerated allowed values per categorical column.
    pub allowed_values: BTreeMap<String, BTreeSet<String>>,

    /// Value replacements per column, applied before type enforcement.
    pub categorical_mapping: BTreeMap<String, BTreeMap<String, String>>,

    pub scaling: ScalingConfig,

    /// Default: Preserve
    pub text_case: TextCase,

    /// Drop columns with a single distinct value.
    /// Default: false
    pub remove_constant_columns: bool,

    /// Treat dates after today as invalid.
    /// Default: false
    pub no_future_dates: bool,

    pub scoring: ScoringWeights,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            version: DEFAULT_CONFIG_VERSION.to_string(),
            required_columns: BTreeSet::new(),
            expected_types: BTreeMap::new(),
            ranges: BTreeMap::new(),
            outlier_method: OutlierMethod::default(),
            zscore_threshold: 3.0,
            iqr_multiplier: 1.5,
            outlier_action: OutlierAction::default(),
            numeric_imputation: NumericImputation::default(),
            text_imputation: TextImputation::default(),
            text_fill_value: "Unknown".to_string(),
            importance: BTreeMap::new(),
            nullable_columns: BTreeSet::new(),
            cross_column_rules: Vec::new(),
            drift_threshold: 1.0,
            identifier_ratio: 0.95,
            skew_threshold: 1.0,
            allowed_values: BTreeMap::new(),
            categorical_mapping: BTreeMap::new(),
            scaling: ScalingConfig::default(),
            text_case: TextCase::default(),
            remove_constant_columns: false,
            no_future_dates: false,
            scoring: ScoringWeights::default(),
        }
    }
}

/// Find the entry for a column under any of its names.
pub fn lookup<'a, T>(map: &'a BTreeMap<String, T>, names: &[&str]) -> Option<&'a T> {
    names.iter().find_map(|name| map.get(*name))
}

fn contains_any(set: &BTreeSet<String>, names: &[&str]) -> bool {
    names.iter().any(|name| set.contains(*name))
}

impl CleaningConfig {
    /// Create a new configuration builder.
    pub fn builder() -> CleaningConfigBuilder {
        CleaningConfigBuilder::default()
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: CleaningConfig = serde_json::from_str(json)?;
        config
            .validate()
            .map_err(|e| PipelineError::InvalidConfig(e.to_string()))?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
            .map_err(|e| e.with_context(format!("Loading config {}", path.display())))
    }

    pub fn is_nullable(&self, names: &[&str]) -> bool {
        contains_any(&self.nullable_columns, names)
    }

    pub fn is_required(&self, names: &[&str]) -> bool {
        contains_any(&self.required_columns, names)
    }

    pub fn is_scaled(&self, names: &[&str]) -> bool {
        self.scaling.method != ScalingMethod::None
            && self
                .scaling
                .columns
                .iter()
                .any(|c| names.contains(&c.as_str()))
    }

    /// Outlier envelope for the configured method, `None` when the values
    /// are too few or constant.
    pub fn outlier_envelope(&self, values: &[f64]) -> Option<(f64, f64)> {
        match self.outlier_method {
            OutlierMethod::ZScore => statistics::zscore_bounds(values, self.zscore_threshold),
            OutlierMethod::Iqr => statistics::iqr_bounds(values, self.iqr_multiplier),
        }
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> std::result::Result<(), ConfigValidationError> {
        if !(0.0..=1.0).contains(&self.identifier_ratio) {
            return Err(ConfigValidationError::InvalidThreshold {
                field: "identifier_ratio".to_string(),
                value: self.identifier_ratio,
            });
        }

        for (field, value) in [
            ("zscore_threshold", self.zscore_threshold),
            ("iqr_multiplier", self.iqr_multiplier),
            ("drift_threshold", self.drift_threshold),
            ("skew_threshold", self.skew_threshold),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigValidationError::NonPositive {
                    field: field.to_string(),
                    value,
                });
            }
        }

        let base = self.scoring.duplicate_penalty_base;
        if base.is_nan() || base <= 1.0 {
            return Err(ConfigValidationError::InvalidPenaltyBase(
                self.scoring.duplicate_penalty_base,
            ));
        }

        for (field, value) in [
            ("missing_weight", self.scoring.missing_weight),
            ("duplicate_weight", self.scoring.duplicate_weight),
            ("constraint_penalty", self.scoring.constraint_penalty),
            ("outlier_weight", self.scoring.outlier_weight),
            ("max_issue_penalty", self.scoring.max_issue_penalty),
            ("drift_penalty", self.scoring.drift_penalty),
        ] {
            if value < 0.0 {
                return Err(ConfigValidationError::NegativeWeight {
                    field: field.to_string(),
                    value,
                });
            }
        }

        if let Some((column, weight)) = self.importance.iter().find(|(_, w)| **w < 0.0) {
            return Err(ConfigValidationError::NegativeWeight {
                field: format!("importance.{column}"),
                value: *weight,
            });
        }

        for (column, range) in &self.ranges {
            if let (Some(min), Some(max)) = (range.min, range.max)
                && min > max
            {
                return Err(ConfigValidationError::InvalidRange {
                    column: column.clone(),
                    min,
                    max,
                });
            }
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid threshold for '{field}': {value} (must be between 0.0 and 1.0)")]
    InvalidThreshold { field: String, value: f64 },

    #[error("Invalid value for '{field}': {value} (must be positive)")]
    NonPositive { field: String, value: f64 },

    #[error("Invalid duplicate penalty base: {0} (must be greater than 1.0)")]
    InvalidPenaltyBase(f64),

    #[error("Invalid weight for '{field}': {value} (must not be negative)")]
    NegativeWeight { field: String, value: f64 },

    #[error("Invalid range for '{column}': min {min} is greater than max {max}")]
    InvalidRange { column: String, min: f64, max: f64 },
}

impl From<ConfigValidationError> for PipelineError {
    fn from(err: ConfigValidationError) -> Self {
        PipelineError::InvalidConfig(err.to_string())
    }
}

/// Builder for [`CleaningConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct CleaningConfigBuilder {
    version: Option<String>,
    outlier_method: Option<OutlierMethod>,
    zscore_threshold: Option<f64>,
    iqr_multiplier: Option<f64>,
    outlier_action: Option<OutlierAction>,
    numeric_imputation: Option<NumericImputation>,
    text_imputation: Option<TextImputation>,
    drift_threshold: Option<f64>,
    identifier_ratio: Option<f64>,
    skew_threshold: Option<f64>,
    text_case: Option<TextCase>,
    remove_constant_columns: Option<bool>,
    no_future_dates: Option<bool>,
    scoring: Option<ScoringWeights>,
    scaling: Option<ScalingConfig>,
    required_columns: BTreeSet<String>,
    expected_types: BTreeMap<String, ColumnType>,
    ranges: BTreeMap<String, RangeConstraint>,
    importance: BTreeMap<String, f64>,
    nullable_columns: BTreeSet<String>,
    cross_column_rules: Vec<CrossColumnRule>,
    allowed_values: BTreeMap<String, BTreeSet<String>>,
    categorical_mapping: BTreeMap<String, BTreeMap<String, String>>,
}

impl CleaningConfigBuilder {
    /// Set the version label recorded in reports.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn outlier_method(mut self, method: OutlierMethod) -> Self {
        self.outlier_method = Some(method);
        self
    }

    /// Set the Z-score envelope in standard deviations.
    pub fn zscore_threshold(mut self, threshold: f64) -> Self {
        self.zscore_threshold = Some(threshold);
        self
    }

    /// Set the IQR multiplier.
    pub fn iqr_multiplier(mut self, multiplier: f64) -> Self {
        self.iqr_multiplier = Some(multiplier);
        self
    }

    pub fn outlier_action(mut self, action: OutlierAction) -> Self {
        self.outlier_action = Some(action);
        self
    }

    pub fn numeric_imputation(mut self, strategy: NumericImputation) -> Self {
        self.numeric_imputation = Some(strategy);
        self
    }

    pub fn text_imputation(mut self, strategy: TextImputation) -> Self {
        self.text_imputation = Some(strategy);
        self
    }

    pub fn drift_threshold(mut self, threshold: f64) -> Self {
        self.drift_threshold = Some(threshold);
        self
    }

    /// Set the distinct ratio for flagging likely identifiers.
    ///
    /// # Arguments
    /// * `ratio` - Value between 0.0 and 1.0 (e.g., 0.95)
    pub fn identifier_ratio(mut self, ratio: f64) -> Self {
        self.identifier_ratio = Some(ratio);
        self
    }

    pub fn skew_threshold(mut self, threshold: f64) -> Self {
        self.skew_threshold = Some(threshold);
        self
    }

    pub fn text_case(mut self, case: TextCase) -> Self {
        self.text_case = Some(case);
        self
    }

    pub fn remove_constant_columns(mut self, remove: bool) -> Self {
        self.remove_constant_columns = Some(remove);
        self
    }

    pub fn no_future_dates(mut self, enable: bool) -> Self {
        self.no_future_dates = Some(enable);
        self
    }

    pub fn scoring(mut self, weights: ScoringWeights) -> Self {
        self.scoring = Some(weights);
        self
    }

    /// Scale the given columns with `method`.
    pub fn scaling<I, S>(mut self, method: ScalingMethod, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scaling = Some(ScalingConfig {
            method,
            columns: columns.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn require_column(mut self, column: impl Into<String>) -> Self {
        self.required_columns.insert(column.into());
        self
    }

    pub fn expect_type(mut self, column: impl Into<String>, column_type: ColumnType) -> Self {
        self.expected_types.insert(column.into(), column_type);
        self
    }

    pub fn range(mut self, column: impl Into<String>, constraint: RangeConstraint) -> Self {
        self.ranges.insert(column.into(), constraint);
        self
    }

    pub fn importance(mut self, column: impl Into<String>, weight: f64) -> Self {
        self.importance.insert(column.into(), weight);
        self
    }

    pub fn nullable(mut self, column: impl Into<String>) -> Self {
        self.nullable_columns.insert(column.into());
        self
    }

    pub fn cross_column(mut self, rule: CrossColumnRule) -> Self {
        self.cross_column_rules.push(rule);
        self
    }

    pub fn allowed_values<I, S>(mut self, column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_values
            .insert(column.into(), values.into_iter().map(Into::into).collect());
        self
    }

    pub fn map_value(
        mut self,
        column: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        self.categorical_mapping
            .entry(column.into())
            .or_default()
            .insert(from.into(), to.into());
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `CleaningConfig` or an error if validation fails.
    pub fn build(self) -> std::result::Result<CleaningConfig, ConfigValidationError> {
        let defaults = CleaningConfig::default();
        let config = CleaningConfig {
            version: self.version.unwrap_or(defaults.version),
            required_columns: self.required_columns,
            expected_types: self.expected_types,
            ranges: self.ranges,
            outlier_method: self.outlier_method.unwrap_or_default(),
            zscore_threshold: self.zscore_threshold.unwrap_or(defaults.zscore_threshold),
            iqr_multiplier: self.iqr_multiplier.unwrap_or(defaults.iqr_multiplier),
            outlier_action: self.outlier_action.unwrap_or_default(),
            numeric_imputation: self.numeric_imputation.unwrap_or_default(),
            text_imputation: self.text_imputation.unwrap_or_default(),
            text_fill_value: defaults.text_fill_value,
            importance: self.importance,
            nullable_columns: self.nullable_columns,
            cross_column_rules: self.cross_column_rules,
            drift_threshold: self.drift_threshold.unwrap_or(defaults.drift_threshold),
            identifier_ratio: self.identifier_ratio.unwrap_or(defaults.identifier_ratio),
            skew_threshold: self.skew_threshold.unwrap_or(defaults.skew_threshold),
            allowed_values: self.allowed_values,
            categorical_mapping: self.categorical_mapping,
            scaling: self.scaling.unwrap_or_default(),
            text_case: self.text_case.unwrap_or_default(),
            remove_constant_columns: self.remove_constant_columns.unwrap_or(false),
            no_future_dates: self.no_future_dates.unwrap_or(false),
            scoring: self.scoring.unwrap_or_default(),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CleaningConfig::default();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.outlier_method, OutlierMethod::ZScore);
        assert_eq!(config.zscore_threshold, 3.0);
        assert_eq!(config.iqr_multiplier, 1.5);
        assert_eq!(config.identifier_ratio, 0.95);
        assert_eq!(config.numeric_imputation, NumericImputation::Mean);
        assert!(!config.remove_constant_columns);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_custom_values() {
        let config = CleaningConfig::builder()
            .version("2024.1")
            .outlier_method(OutlierMethod::Iqr)
            .numeric_imputation(NumericImputation::Median)
            .require_column("id")
            .nullable("notes")
            .range("age", RangeConstraint::new(Some(0.0), Some(120.0)))
            .map_value("sex", "M", "Male")
            .build()
            .unwrap();

        assert_eq!(config.version, "2024.1");
        assert_eq!(config.outlier_method, OutlierMethod::Iqr);
        assert_eq!(config.numeric_imputation, NumericImputation::Median);
        assert!(config.is_required(&["id"]));
        assert!(config.is_nullable(&["x", "notes"]));
        assert_eq!(config.ranges["age"].max, Some(120.0));
        assert_eq!(config.categorical_mapping["sex"]["M"], "Male");
    }

    #[test]
    fn test_validation_invalid_identifier_ratio() {
        let result = CleaningConfig::builder().identifier_ratio(1.5).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidThreshold { .. }
        ));
    }

    #[test]
    fn test_validation_invalid_range() {
        let result = CleaningConfig::builder()
            .range("age", RangeConstraint::new(Some(10.0), Some(1.0)))
            .build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidRange { .. }
        ));
    }

    #[test]
    fn test_validation_penalty_base() {
        let weights = ScoringWeights {
            duplicate_penalty_base: 1.0,
            ..Default::default()
        };
        let result = CleaningConfig::builder().scoring(weights).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidPenaltyBase(_)
        ));
    }

    #[test]
    fn test_range_constraint() {
        let range = RangeConstraint::new(Some(0.0), None);
        assert!(range.contains(5.0));
        assert!(!range.contains(-1.0));
        assert_eq!(range.clamp(-3.0), 0.0);
        assert_eq!(range.clamp(1e9), 1e9);
    }

    #[test]
    fn test_relation_holds() {
        assert!(Relation::LessOrEqual.holds(1.0, 1.0));
        assert!(!Relation::GreaterThan.holds(1.0, 2.0));
        assert_eq!(Relation::NotEqual.symbol(), "!=");
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "version": "movies-v3",
            "required_columns": ["movie_title"],
            "expected_types": { "budget": "numeric" },
            "ranges": { "imdb_score": { "min": 0, "max": 10, "severity": "fail" } },
            "outlier_method": "iqr",
            "numeric_imputation": "median",
            "nullable_columns": ["homepage"],
            "cross_column_rules": [
                { "left": "gross", "relation": "less_or_equal", "right": "budget" }
            ],
            "scaling": { "method": "min_max", "columns": ["budget"] }
        }"#;

        let config = CleaningConfig::from_json_str(json).expect("Should deserialize");

        assert_eq!(config.version, "movies-v3");
        assert_eq!(config.expected_types["budget"], ColumnType::Numeric);
        assert_eq!(config.ranges["imdb_score"].severity, Severity::Fail);
        assert_eq!(config.ranges["imdb_score"].action, RangeAction::Clip);
        assert_eq!(config.outlier_method, OutlierMethod::Iqr);
        assert_eq!(config.cross_column_rules[0].severity, Severity::Warn);
        assert_eq!(config.scaling.method, ScalingMethod::MinMax);
        // Unspecified fields fall back to defaults
        assert_eq!(config.zscore_threshold, 3.0);
    }

    #[test]
    fn test_config_from_json_rejects_invalid() {
        let result = CleaningConfig::from_json_str(r#"{ "drift_threshold": -1 }"#);
        assert!(matches!(result, Err(PipelineError::InvalidConfig(_))));
    }
}
