//! Tiered cleaning rules.
//!
//! Every rule is a variant of [`CleaningRule`]. Rules run in tier precedence
//! order (domain constraints, type enforcement, statistical heuristics,
//! cosmetic standardization) and each one sees the dataset produced by the
//! rule before it. A rule reports its mutations as [`Change`] values; it never
//! sees the audit trail.

mod coercion;
mod cosmetic;
mod domain;
mod engine;
pub mod headers;
mod heuristics;

pub use engine::{CleaningOutcome, RuleEngine, RulePlanEntry, RuleSummary};
pub use headers::{normalize_header, normalize_headers};

use crate::audit::Change;
use crate::config::{CleaningConfig, OutlierAction, ScalingMethod, TextCase, lookup};
use crate::dataset::Dataset;
use crate::error::{PipelineError, Result};
use crate::types::{ColumnStatistics, ColumnType, DatasetStatistics, HeaderMapping};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Precedence tier of a rule. Lower tiers run first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleTier {
    DomainConstraint,
    TypeEnforcement,
    StatisticalHeuristic,
    Cosmetic,
}

impl RuleTier {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::DomainConstraint => "Domain constraint",
            Self::TypeEnforcement => "Type enforcement",
            Self::StatisticalHeuristic => "Statistical heuristic",
            Self::Cosmetic => "Cosmetic",
        }
    }
}

/// A cleaning rule from the built-in catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CleaningRule {
    CategoricalMapping,
    NumericRange,
    NoFutureDates,
    NullTokens,
    CoerceNumeric,
    CoerceDate,
    CoerceBoolean,
    DropEmptyColumns,
    ImputeMissing,
    ClipOutliers,
    Scale,
    SanitizeText,
    NormalizeCase,
    DropConstantColumns,
    NormalizeHeaders,
    DedupeRows,
}

impl CleaningRule {
    /// Default catalog in execution order.
    pub const CATALOG: [CleaningRule; 16] = [
        Self::CategoricalMapping,
        Self::NumericRange,
        Self::NoFutureDates,
        Self::NullTokens,
        Self::CoerceNumeric,
        Self::CoerceDate,
        Self::CoerceBoolean,
        Self::DropEmptyColumns,
        Self::ImputeMissing,
        Self::ClipOutliers,
        Self::Scale,
        Self::SanitizeText,
        Self::NormalizeCase,
        Self::DropConstantColumns,
        Self::NormalizeHeaders,
        Self::DedupeRows,
    ];

    /// Stable rule ID recorded in the audit trail.
    pub fn id(&self) -> &'static str {
        match self {
            Self::CategoricalMapping => "domain.categorical_mapping",
            Self::NumericRange => "domain.numeric_range",
            Self::NoFutureDates => "domain.no_future_dates",
            Self::NullTokens => "type.null_tokens",
            Self::CoerceNumeric => "type.numeric",
            Self::CoerceDate => "type.date",
            Self::CoerceBoolean => "type.boolean",
            Self::DropEmptyColumns => "stat.drop_empty_columns",
            Self::ImputeMissing => "stat.impute_missing",
            Self::ClipOutliers => "stat.clip_outliers",
            Self::Scale => "stat.scale",
            Self::SanitizeText => "cosmetic.sanitize_text",
            Self::NormalizeCase => "cosmetic.case",
            Self::DropConstantColumns => "cosmetic.drop_constant_columns",
            Self::NormalizeHeaders => "cosmetic.normalize_headers",
            Self::DedupeRows => "cosmetic.dedupe_rows",
        }
    }

    pub fn tier(&self) -> RuleTier {
        match self {
            Self::CategoricalMapping | Self::NumericRange | Self::NoFutureDates => {
                RuleTier::DomainConstraint
            }
            Self::NullTokens | Self::CoerceNumeric | Self::CoerceDate | Self::CoerceBoolean => {
                RuleTier::TypeEnforcement
            }
            Self::DropEmptyColumns | Self::ImputeMissing | Self::ClipOutliers | Self::Scale => {
                RuleTier::StatisticalHeuristic
            }
            Self::SanitizeText
            | Self::NormalizeCase
            | Self::DropConstantColumns
            | Self::NormalizeHeaders
            | Self::DedupeRows => RuleTier::Cosmetic,
        }
    }

    /// Whether the configuration enables this rule at all.
    pub fn applies(&self, config: &CleaningConfig) -> bool {
        match self {
            Self::CategoricalMapping => !config.categorical_mapping.is_empty(),
            Self::NumericRange => !config.ranges.is_empty(),
            Self::NoFutureDates => config.no_future_dates,
            Self::ClipOutliers => config.outlier_action != OutlierAction::Keep,
            Self::Scale => {
                config.scaling.method != ScalingMethod::None && !config.scaling.columns.is_empty()
            }
            Self::NormalizeCase => config.text_case != TextCase::Preserve,
            Self::DropConstantColumns => config.remove_constant_columns,
            _ => true,
        }
    }

    /// Run the rule against the working dataset.
    pub(crate) fn apply(&self, ctx: &RuleContext<'_>, data: &mut Dataset) -> Result<RuleOutput> {
        let output = match self {
            Self::CategoricalMapping => domain::categorical_mapping(self.id(), ctx, data)?.into(),
            Self::NumericRange => domain::numeric_range(self.id(), ctx, data)?.into(),
            Self::NoFutureDates => domain::no_future_dates(ctx, data).into(),
            Self::NullTokens => coercion::null_tokens(data).into(),
            Self::CoerceNumeric => {
                coercion::coerce(self.id(), ctx, data, ColumnType::Numeric)?.into()
            }
            Self::CoerceDate => coercion::coerce(self.id(), ctx, data, ColumnType::Date)?.into(),
            Self::CoerceBoolean => {
                coercion::coerce(self.id(), ctx, data, ColumnType::Boolean)?.into()
            }
            Self::DropEmptyColumns => heuristics::drop_empty_columns(ctx, data).into(),
            Self::ImputeMissing => heuristics::impute_missing(ctx, data).into(),
            Self::ClipOutliers => heuristics::clip_outliers(ctx, data).into(),
            Self::Scale => heuristics::scale(self.id(), ctx, data)?.into(),
            Self::SanitizeText => cosmetic::sanitize_text(data).into(),
            Self::NormalizeCase => cosmetic::normalize_case(ctx, data).into(),
            Self::DropConstantColumns => cosmetic::drop_constant_columns(ctx, data).into(),
            Self::NormalizeHeaders => cosmetic::normalize_headers(ctx, data),
            Self::DedupeRows => cosmetic::dedupe_rows(data).into(),
        };
        Ok(output)
    }
}

/// What a rule produced: its changes, plus the header mapping when the rule
/// renamed columns.
#[derive(Debug, Default)]
pub(crate) struct RuleOutput {
    pub changes: Vec<Change>,
    pub header_mapping: Option<Vec<HeaderMapping>>,
}

impl From<Vec<Change>> for RuleOutput {
    fn from(changes: Vec<Change>) -> Self {
        Self {
            changes,
            header_mapping: None,
        }
    }
}

/// Read-only inputs shared by every rule of one cleaning pass.
#[derive(Debug)]
pub(crate) struct RuleContext<'a> {
    pub config: &'a CleaningConfig,
    pub statistics: &'a DatasetStatistics,
    /// Raw → normalized header plan computed from the uploaded header row
    pub header_plan: &'a [HeaderMapping],
    pub today: NaiveDate,
}

impl<'a> RuleContext<'a> {
    /// Names the column at `col` can be referenced by in configuration:
    /// its current name and its planned normalized name.
    pub fn names<'b>(&'b self, data: &'b Dataset, col: usize) -> [&'b str; 2] {
        let name = data.columns()[col].name.as_str();
        let normalized = self
            .header_plan
            .get(data.source_position(col))
            .map_or(name, |m| m.normalized.as_str());
        [name, normalized]
    }

    /// Index of the column a configuration key refers to.
    pub fn resolve(&self, data: &Dataset, key: &str) -> Option<usize> {
        (0..data.column_count()).find(|&col| self.names(data, col).contains(&key))
    }

    /// Like [`resolve`](Self::resolve), failing with `RuleApplication`.
    pub fn require(&self, rule_id: &str, data: &Dataset, key: &str) -> Result<usize> {
        self.resolve(data, key).ok_or_else(|| {
            PipelineError::rule(rule_id, key, "configured column does not exist")
        })
    }

    /// Analyzed statistics of the column at `col`.
    pub fn column_stats(&self, data: &Dataset, col: usize) -> Option<&'a ColumnStatistics> {
        self.statistics.column_at(data.source_position(col))
    }

    /// Configured expected type if any, else the inferred type.
    pub fn effective_type(&self, data: &Dataset, col: usize) -> ColumnType {
        lookup(&self.config.expected_types, &self.names(data, col))
            .copied()
            .or_else(|| self.column_stats(data, col).map(|s| s.inferred_type))
            .unwrap_or_default()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::profiler::StatisticalProfiler;

    /// Profile `data` and build a header plan for it.
    pub fn context_parts(
        config: &CleaningConfig,
        data: &Dataset,
    ) -> (DatasetStatistics, Vec<HeaderMapping>) {
        let stats = StatisticalProfiler::from_config(config)
            .profile(data)
            .expect("profile");
        let plan = normalize_headers(&data.column_names());
        (stats, plan)
    }

    pub fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).expect("date")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_is_in_tier_order() {
        let tiers: Vec<RuleTier> = CleaningRule::CATALOG.iter().map(|r| r.tier()).collect();
        let mut sorted = tiers.clone();
        sorted.sort();
        assert_eq!(tiers, sorted);
    }

    #[test]
    fn test_rule_ids_are_unique() {
        let mut ids: Vec<&str> = CleaningRule::CATALOG.iter().map(|r| r.id()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), CleaningRule::CATALOG.len());
    }

    #[test]
    fn test_optional_rules_disabled_by_default() {
        let config = CleaningConfig::default();
        assert!(!CleaningRule::NumericRange.applies(&config));
        assert!(!CleaningRule::Scale.applies(&config));
        assert!(!CleaningRule::DropConstantColumns.applies(&config));
        assert!(CleaningRule::ImputeMissing.applies(&config));
        assert!(CleaningRule::ClipOutliers.applies(&config));
    }

    #[test]
    fn test_context_resolves_raw_and_normalized_names() {
        let data = Dataset::from_raw_rows(&["unit_price"], vec![vec![Some("1")]]).unwrap();
        let config = CleaningConfig::default();
        let (stats, plan) = test_support::context_parts(&config, &data);
        let ctx = RuleContext {
            config: &config,
            statistics: &stats,
            header_plan: &plan,
            today: test_support::today(),
        };
        assert_eq!(ctx.resolve(&data, "unit_price"), Some(0));
        assert_eq!(ctx.resolve(&data, "Unit Price"), Some(0));
        assert!(matches!(
            ctx.require("domain.numeric_range", &data, "qty"),
            Err(PipelineError::RuleApplication { .. })
        ));
    }

    #[test]
    fn test_context_keys_repeated_headers_by_position() {
        let mut data = Dataset::from_raw_rows(
            &["year", "year"],
            vec![vec![Some("2009"), Some("Paris")], vec![Some("1995"), Some("Rome")]],
        )
        .unwrap();
        let config = CleaningConfig::default();
        let (stats, plan) = test_support::context_parts(&config, &data);
        let ctx = RuleContext {
            config: &config,
            statistics: &stats,
            header_plan: &plan,
            today: test_support::today(),
        };
        assert_eq!(ctx.names(&data, 0), ["year", "Year"]);
        assert_eq!(ctx.names(&data, 1), ["year", "Year (2)"]);
        assert_eq!(ctx.effective_type(&data, 0), ColumnType::Numeric);
        assert_eq!(ctx.effective_type(&data, 1), ColumnType::Text);

        data.remove_column(0);
        assert_eq!(ctx.names(&data, 0), ["year", "Year (2)"]);
        assert_eq!(ctx.effective_type(&data, 0), ColumnType::Text);
    }
}
