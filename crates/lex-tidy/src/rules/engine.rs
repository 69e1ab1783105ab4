//! Sequential rule execution with audited changes.

use super::{CleaningRule, RuleContext, RuleTier, normalize_headers};
use crate::audit::AuditTrail;
use crate::config::CleaningConfig;
use crate::dataset::{AnalyzedDataset, CleanedDataset};
use crate::error::Result;
use crate::types::HeaderMapping;
use chrono::{Local, NaiveDate};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Per-rule outcome of one cleaning pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleSummary {
    pub rule_id: String,
    pub tier: RuleTier,
    pub changes: usize,
    /// Rule disabled by configuration
    pub skipped: bool,
}

/// Result of [`RuleEngine::apply_rules`].
#[derive(Debug, Clone)]
pub struct CleaningOutcome {
    pub cleaned: CleanedDataset,
    /// Records appended to the trail by this pass
    pub records_appended: usize,
    pub rule_summaries: Vec<RuleSummary>,
}

/// One line of the execution plan shown by a dry run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RulePlanEntry {
    pub rule_id: &'static str,
    pub tier: RuleTier,
    pub enabled: bool,
}

/// Applies the rule catalog in tier precedence order.
#[derive(Debug, Clone)]
pub struct RuleEngine {
    config: CleaningConfig,
    rules: Vec<CleaningRule>,
    today: NaiveDate,
}

impl RuleEngine {
    pub fn new(config: CleaningConfig) -> Self {
        let mut rules = CleaningRule::CATALOG.to_vec();
        rules.sort_by_key(CleaningRule::tier);
        Self {
            config,
            rules,
            today: Local::now().date_naive(),
        }
    }

    /// Fix the date used by `domain.no_future_dates`.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn config(&self) -> &CleaningConfig {
        &self.config
    }

    pub fn rules(&self) -> &[CleaningRule] {
        &self.rules
    }

    /// Rules in execution order and whether the configuration enables them.
    pub fn plan(&self) -> Vec<RulePlanEntry> {
        self.rules
            .iter()
            .map(|rule| RulePlanEntry {
                rule_id: rule.id(),
                tier: rule.tier(),
                enabled: rule.applies(&self.config),
            })
            .collect()
    }

    /// Run every rule over a working copy of the analyzed data.
    ///
    /// Changes are appended to `trail` after each rule, so a failing rule
    /// leaves the records of every earlier rule in place. On failure no
    /// cleaned dataset is returned.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::RuleApplication`] when a rule matches but its
    /// transform cannot execute.
    ///
    /// [`PipelineError::RuleApplication`]: crate::error::PipelineError::RuleApplication
    pub fn apply_rules(
        &self,
        analyzed: &AnalyzedDataset,
        trail: &mut AuditTrail,
    ) -> Result<CleaningOutcome> {
        let mut working = analyzed.data().clone();
        let header_plan = normalize_headers(&working.column_names());
        let ctx = RuleContext {
            config: &self.config,
            statistics: analyzed.statistics(),
            header_plan: &header_plan,
            today: self.today,
        };

        info!(
            "Applying {} cleaning rules to {} rows",
            self.rules.len(),
            working.row_count()
        );

        let start_len = trail.len();
        let mut summaries = Vec::with_capacity(self.rules.len());
        let mut header_mapping: Option<Vec<HeaderMapping>> = None;

        for rule in &self.rules {
            if !rule.applies(&self.config) {
                debug!(rule = rule.id(), "Rule disabled by configuration");
                summaries.push(RuleSummary {
                    rule_id: rule.id().to_string(),
                    tier: rule.tier(),
                    changes: 0,
                    skipped: true,
                });
                continue;
            }

            let output = rule.apply(&ctx, &mut working).inspect_err(|e| {
                warn!(rule = rule.id(), "Rule failed: {}", e);
            })?;

            let count = output.changes.len();
            for change in output.changes {
                trail.append(rule.id(), rule.tier(), change);
            }
            if output.header_mapping.is_some() {
                header_mapping = output.header_mapping;
            }

            debug!(rule = rule.id(), changes = count, "Applied rule");
            summaries.push(RuleSummary {
                rule_id: rule.id().to_string(),
                tier: rule.tier(),
                changes: count,
                skipped: false,
            });
        }

        let header_mapping = header_mapping.unwrap_or_else(|| {
            working
                .columns()
                .iter()
                .enumerate()
                .map(|(index, column)| HeaderMapping {
                    position: working.source_position(index),
                    original: column.name.clone(),
                    normalized: column.name.clone(),
                })
                .collect()
        });

        let records_appended = trail.len() - start_len;
        info!(
            "Cleaning complete: {} rows x {} columns, {} changes recorded",
            working.row_count(),
            working.column_count(),
            records_appended
        );

        Ok(CleaningOutcome {
            cleaned: CleanedDataset::new(working, header_mapping),
            records_appended,
            rule_summaries: summaries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::ChangeKind;
    use crate::config::ScalingMethod;
    use crate::dataset::{CellValue, Dataset, RawDataset};
    use crate::error::PipelineError;
    use crate::profiler::StatisticalProfiler;

    fn analyze(data: Dataset) -> AnalyzedDataset {
        let stats = StatisticalProfiler::default().profile(&data).unwrap();
        let raw = RawDataset::new("test.csv", data);
        AnalyzedDataset::new(raw.shared(), stats)
    }

    fn movies() -> Dataset {
        Dataset::from_raw_rows(
            &["movie_title", "gross", "title_year", "title_year.1"],
            vec![
                vec![Some(" Avatar "), Some("$760,505,847"), Some("2009"), Some("2009")],
                vec![Some("Heat"), Some("N/A"), Some("1995"), Some("1995")],
                vec![Some("Up"), Some("293004164"), Some("2009"), Some("2009")],
                vec![Some("Up"), Some("293004164"), Some("2009"), Some("2009")],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_apply_rules_end_to_end() {
        let analyzed = analyze(movies());
        let engine = RuleEngine::new(CleaningConfig::default());
        let mut trail = AuditTrail::new();

        let outcome = engine.apply_rules(&analyzed, &mut trail).unwrap();
        let cleaned = outcome.cleaned.data();

        assert_eq!(
            cleaned.column_names(),
            vec!["Movie Title", "Gross", "Title Year", "Title Year (2)"]
        );
        assert_eq!(cleaned.row_count(), 3);
        assert_eq!(cleaned.cell(0, 0), Some(&CellValue::Text("Avatar".into())));
        assert_eq!(cleaned.cell(0, 1), Some(&CellValue::Numeric(760_505_847.0)));
        assert!(cleaned.columns().iter().all(|c| c.missing_count() == 0));
        assert_eq!(outcome.records_appended, trail.len());
        assert!(trail.by_rule("cosmetic.dedupe_rows").count() == 1);
    }

    #[test]
    fn test_analyzed_snapshot_untouched() {
        let analyzed = analyze(movies());
        let before = analyzed.data().clone();
        RuleEngine::new(CleaningConfig::default())
            .apply_rules(&analyzed, &mut AuditTrail::new())
            .unwrap();
        assert_eq!(analyzed.data(), &before);
    }

    #[test]
    fn test_audit_rows_point_at_raw_positions() {
        let analyzed = analyze(movies());
        let mut trail = AuditTrail::new();
        RuleEngine::new(CleaningConfig::default())
            .apply_rules(&analyzed, &mut trail)
            .unwrap();

        let removed: Vec<usize> = trail
            .records()
            .iter()
            .filter(|r| r.kind == ChangeKind::RowRemoved)
            .flat_map(|r| r.rows.clone())
            .collect();
        assert_eq!(removed, vec![3]);

        let null_token = trail.by_rule("type.null_tokens").next().unwrap();
        assert_eq!(null_token.rows, vec![1]);
    }

    #[test]
    fn test_records_tagged_in_tier_order() {
        let analyzed = analyze(movies());
        let mut trail = AuditTrail::new();
        RuleEngine::new(CleaningConfig::default())
            .apply_rules(&analyzed, &mut trail)
            .unwrap();
        let tiers: Vec<RuleTier> = trail.records().iter().map(|r| r.tier).collect();
        let mut sorted = tiers.clone();
        sorted.sort();
        assert_eq!(tiers, sorted);
    }

    #[test]
    fn test_failure_keeps_earlier_records() {
        let config = CleaningConfig::builder()
            .scaling(ScalingMethod::MinMax, ["movie_title"])
            .build()
            .unwrap();
        let analyzed = analyze(movies());
        let mut trail = AuditTrail::new();

        let result = RuleEngine::new(config).apply_rules(&analyzed, &mut trail);

        assert!(matches!(
            result,
            Err(PipelineError::RuleApplication { ref rule_id, .. }) if rule_id == "stat.scale"
        ));
        assert!(!trail.is_empty());
        assert!(trail.records().iter().all(|r| r.rule_id != "stat.scale"));
    }

    #[test]
    fn test_plan_marks_disabled_rules() {
        let engine = RuleEngine::new(CleaningConfig::default());
        let plan = engine.plan();
        assert_eq!(plan.len(), CleaningRule::CATALOG.len());
        let scale = plan.iter().find(|p| p.rule_id == "stat.scale").unwrap();
        assert!(!scale.enabled);
    }
}
