//! Deterministic quality scorer.

use super::{Deduction, DeductionKind, QualityScore};
use crate::config::{CleaningConfig, ScoringWeights, lookup};
use crate::types::{ColumnStatistics, DatasetStatistics, HeaderMapping};
use crate::validation::{CheckKind, ValidationFinding};
use std::collections::BTreeMap;

/// Scores a dataset from its statistics and validation findings.
///
/// Scoring is a pure function of its inputs: the same statistics and
/// findings always give the same score and the same itemization.
#[derive(Debug, Clone, Default)]
pub struct QualityScorer {
    weights: ScoringWeights,
    importance: BTreeMap<String, f64>,
    header_mapping: Vec<HeaderMapping>,
}

impl QualityScorer {
    pub fn new(weights: ScoringWeights, importance: BTreeMap<String, f64>) -> Self {
        Self {
            weights,
            importance,
            header_mapping: Vec::new(),
        }
    }

    pub fn from_config(config: &CleaningConfig) -> Self {
        Self::new(config.scoring, config.importance.clone())
    }

    /// Let findings on renamed columns find their analyzed statistics.
    pub fn with_header_mapping(mut self, mapping: &[HeaderMapping]) -> Self {
        self.header_mapping = mapping.to_vec();
        self
    }

    /// Score validation findings against the analyzed statistics.
    pub fn score(
        &self,
        statistics: &DatasetStatistics,
        findings: &[ValidationFinding],
    ) -> QualityScore {
        let rows = statistics.row_count;
        let mut deductions = Vec::new();

        for finding in findings {
            let column = finding.column.as_deref();
            let fraction = fraction(finding.rows.len(), rows);

            let deduction = match finding.check {
                CheckKind::MissingValues => {
                    let importance = column.map_or(1.0, |c| self.importance_for(c, statistics));
                    Deduction {
                        kind: DeductionKind::MissingValues,
                        column: finding.column.clone(),
                        points: self.weights.missing_weight * fraction * importance,
                        reason: format!(
                            "{:.1}% missing (importance {:.1})",
                            fraction * 100.0,
                            importance
                        ),
                    }
                }
                CheckKind::Duplicates => self.duplicate_deduction(fraction),
                CheckKind::Outliers => Deduction {
                    kind: DeductionKind::Outliers,
                    column: finding.column.clone(),
                    points: (self.weights.outlier_weight * fraction)
                        .min(self.weights.max_issue_penalty),
                    reason: format!("{} outlier values", finding.rows.len()),
                },
                CheckKind::Drift => Deduction {
                    kind: DeductionKind::Drift,
                    column: finding.column.clone(),
                    points: self.weights.drift_penalty,
                    reason: finding.description.clone(),
                },
                kind if kind.is_constraint() => Deduction {
                    kind: DeductionKind::Constraint,
                    column: finding.column.clone(),
                    points: self.weights.constraint_penalty,
                    reason: finding.description.clone(),
                },
                _ => continue,
            };
            deductions.push(deduction);
        }

        QualityScore::from_deductions(deductions)
    }

    /// Score a profile alone: missing cells and duplicate rows as uploaded.
    pub fn score_profile(&self, statistics: &DatasetStatistics) -> QualityScore {
        let mut deductions: Vec<Deduction> = statistics
            .columns
            .iter()
            .filter(|c| c.missing.total() > 0)
            .map(|c| {
                let importance = self.importance_of(&[c.name.as_str()], Some(c));
                let fraction = c.missing_fraction();
                Deduction {
                    kind: DeductionKind::MissingValues,
                    column: Some(c.name.clone()),
                    points: self.weights.missing_weight * fraction * importance,
                    reason: format!(
                        "{:.1}% missing (importance {:.1})",
                        fraction * 100.0,
                        importance
                    ),
                }
            })
            .collect();

        if statistics.duplicate_rows > 0 {
            deductions.push(self.duplicate_deduction(statistics.duplicate_fraction()));
        }

        QualityScore::from_deductions(deductions)
    }

    fn duplicate_deduction(&self, fraction: f64) -> Deduction {
        let base = self.weights.duplicate_penalty_base;
        let curve = (base.powf(fraction) - 1.0) / (base - 1.0);
        Deduction {
            kind: DeductionKind::Duplicates,
            column: None,
            points: self.weights.duplicate_weight * curve,
            reason: format!("{:.1}% duplicate rows", fraction * 100.0),
        }
    }

    /// Importance of a cleaned column, resolved through the header mapping
    /// to the analyzed statistics of the same source column.
    fn importance_for(&self, column: &str, statistics: &DatasetStatistics) -> f64 {
        let mapping = self.header_mapping.iter().find(|m| m.normalized == column);
        let original = mapping.map_or(column, |m| m.original.as_str());
        let stats = match mapping {
            Some(m) => statistics.column_at(m.position),
            None => statistics.column(column),
        };
        self.importance_of(&[column, original], stats)
    }

    /// Configured importance, else 2.0 for identifiers, 1.5 for
    /// high-cardinality columns, 1.0 otherwise.
    fn importance_of(&self, names: &[&str], stats: Option<&ColumnStatistics>) -> f64 {
        if let Some(weight) = lookup(&self.importance, names) {
            return *weight;
        }

        match stats {
            Some(ColumnStatistics {
                likely_identifier: true,
                ..
            }) => 2.0,
            Some(stats) if stats.distinct_ratio >= 0.5 => 1.5,
            _ => 1.0,
        }
    }
}

fn fraction(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (count as f64 / total as f64).min(1.0)
    }
}
