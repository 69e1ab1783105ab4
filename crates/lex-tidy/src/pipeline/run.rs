//! State of one pipeline run.

use super::stage::{PipelineStage, StageStatus};
use super::visualization::VisualizationData;
use crate::audit::AuditTrail;
use crate::dataset::{AnalyzedDataset, CleanedDataset, Dataset, RawDataset};
use crate::error::PipelineError;
use crate::quality::QualityScore;
use crate::rules::{RuleSummary, normalize_header};
use crate::validation::ValidationFinding;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// What a stage produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StageArtifact {
    RawDataset,
    RawOverview,
    AnalyzedDataset,
    CleanedDataset,
    ValidationReport { findings: usize },
    ChartData,
    ExportedFile { path: PathBuf },
}

/// One recorded stage transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageTransition {
    /// Position in the run, starting at 1
    pub sequence: u64,
    pub stage: PipelineStage,
    pub status: StageStatus,
    pub artifact: Option<StageArtifact>,
    pub recorded_at: DateTime<Utc>,
}

/// Why a stage terminated FAIL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageFailure {
    pub stage: PipelineStage,
    /// Error code, or `FAILED_CHECKS` for a status-level failure
    pub code: String,
    pub cause: String,
    pub rule_id: Option<String>,
    pub column: Option<String>,
}

impl StageFailure {
    pub(crate) fn from_error(stage: PipelineStage, error: &PipelineError) -> Self {
        Self {
            stage,
            code: error.error_code().to_string(),
            cause: error.root_cause().to_string(),
            rule_id: error.rule_id().map(str::to_string),
            column: error.column().map(str::to_string),
        }
    }

    pub(crate) fn from_checks(
        stage: PipelineStage,
        cause: impl Into<String>,
        column: Option<String>,
    ) -> Self {
        Self {
            stage,
            code: "FAILED_CHECKS".to_string(),
            cause: cause.into(),
            rule_id: None,
            column,
        }
    }
}

/// Shape and obvious problems of the uploaded data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawOverview {
    pub rows: usize,
    pub columns: usize,
    pub total_cells: usize,
    /// Missing cells, null tokens included
    pub missing_cells: usize,
    pub missing_by_column: Vec<(String, usize)>,
    pub duplicate_rows: usize,
    /// Required columns absent under both raw and normalized names
    pub missing_required: Vec<String>,
}

impl RawOverview {
    pub(crate) fn compute<'a, I>(data: &Dataset, required: I) -> Self
    where
        I: IntoIterator<Item = &'a String>,
    {
        let missing_by_column: Vec<(String, usize)> = data
            .columns()
            .iter()
            .map(|c| {
                let missing = c.values.iter().filter(|v| v.is_missing_like()).count();
                (c.name.clone(), missing)
            })
            .collect();

        let present: Vec<(String, String)> = data
            .column_names()
            .into_iter()
            .map(|name| (name.to_string(), normalize_header(name)))
            .collect();
        let missing_required = required
            .into_iter()
            .filter(|req| {
                let normalized = normalize_header(req);
                !present
                    .iter()
                    .any(|(raw, norm)| raw.as_str() == req.as_str() || *norm == normalized)
            })
            .cloned()
            .collect();

        Self {
            rows: data.row_count(),
            columns: data.column_count(),
            total_cells: data.total_cells(),
            missing_cells: missing_by_column.iter().map(|(_, n)| n).sum(),
            missing_by_column,
            duplicate_rows: data.duplicate_rows().len(),
            missing_required,
        }
    }

    pub fn status(&self) -> StageStatus {
        if !self.missing_required.is_empty() {
            StageStatus::Fail
        } else if self.missing_cells > 0 || self.duplicate_rows > 0 {
            StageStatus::Warn
        } else {
            StageStatus::Pass
        }
    }
}

/// Files written by the Export stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportArtifact {
    pub cleaned_file: PathBuf,
    pub report_file: Option<PathBuf>,
}

/// Everything one run has produced so far.
///
/// Owned by the orchestrator and replaced wholesale on a new upload. Callers
/// only ever get shared references.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub(crate) raw: RawDataset,
    pub(crate) source_path: Option<PathBuf>,
    pub(crate) overview: Option<RawOverview>,
    pub(crate) analyzed: Option<AnalyzedDataset>,
    pub(crate) cleaned: Option<CleanedDataset>,
    pub(crate) trail: AuditTrail,
    pub(crate) rule_summaries: Vec<RuleSummary>,
    pub(crate) findings: Vec<ValidationFinding>,
    pub(crate) raw_score: Option<QualityScore>,
    pub(crate) score: Option<QualityScore>,
    pub(crate) visualization: Option<VisualizationData>,
    pub(crate) export: Option<ExportArtifact>,
    pub(crate) transitions: Vec<StageTransition>,
    pub(crate) failure: Option<StageFailure>,
}

impl PipelineRun {
    pub(crate) fn new(raw: RawDataset, source_path: Option<PathBuf>) -> Self {
        Self {
            raw,
            source_path,
            overview: None,
            analyzed: None,
            cleaned: None,
            trail: AuditTrail::new(),
            rule_summaries: Vec::new(),
            findings: Vec::new(),
            raw_score: None,
            score: None,
            visualization: None,
            export: None,
            transitions: Vec::new(),
            failure: None,
        }
    }

    pub(crate) fn record(
        &mut self,
        stage: PipelineStage,
        status: StageStatus,
        artifact: Option<StageArtifact>,
    ) -> u64 {
        let transition = self.next_transition(stage, status, artifact);
        let sequence = transition.sequence;
        self.transitions.push(transition);
        sequence
    }

    /// The transition `record` would append, without appending it.
    pub(crate) fn next_transition(
        &self,
        stage: PipelineStage,
        status: StageStatus,
        artifact: Option<StageArtifact>,
    ) -> StageTransition {
        StageTransition {
            sequence: self.transitions.len() as u64 + 1,
            stage,
            status,
            artifact,
            recorded_at: Utc::now(),
        }
    }

    /// Last stage that terminated.
    pub fn stage(&self) -> Option<PipelineStage> {
        self.transitions.last().map(|t| t.stage)
    }

    /// Terminal status of `stage`, if it has run.
    pub fn status(&self, stage: PipelineStage) -> Option<StageStatus> {
        self.transitions
            .iter()
            .find(|t| t.stage == stage)
            .map(|t| t.status)
    }

    /// Stage that would run next, `None` when complete or halted.
    pub fn next_stage(&self) -> Option<PipelineStage> {
        if self.is_halted() {
            return None;
        }
        match self.stage() {
            Some(stage) => stage.next(),
            None => Some(PipelineStage::Upload),
        }
    }

    /// A stage terminated FAIL; no further stage may run.
    pub fn is_halted(&self) -> bool {
        self.failed_stage().is_some()
    }

    pub fn failed_stage(&self) -> Option<PipelineStage> {
        self.transitions
            .iter()
            .find(|t| t.status == StageStatus::Fail)
            .map(|t| t.stage)
    }

    pub fn is_complete(&self) -> bool {
        self.status(PipelineStage::Export).is_some()
    }

    /// Worst status recorded so far.
    pub fn overall_status(&self) -> Option<StageStatus> {
        self.transitions.iter().map(|t| t.status).max()
    }

    pub fn transitions(&self) -> &[StageTransition] {
        &self.transitions
    }

    pub fn raw(&self) -> &RawDataset {
        &self.raw
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    pub fn overview(&self) -> Option<&RawOverview> {
        self.overview.as_ref()
    }

    pub fn analyzed(&self) -> Option<&AnalyzedDataset> {
        self.analyzed.as_ref()
    }

    pub fn cleaned(&self) -> Option<&CleanedDataset> {
        self.cleaned.as_ref()
    }

    pub fn audit_trail(&self) -> &AuditTrail {
        &self.trail
    }

    pub fn rule_summaries(&self) -> &[RuleSummary] {
        &self.rule_summaries
    }

    pub fn findings(&self) -> &[ValidationFinding] {
        &self.findings
    }

    /// Score of the profile as uploaded.
    pub fn raw_score(&self) -> Option<&QualityScore> {
        self.raw_score.as_ref()
    }

    /// Score after cleaning and validation.
    pub fn score(&self) -> Option<&QualityScore> {
        self.score.as_ref()
    }

    pub fn visualization(&self) -> Option<&VisualizationData> {
        self.visualization.as_ref()
    }

    pub fn export(&self) -> Option<&ExportArtifact> {
        self.export.as_ref()
    }

    pub fn failure(&self) -> Option<&StageFailure> {
        self.failure.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run() -> PipelineRun {
        let data = Dataset::from_raw_rows(
            &["movie_title", "gross"],
            vec![
                vec![Some("Avatar"), Some("N/A")],
                vec![Some("Avatar"), Some("N/A")],
            ],
        )
        .unwrap();
        PipelineRun::new(RawDataset::new("movies.csv", data), None)
    }

    #[test]
    fn test_transitions_sequence_and_halt() {
        let mut run = run();
        assert_eq!(run.next_stage(), Some(PipelineStage::Upload));

        assert_eq!(run.record(PipelineStage::Upload, StageStatus::Pass, None), 1);
        assert_eq!(
            run.record(PipelineStage::RawOverview, StageStatus::Warn, None),
            2
        );
        assert_eq!(run.next_stage(), Some(PipelineStage::Profiling));
        assert_eq!(run.overall_status(), Some(StageStatus::Warn));

        run.record(PipelineStage::Profiling, StageStatus::Fail, None);
        assert!(run.is_halted());
        assert_eq!(run.failed_stage(), Some(PipelineStage::Profiling));
        assert_eq!(run.next_stage(), None);
        assert!(!run.is_complete());
    }

    #[test]
    fn test_overview_counts_null_tokens_and_duplicates() {
        let run = run();
        let overview = RawOverview::compute(run.raw().data(), &Vec::new());
        assert_eq!(overview.missing_cells, 2);
        assert_eq!(overview.duplicate_rows, 1);
        assert_eq!(overview.status(), StageStatus::Warn);
    }

    #[test]
    fn test_overview_required_by_raw_or_normalized_name() {
        let run = run();
        let required = vec!["Movie Title".to_string(), "gross".to_string()];
        let overview = RawOverview::compute(run.raw().data(), &required);
        assert!(overview.missing_required.is_empty());

        let required = vec!["budget".to_string()];
        let overview = RawOverview::compute(run.raw().data(), &required);
        assert_eq!(overview.missing_required, vec!["budget"]);
        assert_eq!(overview.status(), StageStatus::Fail);
    }

    #[test]
    fn test_failure_from_error() {
        let error = PipelineError::rule("stat.scale", "Name", "not numeric")
            .in_stage(PipelineStage::Cleaning);
        let failure = StageFailure::from_error(PipelineStage::Cleaning, &error);
        assert_eq!(failure.code, "RULE_APPLICATION_FAILED");
        assert_eq!(failure.rule_id.as_deref(), Some("stat.scale"));
        assert_eq!(failure.column.as_deref(), Some("Name"));
        assert!(failure.cause.contains("not numeric"));
    }
}
