use crate::audit::{ChangeRecord, RuleChangeCount};
use crate::config::CleaningConfig;
use crate::error::{Result, ResultExt};
use crate::pipeline::{PipelineRun, PipelineStage, StageFailure, StageStatus, StageTransition};
use crate::quality::QualityScore;
use crate::rules::RuleSummary;
use crate::types::HeaderMapping;
use crate::validation::ValidationFinding;
use chrono::Local;
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

// ============================================================================
// Report Types
// ============================================================================

/// Everything a run produced, in one serializable document.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Timestamp when the report was generated
    pub generated_at: String,
    /// Uploaded file name
    pub source_file: String,
    /// Exported cleaned file, when Export has run
    pub cleaned_file: Option<String>,
    /// Version string of the cleaning configuration
    pub config_version: String,

    pub summary: RunSummary,

    /// Stage transitions in the order they were recorded
    pub stages: Vec<StageTransition>,
    /// Changes per rule, including disabled rules
    pub rules: Vec<RuleSummary>,
    pub changes_by_rule: Vec<RuleChangeCount>,
    /// Every change record, in sequence order
    pub audit_trail: Vec<ChangeRecord>,
    /// Old header → new header
    pub header_mapping: Vec<HeaderMapping>,

    /// Score of the profile as uploaded
    pub raw_score: Option<QualityScore>,
    /// Score after cleaning and validation
    pub final_score: Option<QualityScore>,
    pub findings: Vec<ValidationFinding>,

    pub failure: Option<StageFailure>,
}

impl RunReport {
    /// Include a transition that is recorded after the report is written.
    pub(crate) fn with_pending(mut self, transition: StageTransition) -> Self {
        self.summary.status = self.summary.status.max(Some(transition.status));
        self.summary.complete |= transition.stage == PipelineStage::Export;
        self.stages.push(transition);
        self
    }
}

/// Headline numbers of a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Worst stage status so far
    pub status: Option<StageStatus>,
    pub halted: bool,
    pub complete: bool,
    pub rows_before: usize,
    pub rows_after: Option<usize>,
    pub columns_before: usize,
    pub columns_after: Option<usize>,
    pub changes_recorded: usize,
    pub rows_touched: usize,
    pub findings: usize,
    pub failed_checks: usize,
}

// ============================================================================
// Generator
// ============================================================================

/// Builds [`RunReport`]s and writes them as pretty JSON.
#[derive(Debug, Clone)]
pub struct ReportGenerator {
    output_dir: PathBuf,
}

impl ReportGenerator {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Build a report from the current state of a run.
    pub fn build_report(
        run: &PipelineRun,
        config: &CleaningConfig,
        cleaned_file: Option<&Path>,
    ) -> RunReport {
        let raw = run.raw().data();
        let cleaned = run.cleaned();

        let summary = RunSummary {
            status: run.overall_status(),
            halted: run.is_halted(),
            complete: run.is_complete(),
            rows_before: raw.row_count(),
            rows_after: cleaned.map(|c| c.data().row_count()),
            columns_before: raw.column_count(),
            columns_after: cleaned.map(|c| c.data().column_count()),
            changes_recorded: run.audit_trail().len(),
            rows_touched: run.audit_trail().affected_rows().len(),
            findings: run.findings().len(),
            failed_checks: run.findings().iter().filter(|f| f.is_fail()).count(),
        };

        RunReport {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            source_file: run.raw().source_name().to_string(),
            cleaned_file: cleaned_file.map(|p| p.display().to_string()),
            config_version: config.version.clone(),
            summary,
            stages: run.transitions().to_vec(),
            rules: run.rule_summaries().to_vec(),
            changes_by_rule: run.audit_trail().summary(),
            audit_trail: run.audit_trail().records().to_vec(),
            header_mapping: cleaned
                .map(|c| c.header_mapping().to_vec())
                .unwrap_or_default(),
            raw_score: run.raw_score().cloned(),
            final_score: run.score().cloned(),
            findings: run.findings().to_vec(),
            failure: run.failure().cloned(),
        }
    }

    /// Write `report` as `<base_name>_report.json` in the output directory.
    pub fn write_report(&self, report: &RunReport, base_name: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)
            .context(format!("Failed to create {}", self.output_dir.display()))?;

        let report_path = self.output_dir.join(format!("{base_name}_report.json"));
        let mut file = File::create(&report_path)?;
        file.write_all(serde_json::to_string_pretty(report)?.as_bytes())?;

        info!("Report saved: {}", report_path.display());
        Ok(report_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use crate::pipeline::Orchestrator;

    fn halted_run() -> Orchestrator {
        let data = Dataset::from_raw_rows(
            &["name", "age"],
            vec![vec![Some("Ann"), Some("31")], vec![Some("Bob"), Some("oops")]],
        )
        .unwrap();
        let config = CleaningConfig::builder()
            .require_column("email")
            .build()
            .unwrap();
        let mut orchestrator = Orchestrator::builder().config(config).build().unwrap();
        orchestrator.upload("people.csv", data);
        orchestrator.run_to_completion().unwrap();
        orchestrator
    }

    #[test]
    fn test_report_for_halted_run() {
        let orchestrator = halted_run();
        let run = orchestrator.run().unwrap();
        let report = ReportGenerator::build_report(run, orchestrator.config(), None);

        assert_eq!(report.source_file, "people.csv");
        assert!(report.summary.halted);
        assert!(!report.summary.complete);
        assert_eq!(report.summary.status, Some(StageStatus::Fail));
        assert_eq!(report.stages.len(), 2);
        assert!(report.final_score.is_none());
        assert!(report.failure.unwrap().cause.contains("email"));
    }

    #[test]
    fn test_write_report() {
        let orchestrator = halted_run();
        let dir = tempfile::tempdir().unwrap();
        let generator = ReportGenerator::new(dir.path());
        let report =
            ReportGenerator::build_report(orchestrator.run().unwrap(), orchestrator.config(), None);

        let path = generator.write_report(&report, "people").unwrap();
        assert_eq!(path.file_name().unwrap(), "people_report.json");

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["config_version"], orchestrator.config().version.as_str());
        assert_eq!(json["stages"][1]["status"], "fail");
    }
}
