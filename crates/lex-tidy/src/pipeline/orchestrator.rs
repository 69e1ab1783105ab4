//! The pipeline state machine.

use super::builder::OrchestratorBuilder;
use super::progress::{ProgressReporter, ProgressUpdate};
use super::run::{ExportArtifact, PipelineRun, RawOverview, StageArtifact, StageFailure};
use super::stage::{PipelineStage, StageStatus};
use super::visualization::VisualizationData;
use crate::audit::AuditTrail;
use crate::config::CleaningConfig;
use crate::dataset::{AnalyzedDataset, Dataset, RawDataset};
use crate::error::{PipelineError, Result, ResultExt};
use crate::io::{self, ExportContents};
use crate::profiler::StatisticalProfiler;
use crate::quality::{QualityScore, QualityScorer};
use crate::reporting::ReportGenerator;
use crate::rules::RuleEngine;
use crate::validation::{ValidationEngine, worst_severity};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Drives a dataset through the pipeline stages.
///
/// The orchestrator owns the active [`PipelineRun`]. Stages only start when
/// their predecessor terminated PASS or WARN; a FAIL halts the run. A new
/// upload discards the previous run entirely.
///
/// ```rust,ignore
/// use lex_tidy::{CleaningConfig, Orchestrator};
///
/// let mut orchestrator = Orchestrator::builder()
///     .config(CleaningConfig::from_json_file("cleaning.json")?)
///     .output_dir("outputs")
///     .build()?;
///
/// orchestrator.upload_path("data/movies.xlsx")?;
/// let run = orchestrator.run_to_completion()?;
/// println!("score: {:?}", run.score().map(|s| s.score));
/// ```
pub struct Orchestrator {
    pub(crate) config: CleaningConfig,
    pub(crate) output_dir: PathBuf,
    pub(crate) progress_reporter: Option<Arc<dyn ProgressReporter>>,
    pub(crate) today: Option<NaiveDate>,
    pub(crate) run: Option<PipelineRun>,
}

static_assertions::assert_impl_all!(Orchestrator: Send);

impl Orchestrator {
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::default()
    }

    pub fn config(&self) -> &CleaningConfig {
        &self.config
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// The active run, if a dataset has been uploaded.
    pub fn run(&self) -> Option<&PipelineRun> {
        self.run.as_ref()
    }

    /// Last terminated stage and its status.
    pub fn current(&self) -> Option<(PipelineStage, StageStatus)> {
        let run = self.run.as_ref()?;
        run.transitions().last().map(|t| (t.stage, t.status))
    }

    // ========================================================================
    // Upload
    // ========================================================================

    /// Start a new run with an in-memory dataset.
    ///
    /// Any previous run is discarded. Upload always terminates PASS.
    pub fn upload(&mut self, source_name: impl Into<String>, data: Dataset) -> &PipelineRun {
        self.start_run(RawDataset::new(source_name, data), None)
    }

    /// Start a new run from a CSV or spreadsheet file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read; the current run is left
    /// untouched in that case.
    pub fn upload_path(&mut self, path: impl AsRef<Path>) -> Result<&PipelineRun> {
        let path = path.as_ref();
        let data = io::read_dataset(path)?;
        let source_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(self.start_run(RawDataset::new(source_name, data), Some(path.to_path_buf())))
    }

    fn start_run(&mut self, raw: RawDataset, source_path: Option<PathBuf>) -> &PipelineRun {
        if self.run.is_some() {
            info!("New upload, discarding previous run");
        }
        info!(
            "Uploaded '{}': {} rows x {} columns",
            raw.source_name(),
            raw.data().row_count(),
            raw.data().column_count()
        );

        let mut run = PipelineRun::new(raw, source_path);
        run.record(
            PipelineStage::Upload,
            StageStatus::Pass,
            Some(StageArtifact::RawDataset),
        );
        self.report_progress(ProgressUpdate::finished(
            PipelineStage::Upload,
            StageStatus::Pass,
            "Dataset uploaded",
        ));
        self.run.insert(run)
    }

    // ========================================================================
    // Stage transitions
    // ========================================================================

    /// Run the next stage.
    pub fn advance(&mut self) -> Result<StageStatus> {
        let run = self.active_run(PipelineStage::RawOverview)?;
        match run.next_stage() {
            Some(stage) => self.run_stage(stage),
            None if run.is_halted() => Err(PipelineError::RunHalted {
                failed_stage: run.failed_stage().unwrap_or(PipelineStage::Upload),
            }),
            None => Err(PipelineError::StageNotReady {
                stage: PipelineStage::Export,
                reason: "the run is already complete".to_string(),
            }),
        }
    }

    /// Run `stage`, which must be the next stage of the run.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::StageNotReady`] when the stage is out of order, or
    ///   Visualization is requested before a cleaned dataset exists.
    /// - [`PipelineError::RunHalted`] after an earlier FAIL.
    /// - [`PipelineError::ExportBlocked`] when Export is requested after a FAIL.
    /// - [`PipelineError::StageFailed`] when the stage itself raised a fatal
    ///   error; the failure is also recorded in the run.
    pub fn run_stage(&mut self, stage: PipelineStage) -> Result<StageStatus> {
        let run = self.active_run(stage)?;

        if run.is_halted() {
            return Err(halted_error(run, stage));
        }
        if stage == PipelineStage::Visualization && run.cleaned().is_none() {
            return Err(PipelineError::StageNotReady {
                stage,
                reason: "no cleaned dataset exists yet".to_string(),
            });
        }
        if let Some(status) = run.status(stage) {
            return Err(PipelineError::StageNotReady {
                stage,
                reason: format!("stage already terminated {}", status.display_name()),
            });
        }
        match run.next_stage() {
            Some(next) if next == stage => {}
            Some(next) => {
                return Err(PipelineError::StageNotReady {
                    stage,
                    reason: format!("'{}' must run first", next.display_name()),
                });
            }
            None => {
                return Err(PipelineError::StageNotReady {
                    stage,
                    reason: "the run is already complete".to_string(),
                });
            }
        }

        info!("Stage {}: starting", stage.display_name());
        self.report_progress(ProgressUpdate::new(
            stage,
            0.0,
            format!("{}...", stage.display_name()),
        ));

        let outcome = self.execute(stage).and_then(|(status, artifact)| {
            if stage == PipelineStage::Export {
                self.write_report(status, &artifact)?;
            }
            Ok((status, artifact))
        });

        match outcome {
            Ok((status, artifact)) => {
                let run = self.run_mut()?;
                run.record(stage, status, Some(artifact));
                info!("Stage {}: {}", stage.display_name(), status.display_name());
                if status == StageStatus::Fail {
                    warn!("Run halted at {}", stage.display_name());
                }
                self.report_progress(ProgressUpdate::finished(
                    stage,
                    status,
                    format!("{} {}", stage.display_name(), status.display_name()),
                ));
                Ok(status)
            }
            Err(e) if e.is_recoverable() => {
                warn!("Stage {} not run: {}", stage.display_name(), e);
                Err(e)
            }
            Err(e) => {
                let e = e.in_stage(stage);
                error!("Stage {} failed: {}", stage.display_name(), e);
                let run = self.run_mut()?;
                run.record(stage, StageStatus::Fail, None);
                run.failure = Some(StageFailure::from_error(stage, &e));
                self.report_progress(ProgressUpdate::failed(stage, e.to_string()));
                Err(e)
            }
        }
    }

    /// Advance until the run completes or halts.
    ///
    /// A stage terminating FAIL stops the loop but is not an error; check
    /// [`PipelineRun::is_halted`]. Fatal stage errors are returned.
    pub fn run_to_completion(&mut self) -> Result<&PipelineRun> {
        loop {
            let run = self.active_run(PipelineStage::RawOverview)?;
            if run.next_stage().is_none() {
                break;
            }
            if self.advance()? == StageStatus::Fail {
                break;
            }
        }
        self.active_run(PipelineStage::Export)
    }

    /// Score the analyzed snapshot as if it were cleaned with `config`.
    ///
    /// Runs the rules and validation in scratch state; the active run, its
    /// audit trail and its stored scores are not touched.
    pub fn projected_score(&self, config: &CleaningConfig) -> Result<QualityScore> {
        config.validate()?;
        let run = self.active_run(PipelineStage::Cleaning)?;
        let analyzed = run.analyzed().ok_or_else(|| PipelineError::StageNotReady {
            stage: PipelineStage::Cleaning,
            reason: "profiling has not run".to_string(),
        })?;

        let mut scratch = AuditTrail::new();
        let outcome = self.rule_engine(config.clone()).apply_rules(analyzed, &mut scratch)?;
        let findings =
            ValidationEngine::new(config.clone()).validate(&outcome.cleaned, Some(analyzed.statistics()));
        let score = QualityScorer::from_config(config)
            .with_header_mapping(outcome.cleaned.header_mapping())
            .score(analyzed.statistics(), &findings);

        debug!(score = score.score, "Projected score");
        Ok(score)
    }

    // ========================================================================
    // Stage bodies
    // ========================================================================

    fn execute(&mut self, stage: PipelineStage) -> Result<(StageStatus, StageArtifact)> {
        match stage {
            PipelineStage::Upload => Err(PipelineError::StageNotReady {
                stage,
                reason: "upload a dataset to start a run".to_string(),
            }),
            PipelineStage::RawOverview => self.raw_overview(),
            PipelineStage::Profiling => self.profiling(),
            PipelineStage::Cleaning => self.cleaning(),
            PipelineStage::Validation => self.validation(),
            PipelineStage::Visualization => self.visualization(),
            PipelineStage::Export => self.export(),
        }
    }

    fn raw_overview(&mut self) -> Result<(StageStatus, StageArtifact)> {
        let required = self.config.required_columns.clone();
        let run = self.run_mut()?;
        let overview = RawOverview::compute(run.raw.data(), &required);
        let status = overview.status();

        debug!(
            rows = overview.rows,
            columns = overview.columns,
            missing = overview.missing_cells,
            duplicates = overview.duplicate_rows,
            "Raw overview"
        );
        if status == StageStatus::Fail {
            run.failure = Some(StageFailure::from_checks(
                PipelineStage::RawOverview,
                format!(
                    "required column(s) missing: {}",
                    overview.missing_required.join(", ")
                ),
                overview.missing_required.first().cloned(),
            ));
        }
        run.overview = Some(overview);
        Ok((status, StageArtifact::RawOverview))
    }

    fn profiling(&mut self) -> Result<(StageStatus, StageArtifact)> {
        let profiler = StatisticalProfiler::from_config(&self.config);
        let scorer = QualityScorer::from_config(&self.config);
        let run = self.run_mut()?;

        let statistics = profiler.profile(run.raw.data())?;
        let flagged = statistics
            .columns
            .iter()
            .filter(|c| c.outlier_likely || c.high_missing)
            .count();
        let status = if flagged > 0 {
            StageStatus::Warn
        } else {
            StageStatus::Pass
        };

        run.raw_score = Some(scorer.score_profile(&statistics));
        run.analyzed = Some(AnalyzedDataset::new(run.raw.shared(), statistics));
        debug!(flagged_columns = flagged, "Profiling complete");
        Ok((status, StageArtifact::AnalyzedDataset))
    }

    fn cleaning(&mut self) -> Result<(StageStatus, StageArtifact)> {
        let engine = self.rule_engine(self.config.clone());
        let run = self.run_mut()?;
        let analyzed = run.analyzed.as_ref().ok_or_else(|| PipelineError::StageNotReady {
            stage: PipelineStage::Cleaning,
            reason: "no analyzed dataset exists".to_string(),
        })?;

        let outcome = engine.apply_rules(analyzed, &mut run.trail)?;
        run.rule_summaries = outcome.rule_summaries;
        run.cleaned = Some(outcome.cleaned);
        Ok((StageStatus::Pass, StageArtifact::CleanedDataset))
    }

    fn validation(&mut self) -> Result<(StageStatus, StageArtifact)> {
        let validator = ValidationEngine::new(self.config.clone());
        let scorer = QualityScorer::from_config(&self.config);
        let run = self.run_mut()?;
        let (Some(analyzed), Some(cleaned)) = (run.analyzed.as_ref(), run.cleaned.as_ref()) else {
            return Err(PipelineError::StageNotReady {
                stage: PipelineStage::Validation,
                reason: "no cleaned dataset exists".to_string(),
            });
        };

        let findings = validator.validate(cleaned, Some(analyzed.statistics()));
        let score = scorer
            .with_header_mapping(cleaned.header_mapping())
            .score(analyzed.statistics(), &findings);
        let status = StageStatus::from_severity(worst_severity(&findings));

        info!("Quality score: {} ({})", score.score, score.grade);
        if status == StageStatus::Fail {
            let failed: Vec<_> = findings.iter().filter(|f| f.is_fail()).collect();
            run.failure = Some(StageFailure::from_checks(
                PipelineStage::Validation,
                format!("{} validation check(s) failed", failed.len()),
                failed.first().and_then(|f| f.column.clone()),
            ));
        }

        let artifact = StageArtifact::ValidationReport {
            findings: findings.len(),
        };
        run.findings = findings;
        run.score = Some(score);
        Ok((status, artifact))
    }

    fn visualization(&mut self) -> Result<(StageStatus, StageArtifact)> {
        let run = self.run_mut()?;
        let (Some(analyzed), Some(cleaned)) = (run.analyzed.as_ref(), run.cleaned.as_ref()) else {
            return Err(PipelineError::StageNotReady {
                stage: PipelineStage::Visualization,
                reason: "no cleaned dataset exists yet".to_string(),
            });
        };
        run.visualization = Some(VisualizationData::build(analyzed, cleaned));
        Ok((StageStatus::Pass, StageArtifact::ChartData))
    }

    fn export(&mut self) -> Result<(StageStatus, StageArtifact)> {
        let output_dir = self.output_dir.clone();
        let run = self.run_mut()?;

        for stage in [PipelineStage::Cleaning, PipelineStage::Validation] {
            if run.status(stage) == Some(StageStatus::Fail) {
                return Err(PipelineError::ExportBlocked(format!(
                    "{} terminated FAIL",
                    stage.display_name()
                )));
            }
        }
        let cleaned = run.cleaned.as_ref().ok_or_else(|| {
            PipelineError::ExportBlocked("no cleaned dataset exists".to_string())
        })?;

        let source = run
            .source_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(run.raw.source_name()));
        let target = io::export_path(&source, &output_dir)?;

        io::write_export(
            &target,
            ExportContents {
                cleaned: cleaned.data(),
                raw: run.raw.data(),
                findings: &run.findings,
                trail: &run.trail,
            },
        )?;

        let status = match run.overall_status() {
            Some(StageStatus::Warn) => StageStatus::Warn,
            _ => StageStatus::Pass,
        };
        Ok((status, StageArtifact::ExportedFile { path: target }))
    }

    /// Write the JSON report for an Export about to terminate with `status`.
    ///
    /// The report already lists the Export transition. Export is recorded only
    /// once the report is on disk.
    fn write_report(&mut self, status: StageStatus, artifact: &StageArtifact) -> Result<()> {
        let generator = ReportGenerator::new(self.output_dir.clone());
        let config = &self.config;
        let run = self
            .run
            .as_mut()
            .ok_or_else(|| PipelineError::ExportBlocked("no active run".to_string()))?;
        let StageArtifact::ExportedFile { path: cleaned_file } = artifact else {
            return Err(PipelineError::ExportBlocked(
                "no cleaned file was exported".to_string(),
            ));
        };

        let pending = run.next_transition(PipelineStage::Export, status, Some(artifact.clone()));
        let report = ReportGenerator::build_report(run, config, Some(cleaned_file.as_path()))
            .with_pending(pending);
        let stem = Path::new(run.raw.source_name())
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("dataset")
            .to_string();
        let report_file = generator
            .write_report(&report, &stem)
            .context("Failed to write the run report")?;

        run.export = Some(ExportArtifact {
            cleaned_file: cleaned_file.clone(),
            report_file: Some(report_file),
        });
        Ok(())
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn rule_engine(&self, config: CleaningConfig) -> RuleEngine {
        let engine = RuleEngine::new(config);
        match self.today {
            Some(today) => engine.with_today(today),
            None => engine,
        }
    }

    fn active_run(&self, stage: PipelineStage) -> Result<&PipelineRun> {
        self.run.as_ref().ok_or_else(|| PipelineError::StageNotReady {
            stage,
            reason: "no dataset has been uploaded".to_string(),
        })
    }

    fn run_mut(&mut self) -> Result<&mut PipelineRun> {
        self.run.as_mut().ok_or_else(|| PipelineError::StageNotReady {
            stage: PipelineStage::Upload,
            reason: "no dataset has been uploaded".to_string(),
        })
    }

    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }
}

/// Error for a request made after the run halted.
fn halted_error(run: &PipelineRun, requested: PipelineStage) -> PipelineError {
    let failed_stage = run.failed_stage().unwrap_or(PipelineStage::Upload);
    if requested == PipelineStage::Export {
        PipelineError::ExportBlocked(format!(
            "{} terminated FAIL",
            failed_stage.display_name()
        ))
    } else {
        PipelineError::RunHalted { failed_stage }
    }
}
