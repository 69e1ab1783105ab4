//! Tabular Data Cleaning Pipeline Library
//!
//! A rule-driven cleaning and validation pipeline for CSV and spreadsheet
//! data, with a full audit trail of every change it makes.
//!
//! # Overview
//!
//! - **Profiling**: per-column type inference, missing counts, distribution
//!   statistics and identifier detection
//! - **Rule Engine**: an ordered catalog of cleaning rules (headers, domain
//!   fixes, type coercion, statistical heuristics, cosmetics) driven by a
//!   [`CleaningConfig`]
//! - **Audit Trail**: one append-only record per changed cell, header or row
//! - **Validation**: residual problems reported as WARN or FAIL findings
//! - **Quality Score**: a 0–100 score with letter grade and itemized
//!   deductions
//! - **Orchestrator**: a staged run that halts on the first FAIL and only
//!   exports clean results
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use lex_tidy::{CleaningConfig, Orchestrator};
//!
//! let config = CleaningConfig::builder()
//!     .require_column("movie_title")
//!     .numeric_imputation(NumericImputation::Median)
//!     .build()?;
//!
//! let mut orchestrator = Orchestrator::builder()
//!     .config(config)
//!     .output_dir("outputs")
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?;
//!
//! orchestrator.upload_path("movies.csv")?;
//! let run = orchestrator.run_to_completion()?;
//!
//! if run.is_halted() {
//!     println!("Halted: {:?}", run.failure());
//! } else {
//!     println!("Score: {:?}", run.score().map(|s| s.score));
//! }
//! ```
//!
//! # Stages
//!
//! Upload → Raw Overview → Profiling → Cleaning → Validation → Visualization
//! → Export. Stages can also be driven one at a time with
//! [`Orchestrator::advance`] or [`Orchestrator::run_stage`]; out-of-order
//! requests are rejected with [`PipelineError::StageNotReady`].

pub mod audit;
pub mod config;
pub mod dataset;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod profiler;
pub mod quality;
pub mod reporting;
pub mod rules;
pub mod types;
pub mod utils;
pub mod validation;

// Re-exports for convenient access
pub use audit::{AuditTrail, AuditValue, Change, ChangeKind, ChangeRecord, RuleChangeCount};
pub use config::{
    CleaningConfig, CleaningConfigBuilder, ConfigValidationError, CrossColumnRule,
    NumericImputation, OutlierAction, OutlierMethod, RangeAction, RangeConstraint, Relation,
    ScalingMethod, ScoringWeights, TextCase, TextImputation,
};
pub use dataset::{AnalyzedDataset, CellValue, CleanedDataset, Column, Dataset, RawDataset};
pub use error::{PipelineError, Result as PipelineResult, ResultExt};
pub use io::{DataFormat, read_dataset};
pub use pipeline::{
    ClosureProgressReporter, Orchestrator, OrchestratorBuilder, PipelineRun, PipelineStage,
    ProgressReporter, ProgressUpdate, StageFailure, StageStatus,
};
pub use profiler::StatisticalProfiler;
pub use quality::{Deduction, DeductionKind, Grade, QualityScore, QualityScorer};
pub use reporting::{ReportGenerator, RunReport};
pub use rules::{CleaningRule, RuleEngine, RuleTier};
pub use types::{ColumnStatistics, ColumnType, DatasetStatistics, HeaderMapping};
pub use validation::{CheckKind, Severity, ValidationEngine, ValidationFinding};
