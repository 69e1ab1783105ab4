//! Pipeline stages and the orchestrator that drives them.
//!
//! A run moves through Upload → Raw Overview → Profiling → Cleaning →
//! Validation → Visualization → Export. Every stage terminates PASS, WARN or
//! FAIL; a FAIL halts the run and blocks export.

mod builder;
mod orchestrator;
pub mod progress;
mod run;
mod stage;
pub mod visualization;

pub use builder::{DEFAULT_OUTPUT_DIR, OrchestratorBuilder};
pub use orchestrator::Orchestrator;
pub use progress::{ClosureProgressReporter, ProgressReporter, ProgressUpdate};
pub use run::{
    ExportArtifact, PipelineRun, RawOverview, StageArtifact, StageFailure, StageTransition,
};
pub use stage::{PipelineStage, StageStatus};
pub use visualization::VisualizationData;
