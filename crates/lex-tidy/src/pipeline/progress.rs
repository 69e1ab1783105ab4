//! Progress reporting for pipeline runs.
//!
//! The orchestrator emits a [`ProgressUpdate`] when a stage starts and when
//! it terminates. Hosts receive them through a [`ProgressReporter`], or a
//! closure registered with [`OrchestratorBuilder::on_progress`].
//!
//! ```rust,ignore
//! use lex_tidy::Orchestrator;
//!
//! let mut orchestrator = Orchestrator::builder()
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?;
//! ```
//!
//! [`OrchestratorBuilder::on_progress`]: crate::pipeline::OrchestratorBuilder::on_progress

use super::stage::{PipelineStage, StageStatus};
use serde::{Deserialize, Serialize};

/// A progress event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Stage the update belongs to
    pub stage: PipelineStage,

    /// Terminal status, set once the stage has finished
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<StageStatus>,

    /// Overall progress (0.0 - 1.0)
    pub progress: f32,

    /// Progress within the stage (0.0 - 1.0)
    pub stage_progress: f32,

    pub message: String,
}

impl ProgressUpdate {
    /// An in-flight update for a stage.
    pub fn new(stage: PipelineStage, stage_progress: f32, message: impl Into<String>) -> Self {
        let progress = stage.base_progress() + (stage.weight() * stage_progress);
        Self {
            stage,
            status: None,
            progress: progress.clamp(0.0, 1.0),
            stage_progress: stage_progress.clamp(0.0, 1.0),
            message: message.into(),
        }
    }

    /// A stage has terminated with `status`.
    pub fn finished(stage: PipelineStage, status: StageStatus, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            ..Self::new(stage, 1.0, message)
        }
    }

    /// A stage failed; overall progress stays where the stage started.
    pub fn failed(stage: PipelineStage, message: impl Into<String>) -> Self {
        Self {
            status: Some(StageStatus::Fail),
            ..Self::new(stage, 0.0, message)
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_some()
    }
}

/// Receives progress updates from the orchestrator.
///
/// Implementations must be `Send + Sync` so the orchestrator can run on a
/// worker thread while the host consumes updates elsewhere.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, update: ProgressUpdate);
}

/// [`ProgressReporter`] backed by a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}

static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_progress_within_stage() {
        let update = ProgressUpdate::new(PipelineStage::Cleaning, 0.5, "halfway");
        assert!((update.progress - 0.425).abs() < 1e-6);
        assert!(!update.is_terminal());
    }

    #[test]
    fn test_progress_clamped() {
        let update = ProgressUpdate::new(PipelineStage::Export, 5.0, "over");
        assert_eq!(update.progress, 1.0);
        assert_eq!(update.stage_progress, 1.0);
    }

    #[test]
    fn test_finished_and_failed() {
        let done = ProgressUpdate::finished(PipelineStage::Profiling, StageStatus::Warn, "done");
        assert_eq!(done.status, Some(StageStatus::Warn));
        assert!((done.progress - 0.25).abs() < 1e-6);

        let failed = ProgressUpdate::failed(PipelineStage::Cleaning, "boom");
        assert_eq!(failed.status, Some(StageStatus::Fail));
        assert!((failed.progress - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_closure_reporter() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let reporter = ClosureProgressReporter::new(move |u: ProgressUpdate| {
            sink.lock().unwrap().push(u.stage);
        });
        reporter.report(ProgressUpdate::new(PipelineStage::Upload, 0.0, "start"));
        assert_eq!(*seen.lock().unwrap(), vec![PipelineStage::Upload]);
    }

    #[test]
    fn test_update_serialization() {
        let update = ProgressUpdate::new(PipelineStage::RawOverview, 0.0, "x");
        let json = serde_json::to_string(&update).unwrap();
        assert!(json.contains("\"raw_overview\""));
        assert!(!json.contains("status"));
    }
}
