//! Builder for [`Orchestrator`].

use super::orchestrator::Orchestrator;
use super::progress::{ClosureProgressReporter, ProgressReporter, ProgressUpdate};
use crate::config::{CleaningConfig, ConfigValidationError};
use chrono::NaiveDate;
use std::path::PathBuf;
use std::sync::Arc;

/// Default directory for exported files and reports.
pub const DEFAULT_OUTPUT_DIR: &str = "outputs";

/// Builder for creating an [`Orchestrator`].
#[derive(Default)]
pub struct OrchestratorBuilder {
    config: Option<CleaningConfig>,
    output_dir: Option<PathBuf>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    today: Option<NaiveDate>,
}

static_assertions::assert_impl_all!(OrchestratorBuilder: Send);

impl OrchestratorBuilder {
    /// Set the cleaning configuration. Defaults to [`CleaningConfig::default`].
    pub fn config(mut self, config: CleaningConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Directory the Export stage writes into.
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Set a progress reporter for receiving stage updates.
    ///
    /// ```rust,ignore
    /// use lex_tidy::{Orchestrator, ProgressReporter, ProgressUpdate};
    /// use std::sync::Arc;
    ///
    /// struct StderrReporter;
    ///
    /// impl ProgressReporter for StderrReporter {
    ///     fn report(&self, update: ProgressUpdate) {
    ///         eprintln!("{}: {}", update.stage.display_name(), update.message);
    ///     }
    /// }
    ///
    /// let orchestrator = Orchestrator::builder()
    ///     .progress_reporter(Arc::new(StderrReporter))
    ///     .build()?;
    /// ```
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// Shorthand for [`progress_reporter`](Self::progress_reporter) with a
    /// [`ClosureProgressReporter`].
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Pin the date used by the future-date rule.
    pub fn today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// Build the orchestrator.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> Result<Orchestrator, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(Orchestrator {
            config,
            output_dir: self
                .output_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            progress_reporter: self.progress_reporter,
            today: self.today,
            run: None,
        })
    }
}
