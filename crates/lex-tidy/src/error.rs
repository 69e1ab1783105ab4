//! Error types for the cleaning pipeline.
//!
//! Only fatal or request-denying conditions are errors. Data quality issues
//! found during validation are returned as [`ValidationFinding`] values and
//! never raised.
//!
//! Errors are serializable so a host application can forward them to a
//! frontend as `{ code, message }`.
//!
//! [`ValidationFinding`]: crate::validation::ValidationFinding

use crate::pipeline::PipelineStage;
use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the cleaning pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Dataset has no rows or no columns to profile.
    #[error("Dataset is empty ({rows} rows, {columns} columns)")]
    EmptyDataset { rows: usize, columns: usize },

    /// A rule matched but its transform could not execute.
    #[error("Rule '{rule_id}' failed on column '{column}': {reason}")]
    RuleApplication {
        rule_id: String,
        column: String,
        reason: String,
    },

    /// A stage or artifact was requested before its precondition exists.
    #[error("Stage '{}' is not ready: {reason}", .stage.display_name())]
    StageNotReady {
        stage: PipelineStage,
        reason: String,
    },

    /// Export was requested while Cleaning or Validation terminated FAIL.
    #[error("Export blocked: {0}")]
    ExportBlocked(String),

    /// A previous stage failed, so no further transition is allowed.
    #[error("Run halted after '{}' failed", .failed_stage.display_name())]
    RunHalted { failed_stage: PipelineStage },

    /// A fatal error raised while running a stage.
    #[error("Stage '{}' failed: {source}", .stage.display_name())]
    StageFailed {
        stage: PipelineStage,
        #[source]
        source: Box<PipelineError>,
    },

    /// Column was not found in the dataset.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// Dataset construction violated the equal-length invariant.
    #[error("Column '{column}' has {found} rows, expected {expected}")]
    RaggedColumns {
        column: String,
        expected: usize,
        found: usize,
    },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// File extension is not a supported tabular format.
    #[error("Unsupported file format: '{0}'")]
    UnsupportedFormat(String),

    /// Spreadsheet read/write error.
    #[error("Excel error: {0}")]
    Excel(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<PipelineError>,
    },
}

impl PipelineError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        PipelineError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Wrap a fatal error with the stage it was raised in.
    pub fn in_stage(self, stage: PipelineStage) -> Self {
        PipelineError::StageFailed {
            stage,
            source: Box::new(self),
        }
    }

    /// Convenience constructor for rule failures.
    pub fn rule(
        rule_id: impl Into<String>,
        column: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        PipelineError::RuleApplication {
            rule_id: rule_id.into(),
            column: column.into(),
            reason: reason.into(),
        }
    }

    /// Get error code for frontend handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyDataset { .. } => "EMPTY_DATASET",
            Self::RuleApplication { .. } => "RULE_APPLICATION_FAILED",
            Self::StageNotReady { .. } => "STAGE_NOT_READY",
            Self::ExportBlocked(_) => "EXPORT_BLOCKED",
            Self::RunHalted { .. } => "RUN_HALTED",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::RaggedColumns { .. } => "RAGGED_COLUMNS",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            Self::Excel(_) => "EXCEL_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::StageFailed { source, .. } | Self::WithContext { source, .. } => {
                source.error_code()
            }
        }
    }

    /// Recoverable errors deny a request but leave the run usable.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::StageNotReady { .. }
            | Self::ExportBlocked(_)
            | Self::RunHalted { .. }
            | Self::InvalidConfig(_)
            | Self::UnsupportedFormat(_) => true,
            Self::WithContext { source, .. } => source.is_recoverable(),
            _ => false,
        }
    }

    /// Fatal errors halt forward stage transitions.
    pub fn is_fatal(&self) -> bool {
        !self.is_recoverable()
    }

    /// The stage a fatal error was raised in, if known.
    pub fn stage(&self) -> Option<PipelineStage> {
        match self {
            Self::StageFailed { stage, .. } | Self::StageNotReady { stage, .. } => Some(*stage),
            Self::RunHalted { failed_stage } => Some(*failed_stage),
            Self::WithContext { source, .. } => source.stage(),
            _ => None,
        }
    }

    /// The offending rule ID, if any.
    pub fn rule_id(&self) -> Option<&str> {
        match self {
            Self::RuleApplication { rule_id, .. } => Some(rule_id),
            Self::StageFailed { source, .. } | Self::WithContext { source, .. } => {
                source.rule_id()
            }
            _ => None,
        }
    }

    /// The offending column, if any.
    pub fn column(&self) -> Option<&str> {
        match self {
            Self::RuleApplication { column, .. } => Some(column),
            Self::ColumnNotFound(column) => Some(column),
            Self::RaggedColumns { column, .. } => Some(column),
            Self::StageFailed { source, .. } | Self::WithContext { source, .. } => {
                source.column()
            }
            _ => None,
        }
    }

    /// The innermost error, with stage and context wrappers removed.
    pub fn root_cause(&self) -> &PipelineError {
        match self {
            Self::StageFailed { source, .. } | Self::WithContext { source, .. } => {
                source.root_cause()
            }
            other => other,
        }
    }
}

#[cfg(feature = "excel")]
impl From<calamine::Error> for PipelineError {
    fn from(e: calamine::Error) -> Self {
        PipelineError::Excel(e.to_string())
    }
}

#[cfg(feature = "excel")]
impl From<rust_xlsxwriter::XlsxError> for PipelineError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        PipelineError::Excel(e.to_string())
    }
}

impl Serialize for PipelineError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("PipelineError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| PipelineError::Polars(e).with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| PipelineError::Io(e).with_context(context))
    }
}
