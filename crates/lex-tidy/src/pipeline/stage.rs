//! Pipeline stages and their terminal statuses.

use crate::validation::Severity;
use serde::{Deserialize, Serialize};

/// Stages of a cleaning run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Dataset received and typed
    Upload,
    /// Shape, missing cells and duplicates of the raw data
    RawOverview,
    /// Statistical profile of every column
    Profiling,
    /// Rule application
    Cleaning,
    /// Post-cleaning checks and scoring
    Validation,
    /// Chart-ready summaries
    Visualization,
    /// Cleaned file and report written
    Export,
}

impl PipelineStage {
    /// All stages in execution order.
    pub const ALL: [PipelineStage; 7] = [
        PipelineStage::Upload,
        PipelineStage::RawOverview,
        PipelineStage::Profiling,
        PipelineStage::Cleaning,
        PipelineStage::Validation,
        PipelineStage::Visualization,
        PipelineStage::Export,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Upload => "Upload",
            Self::RawOverview => "Raw Overview",
            Self::Profiling => "Profiling",
            Self::Cleaning => "Cleaning",
            Self::Validation => "Validation",
            Self::Visualization => "Visualization",
            Self::Export => "Export",
        }
    }

    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Upload => Some(Self::RawOverview),
            Self::RawOverview => Some(Self::Profiling),
            Self::Profiling => Some(Self::Cleaning),
            Self::Cleaning => Some(Self::Validation),
            Self::Validation => Some(Self::Visualization),
            Self::Visualization => Some(Self::Export),
            Self::Export => None,
        }
    }

    pub fn previous(&self) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.next() == Some(*self))
    }

    /// Share of overall progress taken by this stage (0.0 - 1.0).
    pub fn weight(&self) -> f32 {
        match self {
            Self::Upload => 0.05,
            Self::RawOverview => 0.05,
            Self::Profiling => 0.15,
            Self::Cleaning => 0.35,
            Self::Validation => 0.20,
            Self::Visualization => 0.10,
            Self::Export => 0.10,
        }
    }

    /// Cumulative progress at the start of this stage.
    pub fn base_progress(&self) -> f32 {
        match self {
            Self::Upload => 0.0,
            Self::RawOverview => 0.05,
            Self::Profiling => 0.10,
            Self::Cleaning => 0.25,
            Self::Validation => 0.60,
            Self::Visualization => 0.80,
            Self::Export => 0.90,
        }
    }
}

/// Terminal status of a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Pass,
    Warn,
    Fail,
}

impl StageStatus {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Warn => "WARN",
            Self::Fail => "FAIL",
        }
    }

    /// PASS and WARN let the next stage start.
    pub fn allows_next(&self) -> bool {
        !matches!(self, Self::Fail)
    }

    /// Status implied by the worst finding severity.
    pub fn from_severity(worst: Option<Severity>) -> Self {
        match worst {
            None => Self::Pass,
            Some(Severity::Warn) => Self::Warn,
            Some(Severity::Fail) => Self::Fail,
        }
    }
}
