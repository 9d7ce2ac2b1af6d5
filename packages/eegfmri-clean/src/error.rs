use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CleanError {
    #[error("BIDS directory not found: {}", .0.display())]
    DatasetNotFound(PathBuf),

    #[error("No valid files found in {} with the given arguments", .0.display())]
    NotFound(PathBuf),

    #[error("Invalid filter for '{entity}': {reason}")]
    InvalidFilter { entity: String, reason: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Step '{step}' failed: {reason}")]
    StepFailed { step: String, reason: String },

    #[error("Interactive menu error: {0}")]
    Menu(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl CleanError {
    pub fn invalid_filter(entity: &str, reason: impl Into<String>) -> Self {
        Self::InvalidFilter {
            entity: entity.to_string(),
            reason: reason.into(),
        }
    }

    pub fn step_failed(step: &str, reason: impl Into<String>) -> Self {
        Self::StepFailed {
            step: step.to_string(),
            reason: reason.into(),
        }
    }

    /// Errors caused by the user's arguments or configuration rather than by
    /// a cleaning step.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::DatasetNotFound(_)
                | Self::NotFound(_)
                | Self::InvalidFilter { .. }
                | Self::Configuration(_)
                | Self::Menu(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CleanError>;
