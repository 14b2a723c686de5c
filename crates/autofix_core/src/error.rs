//! Error types for the core module.

use thiserror::Error;

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur during core operations.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid error report: {0}")]
    InvalidReport(String),

    #[error("Invalid state transition for {path}: {from} -> {to}")]
    InvalidTransition { path: String, from: String, to: String },

    #[error("Path {0} is outside the workspace")]
    OutsideWorkspace(String),

    #[error("Git error: {0}")]
    GitError(String),

    #[error("Checkpoint failed for {path}: {message}")]
    CheckpointFailed { path: String, message: String },

    #[error("Fix request failed: {0}")]
    FixRequestFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
