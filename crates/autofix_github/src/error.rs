//! Error types for the GitHub module.

use thiserror::Error;

/// Result type alias for GitHub operations.
pub type GitHubResult<T> = Result<T, GitHubError>;

/// Errors that can occur while talking to the GitHub API.
#[derive(Error, Debug)]
pub enum GitHubError {
    #[error("Invalid repository '{0}': expected owner/name")]
    InvalidRepo(String),

    #[error("GitHub token is missing")]
    MissingToken,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GitHub API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Timed out waiting for checks after {polls} polls")]
    Timeout { polls: u32 },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
