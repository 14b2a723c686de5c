//! Collaborator seams used by the remediation loop.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CoreResult;
use crate::model::{Checkpoint, ErrorDescriptor, FixSuggestion, Language, VerificationOutcome};

/// Everything a fix requester needs to propose a replacement for one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixRequest {
    pub path: String,
    pub language: Language,
    pub content: String,
    pub errors: Vec<ErrorDescriptor>,
    /// 1-based attempt number.
    pub attempt: u32,
    /// Attempt ceiling, for prompt context only.
    pub max_attempts: u32,
}

impl FixRequest {
    /// Errors rendered one per line.
    pub fn error_text(&self) -> String {
        self.errors
            .iter()
            .map(ErrorDescriptor::render)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Proposes replacement file content for a set of errors.
#[async_trait]
pub trait FixRequester: Send + Sync {
    async fn request_fix(&self, request: &FixRequest) -> CoreResult<FixSuggestion>;
}

/// Re-validates a file after a replacement has been committed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Verifier: Send + Sync {
    async fn verify(&self, path: &str, language: Language) -> VerificationOutcome;
}

/// Persists replacement content and records it as a checkpoint.
#[cfg_attr(test, mockall::automock)]
pub trait Checkpointer: Send + Sync {
    fn checkpoint(&self, path: &str, content: &str, attempt: u32) -> CoreResult<Checkpoint>;
}
