//! Bounded fix/verify loop for a single file.
//!
//! Each attempt asks the [`FixRequester`] for replacement content. Distinct
//! content is checkpointed and verified; a failed verification replaces the
//! working error descriptors with whatever the verifier extracted, so the
//! next request sees the errors the previous fix left behind. The loop stops
//! on the first successful verification or when the attempt budget is spent.

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::model::{Checkpoint, FixSuggestion, VerificationOutcome};
use crate::task::{AttemptOutcome, AttemptRecord, FileTask, TaskStatus};
use crate::traits::{Checkpointer, FixRequest, FixRequester, Verifier};

/// Outcome of remediating one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemediationResult {
    pub path: String,
    pub fixed: bool,
    pub attempts_made: u32,
    pub status: TaskStatus,
    /// Every status the task passed through.
    pub transitions: Vec<TaskStatus>,
    pub checkpoints: Vec<Checkpoint>,
    /// One markdown diff block per checkpoint.
    pub diff_log: Vec<String>,
    /// Detail of the last verification that ran, empty if none did.
    pub final_detail: String,
    pub attempts: Vec<AttemptRecord>,
    /// Markdown narrative of every attempt.
    pub narrative: String,
}

/// Drives a [`FileTask`] to `Fixed` or `Exhausted`.
pub struct RemediationLoop<'a> {
    requester: &'a dyn FixRequester,
    verifier: &'a dyn Verifier,
    checkpointer: &'a dyn Checkpointer,
}

impl<'a> RemediationLoop<'a> {
    pub fn new(
        requester: &'a dyn FixRequester,
        verifier: &'a dyn Verifier,
        checkpointer: &'a dyn Checkpointer,
    ) -> Self {
        Self {
            requester,
            verifier,
            checkpointer,
        }
    }

    /// Run the loop to completion.
    pub async fn run(&self, mut task: FileTask) -> RemediationResult {
        info!("Attempting to fix {}...", task.path);

        let mut checkpoints = Vec::new();
        let mut diff_log = Vec::new();
        let mut narrative = String::new();
        let mut final_detail = String::new();

        while task.has_budget() && !task.status().is_terminal() {
            let attempt = match task.begin_attempt() {
                Ok(n) => n,
                Err(e) => {
                    error!("{}", e);
                    break;
                }
            };
            info!("Attempt {}/{} for {}", attempt, task.max_attempts, task.path);

            let request = FixRequest {
                path: task.path.clone(),
                language: task.language,
                content: task.content.clone(),
                errors: task.errors.clone(),
                attempt,
                max_attempts: task.max_attempts,
            };

            let replacement = match self.requester.request_fix(&request).await {
                Ok(FixSuggestion::Replacement(content)) if content != task.content => content,
                Ok(FixSuggestion::Replacement(_)) => {
                    info!("Fix requester returned the same content for {}", task.path);
                    task.record(AttemptOutcome::Unchanged);
                    fail_attempt(&mut task);
                    continue;
                }
                Ok(FixSuggestion::NoSuggestion) => {
                    info!("No changes suggested for {}", task.path);
                    task.record(AttemptOutcome::NoSuggestion);
                    fail_attempt(&mut task);
                    continue;
                }
                Err(e) => {
                    warn!("Error fixing {}: {}", task.path, e);
                    narrative.push_str(&format!(
                        "\n### {} - ❌ Error in fix attempt {}\n{}\n",
                        task.path, attempt, e
                    ));
                    task.record(AttemptOutcome::RequestFailed {
                        reason: e.to_string(),
                    });
                    fail_attempt(&mut task);
                    continue;
                }
            };

            match self.checkpointer.checkpoint(&task.path, &replacement, attempt) {
                Ok(checkpoint) => {
                    info!("Committed changes for {} ({})", task.path, checkpoint.commit);
                    diff_log.push(format!(
                        "## Changes to {} (Attempt {})\n```diff\n{}\n```",
                        task.path, attempt, checkpoint.diff
                    ));
                    checkpoints.push(checkpoint);
                }
                Err(e) => {
                    warn!("Error committing changes for {}: {}", task.path, e);
                    narrative.push_str(&format!(
                        "\n### {} - ❌ Error committing changes\n{}\n",
                        task.path, e
                    ));
                    task.record(AttemptOutcome::PersistFailed {
                        reason: e.to_string(),
                    });
                    fail_attempt(&mut task);
                    continue;
                }
            }

            task.content = replacement;
            if let Err(e) = task.transition(TaskStatus::Verifying) {
                error!("{}", e);
                break;
            }

            let outcome = self.verifier.verify(&task.path, task.language).await;
            debug!("Verification outcome for {}: {:?}", task.path, outcome);
            final_detail = outcome.detail().to_string();

            if outcome.is_success() {
                info!("Fix for {} was successful!", task.path);
                narrative.push_str(&format!(
                    "\n### {} - ✅ Fixed successfully\n{}\n",
                    task.path,
                    outcome.detail()
                ));
                task.record(AttemptOutcome::Verified);
                if let Err(e) = task.transition(TaskStatus::Fixed) {
                    error!("{}", e);
                }
                break;
            }

            info!(
                "Fix for {} did not resolve all issues, trying again...",
                task.path
            );
            narrative.push_str(&format!(
                "\n### {} - ❌ Attempt {} failed\n{}\n",
                task.path,
                attempt,
                outcome.detail()
            ));
            task.record(match outcome {
                VerificationOutcome::NoCommand => AttemptOutcome::NoCommand,
                _ => AttemptOutcome::VerificationFailed,
            });
            if !outcome.errors().is_empty() {
                task.errors = outcome.errors().to_vec();
            }
            fail_attempt(&mut task);
        }

        let fixed = task.status() == TaskStatus::Fixed;
        if !fixed {
            warn!(
                "Could not fix {} after {} attempts",
                task.path, task.attempts
            );
        }

        RemediationResult {
            path: task.path.clone(),
            fixed,
            attempts_made: task.attempts,
            status: task.status(),
            transitions: task.history().to_vec(),
            checkpoints,
            diff_log,
            final_detail,
            attempts: task.records().to_vec(),
            narrative,
        }
    }
}

fn fail_attempt(task: &mut FileTask) {
    if let Err(e) = task.fail_attempt() {
        error!("{}", e);
    }
    if task.status() == TaskStatus::Exhausted {
        info!("Maximum attempts reached for {} without success", task.path);
    }
}
