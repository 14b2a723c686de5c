//! Per-file remediation state.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::model::{ErrorDescriptor, Language};

/// Lifecycle of a [`FileTask`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Attempting,
    Verifying,
    Retrying,
    Fixed,
    Exhausted,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Fixed | Self::Exhausted)
    }

    /// Whether the state machine allows moving from `self` to `next`.
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        use TaskStatus::*;
        matches!(
            (self, next),
            (Pending, Attempting)
                | (Attempting, Verifying)
                | (Attempting, Retrying)
                | (Attempting, Exhausted)
                | (Verifying, Fixed)
                | (Verifying, Retrying)
                | (Verifying, Exhausted)
                | (Retrying, Attempting)
        )
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Attempting => "attempting",
            Self::Verifying => "verifying",
            Self::Retrying => "retrying",
            Self::Fixed => "fixed",
            Self::Exhausted => "exhausted",
        };
        f.write_str(s)
    }
}

/// What happened during one attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// The requester had no suggestion.
    NoSuggestion,
    /// The requester returned the current content unchanged.
    Unchanged,
    /// The requester failed.
    RequestFailed { reason: String },
    /// Writing or committing the replacement failed.
    PersistFailed { reason: String },
    /// Verification passed.
    Verified,
    /// Verification ran and failed.
    VerificationFailed,
    /// No verification command applied.
    NoCommand,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub attempt: u32,
    pub outcome: AttemptOutcome,
}

/// Working state for remediating a single file.
#[derive(Debug, Clone)]
pub struct FileTask {
    pub path: String,
    pub language: Language,
    /// Current error descriptors; replaced after a failed verification.
    pub errors: Vec<ErrorDescriptor>,
    pub attempts: u32,
    pub max_attempts: u32,
    /// Last content known to be committed (or the original content).
    pub content: String,
    status: TaskStatus,
    history: Vec<TaskStatus>,
    records: Vec<AttemptRecord>,
}

impl FileTask {
    /// A budget of zero is raised to one so every task can reach a
    /// terminal state.
    pub fn new(
        path: impl Into<String>,
        language: Language,
        content: impl Into<String>,
        errors: Vec<ErrorDescriptor>,
        max_attempts: u32,
    ) -> Self {
        Self {
            path: path.into(),
            language,
            errors,
            attempts: 0,
            max_attempts: max_attempts.max(1),
            content: content.into(),
            status: TaskStatus::Pending,
            history: vec![TaskStatus::Pending],
            records: Vec::new(),
        }
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    /// Every status the task has been in, oldest first.
    pub fn history(&self) -> &[TaskStatus] {
        &self.history
    }

    pub fn records(&self) -> &[AttemptRecord] {
        &self.records
    }

    pub fn has_budget(&self) -> bool {
        self.attempts < self.max_attempts
    }

    /// Move to `next`, rejecting transitions the state machine does not allow.
    pub fn transition(&mut self, next: TaskStatus) -> CoreResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(CoreError::InvalidTransition {
                path: self.path.clone(),
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        self.history.push(next);
        Ok(())
    }

    /// Begin the next attempt, returning its 1-based number.
    pub fn begin_attempt(&mut self) -> CoreResult<u32> {
        if !self.has_budget() {
            return Err(CoreError::InvalidTransition {
                path: self.path.clone(),
                from: self.status.to_string(),
                to: TaskStatus::Attempting.to_string(),
            });
        }
        self.transition(TaskStatus::Attempting)?;
        self.attempts += 1;
        Ok(self.attempts)
    }

    pub fn record(&mut self, outcome: AttemptOutcome) {
        self.records.push(AttemptRecord {
            attempt: self.attempts,
            outcome,
        });
    }

    /// Move to `Retrying`, or `Exhausted` once the budget is spent.
    pub fn fail_attempt(&mut self) -> CoreResult<()> {
        if self.has_budget() {
            self.transition(TaskStatus::Retrying)
        } else {
            self.transition(TaskStatus::Exhausted)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(max: u32) -> FileTask {
        FileTask::new("a.py", Language::Python, "x = 1\n", vec![], max)
    }

    #[test]
    fn test_fixed_only_from_verifying() {
        for status in [
            TaskStatus::Pending,
            TaskStatus::Attempting,
            TaskStatus::Retrying,
            TaskStatus::Fixed,
            TaskStatus::Exhausted,
        ] {
            assert!(!status.can_transition_to(TaskStatus::Fixed), "{} -> fixed", status);
        }
        assert!(TaskStatus::Verifying.can_transition_to(TaskStatus::Fixed));
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        let all = [
            TaskStatus::Pending,
            TaskStatus::Attempting,
            TaskStatus::Verifying,
            TaskStatus::Retrying,
            TaskStatus::Fixed,
            TaskStatus::Exhausted,
        ];
        for next in all {
            assert!(!TaskStatus::Fixed.can_transition_to(next));
            assert!(!TaskStatus::Exhausted.can_transition_to(next));
        }
    }

    #[test]
    fn test_invalid_transition_rejected() {
        let mut t = task(3);
        let err = t.transition(TaskStatus::Verifying).unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransition { .. }));
        assert_eq!(t.status(), TaskStatus::Pending);
    }

    #[test]
    fn test_budget_exhaustion() {
        let mut t = task(1);
        assert_eq!(t.begin_attempt().unwrap(), 1);
        t.fail_attempt().unwrap();
        assert_eq!(t.status(), TaskStatus::Exhausted);
        assert!(t.begin_attempt().is_err());
        assert_eq!(t.attempts, 1);
    }

    #[test]
    fn test_zero_budget_still_reaches_terminal_state() {
        let mut t = task(0);
        assert_eq!(t.max_attempts, 1);
        t.begin_attempt().unwrap();
        t.fail_attempt().unwrap();
        assert_eq!(t.status(), TaskStatus::Exhausted);
    }

    #[test]
    fn test_retry_cycle_history() {
        let mut t = task(2);
        t.begin_attempt().unwrap();
        t.fail_attempt().unwrap();
        assert_eq!(t.status(), TaskStatus::Retrying);
        assert_eq!(t.begin_attempt().unwrap(), 2);
        t.fail_attempt().unwrap();
        assert_eq!(
            t.history(),
            &[
                TaskStatus::Pending,
                TaskStatus::Attempting,
                TaskStatus::Retrying,
                TaskStatus::Attempting,
                TaskStatus::Exhausted,
            ]
        );
    }
}
