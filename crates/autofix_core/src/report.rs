//! Error reports consumed by the coordinator and the run report it produces.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::remediation::RemediationResult;

/// Reserved key for test failures that could not be attributed to a file.
pub const GENERAL_KEY: &str = "_general";

/// A lint problem reported against a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintEntry {
    pub message: String,
    #[serde(default)]
    pub line: Option<u32>,
    #[serde(default)]
    pub column: Option<u32>,
}

/// A test failure reported against a file (or [`GENERAL_KEY`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestEntry {
    pub message: String,
    #[serde(default)]
    pub details: String,
}

/// Aggregated lint and test errors for a commit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    #[serde(default)]
    pub lint: BTreeMap<String, Vec<LintEntry>>,
    #[serde(default)]
    pub test: BTreeMap<String, Vec<TestEntry>>,
    #[serde(default)]
    pub affected_files: Vec<String>,
}

impl ErrorReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a report from the three JSON documents exchanged between CI steps.
    ///
    /// Blank inputs are treated as empty documents.
    pub fn from_json_parts(lint: &str, test: &str, affected_files: &str) -> CoreResult<Self> {
        fn parse<T: for<'de> Deserialize<'de> + Default>(name: &str, raw: &str) -> CoreResult<T> {
            if raw.trim().is_empty() {
                return Ok(T::default());
            }
            serde_json::from_str(raw)
                .map_err(|e| CoreError::InvalidReport(format!("{} is not valid JSON: {}", name, e)))
        }

        Ok(Self {
            lint: parse("lint errors", lint)?,
            test: parse("test errors", test)?,
            affected_files: parse("affected files", affected_files)?,
        })
    }

    /// Record a lint problem and mark the file as affected.
    pub fn add_lint(&mut self, path: impl Into<String>, entry: LintEntry) {
        let path = path.into();
        self.mark_affected(&path);
        self.lint.entry(path).or_default().push(entry);
    }

    /// Record a test failure. Files other than [`GENERAL_KEY`] are marked as affected.
    pub fn add_test(&mut self, path: impl Into<String>, entry: TestEntry) {
        let path = path.into();
        if path != GENERAL_KEY {
            self.mark_affected(&path);
        }
        self.test.entry(path).or_default().push(entry);
    }

    fn mark_affected(&mut self, path: &str) {
        if !self.affected_files.iter().any(|p| p == path) {
            self.affected_files.push(path.to_string());
        }
    }

    /// Whether unattributed test failures are present.
    pub fn has_general_failures(&self) -> bool {
        self.test.contains_key(GENERAL_KEY)
    }

    pub fn is_empty(&self) -> bool {
        self.lint.is_empty() && self.test.is_empty()
    }

    /// All file keys that carry at least one error, excluding [`GENERAL_KEY`].
    pub fn error_files(&self) -> Vec<String> {
        let mut files: Vec<String> = Vec::new();
        for path in self.lint.keys().chain(self.test.keys()) {
            if path != GENERAL_KEY && !files.contains(path) {
                files.push(path.clone());
            }
        }
        files
    }

    /// Human-readable listing, one `File:` header per file followed by its errors.
    pub fn details(&self) -> String {
        let mut lines = Vec::new();
        for path in self.error_files() {
            lines.push(format!("File: {}", path));
            for entry in self.lint.get(&path).into_iter().flatten() {
                match entry.line {
                    Some(line) => lines.push(format!("  - Lint error at {}:{}: {}", path, line, entry.message)),
                    None => lines.push(format!("  - Lint error: {}", entry.message)),
                }
            }
            for entry in self.test.get(&path).into_iter().flatten() {
                lines.push(format!("  - {}", entry.message));
            }
        }
        lines.join("\n")
    }
}

/// Outcome of a whole remediation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    /// True when at least one file was fixed.
    pub success: bool,
    /// The error report exactly as received.
    pub original_errors: ErrorReport,
    /// Diff log across every committed attempt.
    pub changes_made: String,
    /// Verification narrative across every attempt.
    pub verification_results: String,
    pub files: Vec<RemediationResult>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    pub fn new(original_errors: ErrorReport) -> Self {
        let now = Utc::now();
        Self {
            run_id: Uuid::new_v4(),
            success: false,
            original_errors,
            changes_made: String::new(),
            verification_results: String::new(),
            files: Vec::new(),
            started_at: now,
            finished_at: now,
        }
    }

    /// Fold a per-file result into the run.
    pub fn add_result(&mut self, result: RemediationResult) {
        self.success |= result.fixed;
        for entry in &result.diff_log {
            if !self.changes_made.is_empty() {
                self.changes_made.push_str("\n\n");
            }
            self.changes_made.push_str(entry);
        }
        self.verification_results.push_str(&result.narrative);
        self.files.push(result);
    }

    pub fn finalize(&mut self) {
        self.finished_at = Utc::now();
    }

    pub fn fixed_files(&self) -> Vec<&str> {
        self.files
            .iter()
            .filter(|f| f.fixed)
            .map(|f| f.path.as_str())
            .collect()
    }
}
