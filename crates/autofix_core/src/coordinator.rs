//! Batch coordination across every file named in an error report.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::FixConfig;
use crate::model::{ErrorDescriptor, Language};
use crate::remediation::RemediationLoop;
use crate::report::{ErrorReport, RunReport, GENERAL_KEY};
use crate::task::FileTask;
use crate::traits::{Checkpointer, FixRequester, Verifier};

/// Runs the remediation loop for each file in an [`ErrorReport`], one at a time.
pub struct BatchCoordinator<'a> {
    config: &'a FixConfig,
    requester: &'a dyn FixRequester,
    verifier: &'a dyn Verifier,
    checkpointer: &'a dyn Checkpointer,
    abort: Option<Arc<AtomicBool>>,
}

impl<'a> BatchCoordinator<'a> {
    pub fn new(
        config: &'a FixConfig,
        requester: &'a dyn FixRequester,
        verifier: &'a dyn Verifier,
        checkpointer: &'a dyn Checkpointer,
    ) -> Self {
        Self {
            config,
            requester,
            verifier,
            checkpointer,
            abort: None,
        }
    }

    /// Stop before the next file once `flag` is set.
    pub fn with_abort_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.abort = Some(flag);
        self
    }

    fn aborted(&self) -> bool {
        self.abort
            .as_ref()
            .map(|flag| flag.load(Ordering::SeqCst))
            .unwrap_or(false)
    }

    /// Remediate every file implicated by `report`.
    pub async fn run(&self, report: &ErrorReport) -> RunReport {
        info!("Starting auto-fix process...");
        let mut run = RunReport::new(report.clone());

        let files = files_to_fix(report);
        info!("Files to fix: {:?}", files);

        let remediation = RemediationLoop::new(self.requester, self.verifier, self.checkpointer);

        for path in files {
            if self.aborted() {
                warn!("Run aborted before {}", path);
                break;
            }

            let full_path = match self.config.resolve(&path) {
                Ok(full_path) => full_path,
                Err(e) => {
                    warn!("Skipping {}: {}", path, e);
                    continue;
                }
            };
            if !full_path.is_file() {
                info!("File {} does not exist, skipping.", path);
                continue;
            }

            let content = match std::fs::read_to_string(&full_path) {
                Ok(content) => content,
                Err(e) => {
                    warn!("Could not read {}: {}", path, e);
                    continue;
                }
            };

            let errors = errors_for_file(report, &path);
            if errors.is_empty() {
                info!("No specific errors found for {}, skipping.", path);
                continue;
            }

            let task = FileTask::new(
                path.clone(),
                Language::from_path(&path),
                content,
                errors,
                self.config.max_attempts,
            );
            let result = remediation.run(task).await;
            run.add_result(result);
        }

        run.finalize();
        if run.success {
            info!("Successfully fixed at least one file!");
        } else {
            info!("Failed to fix any files.");
        }
        run
    }
}

/// Distinct files to remediate, in report order.
///
/// Lint keys come first, then test keys. The affected-files list is only
/// consulted when unattributed test failures are present.
pub fn files_to_fix(report: &ErrorReport) -> Vec<String> {
    let mut files: Vec<String> = Vec::new();
    let mut push = |path: &str| {
        if path != GENERAL_KEY && !files.iter().any(|f| f == path) {
            files.push(path.to_string());
        }
    };

    for path in report.lint.keys() {
        push(path);
    }
    for path in report.test.keys() {
        push(path);
    }
    if report.has_general_failures() {
        for path in &report.affected_files {
            push(path);
        }
    }
    files
}

/// Initial descriptors for `path`: its lint errors, its test errors, then
/// every unattributed test failure. Lists are concatenated as-is.
pub fn errors_for_file(report: &ErrorReport, path: &str) -> Vec<ErrorDescriptor> {
    let mut errors = Vec::new();

    for entry in report.lint.get(path).into_iter().flatten() {
        errors.push(ErrorDescriptor::lint(&entry.message, entry.line, entry.column));
    }
    for entry in report.test.get(path).into_iter().flatten() {
        errors.push(ErrorDescriptor::test(&entry.message, &entry.details));
    }
    for entry in report.test.get(GENERAL_KEY).into_iter().flatten() {
        errors.push(ErrorDescriptor::general(&entry.message));
    }
    errors
}
