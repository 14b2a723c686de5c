//! Waiting for CI checks and turning their results into an error report.

use std::time::Duration;

use tracing::{info, warn};

use autofix_core::{
    collect_test_failures, default_test_parsers, ErrorReport, LintEntry, TestEntry,
    TestOutputParser, GENERAL_KEY,
};

use crate::api::{CheckRun, ChecksApi};
use crate::error::{GitHubError, GitHubResult};

/// Polling and classification settings.
#[derive(Debug, Clone)]
pub struct WaiterConfig {
    pub lint_check_names: Vec<String>,
    pub test_check_names: Vec<String>,
    pub max_polls: u32,
    pub poll_interval: Duration,
}

impl Default for WaiterConfig {
    fn default() -> Self {
        Self {
            lint_check_names: ["lint", "eslint", "prettier", "stylelint"]
                .into_iter()
                .map(String::from)
                .collect(),
            test_check_names: ["test", "jest", "mocha", "cypress"]
                .into_iter()
                .map(String::from)
                .collect(),
            max_polls: 30,
            poll_interval: Duration::from_secs(30),
        }
    }
}

impl WaiterConfig {
    pub fn with_max_polls(mut self, max_polls: u32) -> Self {
        self.max_polls = max_polls;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn is_lint_check(&self, name: &str) -> bool {
        matches_any(name, &self.lint_check_names)
    }

    pub fn is_test_check(&self, name: &str) -> bool {
        matches_any(name, &self.test_check_names)
    }
}

fn matches_any(name: &str, patterns: &[String]) -> bool {
    let name = name.to_lowercase();
    patterns.iter().any(|p| name.contains(&p.to_lowercase()))
}

/// Completed lint and test check runs for a commit.
#[derive(Debug, Clone, Default)]
pub struct CompletedChecks {
    pub lint: Vec<CheckRun>,
    pub test: Vec<CheckRun>,
}

impl CompletedChecks {
    fn is_ready(&self) -> bool {
        !self.lint.is_empty() && !self.test.is_empty()
    }
}

/// Polls a commit's check runs and collects errors from failed ones.
pub struct CheckWaiter<A: ChecksApi> {
    api: A,
    config: WaiterConfig,
    parsers: Vec<Box<dyn TestOutputParser>>,
}

impl<A: ChecksApi> CheckWaiter<A> {
    pub fn new(api: A, config: WaiterConfig) -> Self {
        Self {
            api,
            config,
            parsers: default_test_parsers(),
        }
    }

    /// Replace the test-output parsers.
    pub fn with_parsers(mut self, parsers: Vec<Box<dyn TestOutputParser>>) -> Self {
        self.parsers = parsers;
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    fn classify(&self, runs: Vec<CheckRun>) -> CompletedChecks {
        let mut checks = CompletedChecks::default();
        for run in runs.into_iter().filter(CheckRun::is_completed) {
            if self.config.is_lint_check(&run.name) {
                checks.lint.push(run.clone());
            }
            if self.config.is_test_check(&run.name) {
                checks.test.push(run);
            }
        }
        checks
    }

    /// Poll until at least one lint and one test check have completed.
    ///
    /// Failed API calls count against the poll budget.
    pub async fn wait_for_checks(&self, git_ref: &str) -> GitHubResult<CompletedChecks> {
        info!("Waiting for actions to complete for commit {}...", git_ref);

        for poll in 1..=self.config.max_polls {
            match self.api.list_check_runs(git_ref).await {
                Ok(runs) => {
                    let checks = self.classify(runs);
                    if checks.is_ready() {
                        info!("All relevant checks have completed.");
                        return Ok(checks);
                    }
                    info!(
                        "Waiting for checks to complete... Attempt {}/{}",
                        poll, self.config.max_polls
                    );
                }
                Err(e) => warn!("Error checking workflow status: {}", e),
            }

            if poll < self.config.max_polls {
                tokio::time::sleep(self.config.poll_interval).await;
            }
        }

        warn!("Timed out waiting for actions to complete.");
        Err(GitHubError::Timeout {
            polls: self.config.max_polls,
        })
    }

    /// Build an error report from the failed checks in `checks`.
    pub async fn collect_errors(&self, checks: &CompletedChecks) -> ErrorReport {
        let mut report = ErrorReport::new();

        for check in checks.lint.iter().filter(|c| c.is_failure()) {
            let annotations = match self.api.list_annotations(check.id).await {
                Ok(annotations) => annotations,
                Err(e) => {
                    warn!("Error getting annotations for {}: {}", check.name, e);
                    continue;
                }
            };
            for annotation in annotations {
                report.add_lint(
                    annotation.path,
                    LintEntry {
                        message: annotation.message,
                        line: annotation.start_line,
                        column: annotation.start_column,
                    },
                );
            }
        }

        for check in checks.test.iter().filter(|c| c.is_failure()) {
            let output = match self.api.check_run_output(check.id).await {
                Ok(output) => output,
                Err(e) => {
                    warn!("Error getting test details for {}: {}", check.name, e);
                    continue;
                }
            };

            let attributed = collect_test_failures(&self.parsers, &output, &mut report);
            info!("{}: {} test failures attributed to files", check.name, attributed);

            if report.test.is_empty() && output.contains("fail") {
                report.add_test(
                    GENERAL_KEY,
                    TestEntry {
                        message: "Test failures detected".to_string(),
                        details: output,
                    },
                );
            }
        }

        report
    }

    /// Wait for checks on `git_ref`, then collect their errors.
    pub async fn run(&self, git_ref: &str) -> GitHubResult<ErrorReport> {
        let checks = self.wait_for_checks(git_ref).await?;
        Ok(self.collect_errors(&checks).await)
    }
}
