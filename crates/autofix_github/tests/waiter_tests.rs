//! Integration tests for check polling and error collection.
//!
//! A scripted `ChecksApi` stands in for GitHub; the poll interval is zero.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use autofix_core::GENERAL_KEY;
use autofix_github::{
    Annotation, CheckRun, CheckWaiter, ChecksApi, GitHubError, GitHubResult, WaiterConfig,
};

#[derive(Default)]
struct FakeChecks {
    polls: Mutex<VecDeque<GitHubResult<Vec<CheckRun>>>>,
    outputs: HashMap<u64, String>,
    annotations: HashMap<u64, Vec<Annotation>>,
    list_calls: Mutex<u32>,
}

impl FakeChecks {
    fn poll(self, result: GitHubResult<Vec<CheckRun>>) -> Self {
        self.polls.lock().push_back(result);
        self
    }

    fn output(mut self, id: u64, text: &str) -> Self {
        self.outputs.insert(id, text.to_string());
        self
    }

    fn annotations(mut self, id: u64, annotations: Vec<Annotation>) -> Self {
        self.annotations.insert(id, annotations);
        self
    }
}

#[async_trait]
impl ChecksApi for FakeChecks {
    async fn list_check_runs(&self, _git_ref: &str) -> GitHubResult<Vec<CheckRun>> {
        *self.list_calls.lock() += 1;
        self.polls.lock().pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn check_run_output(&self, check_run_id: u64) -> GitHubResult<String> {
        self.outputs
            .get(&check_run_id)
            .cloned()
            .ok_or_else(|| GitHubError::Api {
                status: 404,
                message: "Not Found".to_string(),
            })
    }

    async fn list_annotations(&self, check_run_id: u64) -> GitHubResult<Vec<Annotation>> {
        Ok(self.annotations.get(&check_run_id).cloned().unwrap_or_default())
    }
}

fn run(id: u64, name: &str, status: &str, conclusion: Option<&str>) -> CheckRun {
    CheckRun {
        id,
        name: name.to_string(),
        status: status.to_string(),
        conclusion: conclusion.map(String::from),
    }
}

fn annotation(path: &str, line: u32, column: Option<u32>, message: &str) -> Annotation {
    Annotation {
        path: path.to_string(),
        message: message.to_string(),
        start_line: Some(line),
        start_column: column,
    }
}

fn config(max_polls: u32) -> WaiterConfig {
    WaiterConfig::default()
        .with_max_polls(max_polls)
        .with_poll_interval(Duration::ZERO)
}

#[tokio::test]
async fn test_polls_until_lint_and_test_complete() {
    let api = FakeChecks::default()
        .poll(Ok(vec![
            run(1, "ESLint", "completed", Some("success")),
            run(2, "jest", "in_progress", None),
        ]))
        .poll(Err(GitHubError::Api {
            status: 502,
            message: "Bad Gateway".to_string(),
        }))
        .poll(Ok(vec![
            run(1, "ESLint", "completed", Some("success")),
            run(2, "jest", "completed", Some("success")),
        ]));

    let waiter = CheckWaiter::new(api, config(5));
    let checks = waiter.wait_for_checks("abc123").await.unwrap();

    assert_eq!(checks.lint.len(), 1);
    assert_eq!(checks.test.len(), 1);
    assert_eq!(*waiter.api().list_calls.lock(), 3);
}

#[tokio::test]
async fn test_times_out_when_checks_never_complete() {
    let api = FakeChecks::default().poll(Ok(vec![run(1, "lint", "completed", Some("success"))]));

    let waiter = CheckWaiter::new(api, config(3));
    let err = waiter.wait_for_checks("abc123").await.unwrap_err();

    assert!(matches!(err, GitHubError::Timeout { polls: 3 }));
    assert_eq!(*waiter.api().list_calls.lock(), 3);
}

#[tokio::test]
async fn test_collects_lint_annotations_and_test_failures() {
    let api = FakeChecks::default()
        .poll(Ok(vec![
            run(1, "lint", "completed", Some("failure")),
            run(2, "Unit Tests", "completed", Some("failure")),
            run(3, "prettier", "completed", Some("success")),
        ]))
        .annotations(
            1,
            vec![
                annotation("src/a.js", 3, Some(5), "'x' is not defined"),
                annotation("src/a.js", 9, None, "Missing semicolon"),
                annotation("src/b.js", 1, None, "Unexpected var"),
            ],
        )
        .annotations(3, vec![annotation("src/ignored.js", 1, None, "not failed")])
        .output(2, "Running suite\nError at src/c.js:42\n1 failing");

    let report = CheckWaiter::new(api, config(1)).run("abc123").await.unwrap();

    let a = &report.lint["src/a.js"];
    assert_eq!(a.len(), 2);
    assert_eq!(a[0].line, Some(3));
    assert_eq!(a[0].column, Some(5));
    assert_eq!(a[1].column, None);
    assert!(!report.lint.contains_key("src/ignored.js"));

    assert_eq!(report.test["src/c.js"][0].message, "Test failure in src/c.js");
    assert_eq!(report.test["src/c.js"][0].details, "Error at src/c.js:42");
    assert!(!report.has_general_failures());
    assert_eq!(report.affected_files, vec!["src/a.js", "src/b.js", "src/c.js"]);
}

#[tokio::test]
async fn test_unattributed_failures_go_under_general_key() {
    let output = "FAIL test/app.test.js\n  ● renders\n\nTests: 1 failed, 3 passed";
    let api = FakeChecks::default()
        .poll(Ok(vec![
            run(1, "lint", "completed", Some("success")),
            run(2, "test", "completed", Some("failure")),
        ]))
        .output(2, output);

    let report = CheckWaiter::new(api, config(1)).run("abc123").await.unwrap();

    let general = &report.test[GENERAL_KEY];
    assert_eq!(general.len(), 1);
    assert_eq!(general[0].message, "Test failures detected");
    assert_eq!(general[0].details, output);
    assert!(report.affected_files.is_empty());
}

#[tokio::test]
async fn test_output_without_fail_is_not_recorded() {
    let api = FakeChecks::default()
        .poll(Ok(vec![
            run(1, "lint", "completed", Some("success")),
            run(2, "test", "completed", Some("failure")),
        ]))
        .output(2, "Process exited with code 137");

    let report = CheckWaiter::new(api, config(1)).run("abc123").await.unwrap();
    assert!(report.is_empty());
}

#[tokio::test]
async fn test_missing_test_details_are_skipped() {
    let api = FakeChecks::default()
        .poll(Ok(vec![
            run(1, "lint", "completed", Some("success")),
            run(2, "mocha", "completed", Some("failure")),
            run(4, "cypress", "completed", Some("failure")),
        ]))
        .output(4, "Failed at cypress/e2e/login.cy.js:12");

    let report = CheckWaiter::new(api, config(1)).run("abc123").await.unwrap();

    assert_eq!(report.test.len(), 1);
    assert!(report.test.contains_key("cypress/e2e/login.cy.js"));
}
