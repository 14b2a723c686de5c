//! Scripted process runner for tests.
//!
//! Replays canned tool results in order so verification and collection can
//! be exercised without linters or test suites installed.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use crate::error::{RunnerError, RunnerResult};
use crate::runner::{CommandSpec, ExecutionResult, ProcessRunner};

/// Canned result of one tool run.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub exit_code: i32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl MockResponse {
    /// Exit 0 with `stdout`.
    pub fn success(stdout: impl Into<Vec<u8>>) -> Self {
        Self {
            exit_code: 0,
            stdout: stdout.into(),
            stderr: Vec::new(),
        }
    }

    /// Non-zero exit with `stderr`.
    pub fn failure(exit_code: i32, stderr: impl Into<Vec<u8>>) -> Self {
        Self {
            exit_code,
            stdout: Vec::new(),
            stderr: stderr.into(),
        }
    }

    pub fn with_stdout(mut self, stdout: impl Into<Vec<u8>>) -> Self {
        self.stdout = stdout.into();
        self
    }

    fn into_result(self) -> ExecutionResult {
        let now = Utc::now();
        ExecutionResult {
            exit_code: self.exit_code,
            stdout: self.stdout,
            stderr: self.stderr,
            started_at: now,
            finished_at: now,
            duration_ms: 0,
        }
    }
}

/// One recorded `run` invocation.
#[derive(Debug, Clone)]
pub struct CapturedCall {
    pub command: String,
    pub program: String,
    pub args: Vec<String>,
    pub workdir: Option<String>,
}

#[derive(Default)]
struct Script {
    responses: Vec<MockResponse>,
    next: usize,
    spawn_error: Option<String>,
    calls: Vec<CapturedCall>,
}

/// Runner that records every command and answers from a script.
///
/// The script cycles once exhausted; an empty script answers every command
/// with a silent success. Clones share the script and the call log.
#[derive(Clone, Default)]
pub struct MockRunner {
    script: Arc<Mutex<Script>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one response to the script.
    pub fn add_response(self, response: MockResponse) -> Self {
        self.script.lock().responses.push(response);
        self
    }

    /// Replace the script.
    pub fn with_responses(self, responses: Vec<MockResponse>) -> Self {
        self.script.lock().responses = responses;
        self
    }

    /// Fail every run as if `program` could not be spawned.
    pub fn simulate_failure(self, message: impl Into<String>) -> Self {
        self.script.lock().spawn_error = Some(message.into());
        self
    }

    pub fn get_calls(&self) -> Vec<CapturedCall> {
        self.script.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.script.lock().calls.len()
    }

    /// Command lines in call order.
    pub fn commands(&self) -> Vec<String> {
        self.script
            .lock()
            .calls
            .iter()
            .map(|c| c.command.clone())
            .collect()
    }
}

#[async_trait]
impl ProcessRunner for MockRunner {
    async fn run(&self, spec: &CommandSpec) -> RunnerResult<ExecutionResult> {
        let mut script = self.script.lock();
        script.calls.push(CapturedCall {
            command: spec.display(),
            program: spec.program.clone(),
            args: spec.args.clone(),
            workdir: spec
                .workdir
                .as_ref()
                .map(|d| d.to_string_lossy().into_owned()),
        });

        if let Some(message) = &script.spawn_error {
            return Err(RunnerError::SpawnFailed {
                program: spec.program.clone(),
                message: message.clone(),
            });
        }

        if script.responses.is_empty() {
            return Ok(MockResponse::success("").into_result());
        }
        let index = script.next % script.responses.len();
        script.next += 1;
        Ok(script.responses[index].clone().into_result())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_command_and_workdir() {
        let runner = MockRunner::new();
        let spec = CommandSpec::new("python")
            .args(["-m", "pylint", "a.py"])
            .workdir("/repo");

        runner.run(&spec).await.unwrap();

        let calls = runner.get_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].command, "python -m pylint a.py");
        assert_eq!(calls[0].args, vec!["-m", "pylint", "a.py"]);
        assert_eq!(calls[0].workdir.as_deref(), Some("/repo"));
    }

    #[tokio::test]
    async fn test_script_cycles() {
        let runner = MockRunner::new().with_responses(vec![
            MockResponse::success("first"),
            MockResponse::failure(1, "second failed"),
        ]);
        let spec = CommandSpec::new("npm").arg("test");

        let first = runner.run(&spec).await.unwrap();
        assert_eq!(first.stdout, b"first");

        let second = runner.run(&spec).await.unwrap();
        assert_eq!(second.exit_code, 1);
        assert_eq!(second.stderr, b"second failed");

        let third = runner.run(&spec).await.unwrap();
        assert_eq!(third.stdout, b"first");
    }

    #[tokio::test]
    async fn test_spawn_error_is_still_recorded() {
        let runner = MockRunner::new().simulate_failure("No such file or directory");
        let err = runner.run(&CommandSpec::new("npx")).await.unwrap_err();
        assert!(err.to_string().contains("No such file or directory"));
        assert_eq!(runner.call_count(), 1);
    }
}
