//! Runner that executes commands on the local machine.

use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{RunnerError, RunnerResult};
use crate::runner::{CommandSpec, ExecutionResult, ProcessRunner};

/// Executes commands with `tokio::process`, killing them on timeout.
#[derive(Debug, Clone, Default)]
pub struct LocalRunner;

impl LocalRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessRunner for LocalRunner {
    async fn run(&self, spec: &CommandSpec) -> RunnerResult<ExecutionResult> {
        if spec.program.trim().is_empty() {
            return Err(RunnerError::InvalidCommand("empty program".to_string()));
        }

        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &spec.workdir {
            cmd.current_dir(dir);
        }

        debug!("Executing: {}", spec);

        let started_at = Utc::now();
        let start = Instant::now();

        let child = cmd.spawn().map_err(|e| RunnerError::SpawnFailed {
            program: spec.program.clone(),
            message: e.to_string(),
        })?;

        let output = if spec.timeout_seconds > 0 {
            match tokio::time::timeout(
                Duration::from_secs(spec.timeout_seconds),
                child.wait_with_output(),
            )
            .await
            {
                Ok(result) => result?,
                Err(_) => {
                    warn!("{} timed out after {}s", spec, spec.timeout_seconds);
                    return Err(RunnerError::Timeout(spec.timeout_seconds));
                }
            }
        } else {
            child.wait_with_output().await?
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        let exit_code = output.status.code().unwrap_or(-1);
        debug!(
            "{} exited with {} in {}ms ({} bytes stdout, {} bytes stderr)",
            spec,
            exit_code,
            duration_ms,
            output.stdout.len(),
            output.stderr.len()
        );

        Ok(ExecutionResult {
            exit_code,
            stdout: output.stdout,
            stderr: output.stderr,
            started_at,
            finished_at: Utc::now(),
            duration_ms,
        })
    }
}
