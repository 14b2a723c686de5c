//! `collect` command: gather pylint and pytest failures from a local
//! checkout.
//!
//! When a log directory holds `*.log` files they are read instead of
//! running the tool.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use tracing::{debug, info, warn};

use autofix_core::{collect_lint_findings, collect_test_failures, default_test_parsers, ErrorReport};
use autofix_runner::{CommandSpec, LocalRunner, ProcessRunner, DEFAULT_TIMEOUT_SECONDS};

use super::OutputArgs;
use crate::output::ActionsOutput;

#[derive(Args, Debug)]
pub struct CollectArgs {
    /// Directory of saved lint logs
    #[arg(long, default_value = "artifacts/lint-logs")]
    pub lint_logs: PathBuf,

    /// Directory of saved test logs
    #[arg(long, default_value = "artifacts/test-logs")]
    pub test_logs: PathBuf,

    /// Paths passed to pylint
    #[arg(long = "lint-path", default_value = ".")]
    pub lint_paths: Vec<String>,

    /// Project root the tools run in
    #[arg(short, long, default_value = ".")]
    pub workspace: PathBuf,

    /// Timeout per tool run in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECONDS)]
    pub timeout: u64,

    #[command(flatten)]
    pub output: OutputArgs,
}

pub async fn execute(args: CollectArgs) -> Result<()> {
    let runner = LocalRunner::new();
    let report = gather(&runner, &args).await?;

    info!(
        "Found lint errors in {} file(s), test errors in {} file(s)",
        report.lint.len(),
        report.test.len()
    );

    let output = ActionsOutput::new(args.output.github_output.clone());
    output.set("error_details", &report.details())?;
    output.set_json("error-files", &report.error_files())?;
    output.set_error_report(&report)
}

async fn gather<R: ProcessRunner>(runner: &R, args: &CollectArgs) -> Result<ErrorReport> {
    let mut report = ErrorReport::new();

    let lint_output = match read_logs(&args.lint_logs)? {
        Some(text) => text,
        None => {
            let spec = CommandSpec::new("python")
                .args(["-m", "pylint"])
                .args(args.lint_paths.iter().cloned())
                .args(["--exit-zero", "--output-format=text"])
                .workdir(&args.workspace)
                .timeout(args.timeout);
            run_tool(runner, &spec).await
        }
    };
    let lint = collect_lint_findings(&lint_output, &mut report);
    debug!("Recorded {} lint finding(s)", lint);

    let test_output = match read_logs(&args.test_logs)? {
        Some(text) => text,
        None => {
            let spec = CommandSpec::new("python")
                .args(["-m", "pytest", "-v"])
                .workdir(&args.workspace)
                .timeout(args.timeout);
            run_tool(runner, &spec).await
        }
    };
    let tests = collect_test_failures(&default_test_parsers(), &test_output, &mut report);
    debug!("Recorded {} test failure(s)", tests);

    Ok(report)
}

/// Concatenated `*.log` files under `dir`, or `None` when there are none.
fn read_logs(dir: &Path) -> Result<Option<String>> {
    if !dir.is_dir() {
        return Ok(None);
    }

    let pattern = dir.join("*.log");
    let mut paths: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())
        .context("Invalid log directory pattern")?
        .filter_map(|entry| entry.ok())
        .collect();
    if paths.is_empty() {
        return Ok(None);
    }
    paths.sort();

    let mut text = String::new();
    for path in paths {
        let bytes = std::fs::read(&path)
            .with_context(|| format!("Failed to read log {}", path.display()))?;
        text.push_str(&String::from_utf8_lossy(&bytes));
        text.push('\n');
    }
    Ok(Some(text))
}

/// Tool output; a tool that cannot be run contributes nothing.
async fn run_tool<R: ProcessRunner>(runner: &R, spec: &CommandSpec) -> String {
    info!("Running {}", spec);
    match runner.run(spec).await {
        Ok(result) => result.combined_output(),
        Err(e) => {
            warn!("Could not run {}: {}", spec.program, e);
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autofix_runner::{MockResponse, MockRunner};
    use tempfile::TempDir;

    fn args(root: &Path) -> CollectArgs {
        CollectArgs {
            lint_logs: root.join("lint-logs"),
            test_logs: root.join("test-logs"),
            lint_paths: vec![".".to_string()],
            workspace: root.to_path_buf(),
            timeout: 60,
            output: OutputArgs { github_output: None },
        }
    }

    #[tokio::test]
    async fn test_runs_pylint_then_pytest() {
        let temp = TempDir::new().unwrap();
        let runner = MockRunner::new().with_responses(vec![
            MockResponse::success(
                "************* Module app\napp/main.py:12:4: W0612: Unused variable 'x' (unused-variable)\n",
            ),
            MockResponse::failure(1, "").with_stdout(
                "=== short test summary info ===\nFAILED tests/test_main.py::test_add - assert 1 == 2\n",
            ),
        ]);

        let report = gather(&runner, &args(temp.path())).await.unwrap();

        let commands = runner.commands();
        assert_eq!(commands.len(), 2);
        assert!(commands[0].contains("-m pylint . --exit-zero --output-format=text"));
        assert!(commands[1].contains("-m pytest -v"));

        assert_eq!(report.lint["app/main.py"][0].line, Some(12));
        assert!(report.test.contains_key("tests/test_main.py"));
    }

    #[tokio::test]
    async fn test_prefers_saved_logs() {
        let temp = TempDir::new().unwrap();
        let logs = temp.path().join("lint-logs");
        std::fs::create_dir_all(&logs).unwrap();
        std::fs::write(
            logs.join("pylint.log"),
            "pkg/util.py:3:0: C0114: Missing module docstring (missing-module-docstring)\n",
        )
        .unwrap();

        let runner = MockRunner::new();
        let report = gather(&runner, &args(temp.path())).await.unwrap();

        // Only pytest is run; the lint side came from the log.
        assert_eq!(runner.call_count(), 1);
        assert_eq!(report.lint["pkg/util.py"][0].column, Some(0));
    }

    #[tokio::test]
    async fn test_unavailable_tool_yields_empty_report() {
        let temp = TempDir::new().unwrap();
        let runner = MockRunner::new().simulate_failure("python: not found");

        let report = gather(&runner, &args(temp.path())).await.unwrap();
        assert!(report.is_empty());
    }

    #[test]
    fn test_empty_log_dir_is_ignored() {
        let temp = TempDir::new().unwrap();
        assert!(read_logs(temp.path()).unwrap().is_none());
        assert!(read_logs(&temp.path().join("missing")).unwrap().is_none());
    }
}
