//! `fix` command: remediate every file named in an error report.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use serde_json::json;
use tracing::{info, warn};

use autofix_core::{
    BatchCoordinator, ErrorReport, FixConfig, GitCheckpointer, RunReport, DEFAULT_MAX_ATTEMPTS,
};
use autofix_llm::{LlmAdapter, LlmFixRequester};
use autofix_runner::{CommandDetector, CommandVerifier, LocalRunner, DEFAULT_TIMEOUT_SECONDS};

use super::OutputArgs;
use crate::output::ActionsOutput;

#[derive(Args, Debug)]
pub struct FixArgs {
    /// Lint errors as JSON: path -> [{message, line, column}]
    #[arg(long, env = "LINT_ERRORS", default_value = "{}")]
    pub lint_errors: String,

    /// Test errors as JSON: path -> [{message, details}]
    #[arg(long, env = "TEST_ERRORS", default_value = "{}")]
    pub test_errors: String,

    /// Files affected by the failing checks, as a JSON array
    #[arg(long, env = "AFFECTED_FILES", default_value = "[]")]
    pub affected_files: String,

    /// Attempts per file
    #[arg(long, env = "MAX_ATTEMPTS", default_value_t = DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: u32,

    /// Repository checkout to fix
    #[arg(short, long, default_value = ".")]
    pub workspace: PathBuf,

    /// Commit message template ({path} and {attempt} are substituted)
    #[arg(long)]
    pub commit_template: Option<String>,

    /// Timeout for each verification command in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECONDS)]
    pub verify_timeout: u64,

    /// Also write the full run report as JSON to this path
    #[arg(long)]
    pub report: Option<PathBuf>,

    #[command(flatten)]
    pub output: OutputArgs,
}

pub async fn execute(args: FixArgs) -> Result<()> {
    let mut config = FixConfig::for_workspace(&args.workspace).with_max_attempts(args.max_attempts);
    if let Some(template) = &args.commit_template {
        config = config.with_commit_template(template.clone());
    }
    config.validate()?;

    let report = ErrorReport::from_json_parts(&args.lint_errors, &args.test_errors, &args.affected_files)
        .context("Failed to parse error report")?;

    let adapter = LlmAdapter::from_env()?;
    info!("Using {} model {}", adapter.provider().name(), adapter.model());
    let requester = LlmFixRequester::new(adapter);

    let verifier = CommandVerifier::new(LocalRunner::new(), CommandDetector::new(&config.workspace_root))
        .with_timeout(args.verify_timeout);
    let checkpointer = GitCheckpointer::new(config.clone());

    let abort = Arc::new(AtomicBool::new(false));
    let signal_flag = Arc::clone(&abort);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping after the current file");
            signal_flag.store(true, Ordering::SeqCst);
        }
    });

    let run = BatchCoordinator::new(&config, &requester, &verifier, &checkpointer)
        .with_abort_flag(abort)
        .run(&report)
        .await;

    write_outputs(&ActionsOutput::new(args.output.github_output.clone()), &run)?;

    if let Some(path) = &args.report {
        let json = serde_json::to_string_pretty(&run)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        info!("Report written to {}", path.display());
    }

    if !run.success {
        bail!("Failed to fix any files");
    }

    info!("Fixed {} file(s): {:?}", run.fixed_files().len(), run.fixed_files());
    Ok(())
}

fn write_outputs(output: &ActionsOutput, run: &RunReport) -> Result<()> {
    output.set("success", if run.success { "true" } else { "false" })?;
    output.set_json(
        "original-errors",
        &json!({
            "lint": run.original_errors.lint,
            "test": run.original_errors.test,
        }),
    )?;
    output.set("changes-made", &run.changes_made)?;
    output.set("verification-results", &run.verification_results)
}
