//! CLI command definitions.
//!
//! Each subcommand is one step of the CI remediation pipeline.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

pub mod collect;
pub mod fix;
pub mod wait;

/// autofix - LLM-driven repair of failing lint and test checks
#[derive(Parser)]
#[command(name = "autofix")]
#[command(version, about = "autofix - LLM-driven repair of failing lint and test checks")]
#[command(long_about = r#"
autofix reads lint and test failures for a commit, asks a language model for
fixed file contents, commits each attempt and re-runs the project's own
tooling until the file passes or the attempt budget is spent.

WORKFLOWS:
  wait     → Wait for lint/test check runs on a commit and collect their errors
  collect  → Run pylint/pytest locally (or read their logs) and collect errors
  fix      → Remediate every file named in the collected errors

EXIT CODES:
  0 - Success (for fix: at least one file fixed)
  1 - General error, or no file fixed
  2 - Invalid arguments or configuration
  3 - Timed out waiting for checks
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Wait for check runs on a commit and collect lint/test errors
    Wait(wait::WaitArgs),

    /// Collect lint/test errors from local pylint and pytest runs
    Collect(collect::CollectArgs),

    /// Fix the files named in a lint/test error report
    Fix(fix::FixArgs),
}

/// Where step outputs are written.
#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// GitHub Actions output file (printed to stdout when unset)
    #[arg(long, env = "GITHUB_OUTPUT")]
    pub github_output: Option<PathBuf>,
}
