//! `wait` command: poll GitHub checks for a commit and emit its errors.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use autofix_github::{CheckWaiter, GitHubChecks, RepoSlug, WaiterConfig};

use super::OutputArgs;
use crate::output::ActionsOutput;

#[derive(Args, Debug)]
pub struct WaitArgs {
    /// Repository as owner/name
    #[arg(long, env = "REPO")]
    pub repo: String,

    /// Commit whose check runs to wait for
    #[arg(long, env = "COMMIT_SHA")]
    pub commit_sha: String,

    /// Token for the GitHub API
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: String,

    /// Number of polls before giving up
    #[arg(long, default_value = "30")]
    pub max_polls: u32,

    /// Seconds between polls
    #[arg(long, default_value = "30")]
    pub poll_interval: u64,

    #[command(flatten)]
    pub output: OutputArgs,
}

pub async fn execute(args: WaitArgs) -> Result<()> {
    let repo: RepoSlug = args.repo.parse()?;
    info!("Checking {} at {}", repo, args.commit_sha);

    let api = GitHubChecks::new(repo, args.github_token)?;
    let config = WaiterConfig::default()
        .with_max_polls(args.max_polls)
        .with_poll_interval(Duration::from_secs(args.poll_interval));

    let report = CheckWaiter::new(api, config)
        .run(&args.commit_sha)
        .await
        .context("Failed to collect check errors")?;

    info!(
        "Found lint errors in {} file(s), test errors in {} file(s)",
        report.lint.len(),
        report.test.len()
    );

    ActionsOutput::new(args.output.github_output).set_error_report(&report)
}
