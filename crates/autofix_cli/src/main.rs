//! autofix CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error, or no file could be fixed
//! - 2: Invalid arguments or configuration
//! - 3: Timed out waiting for checks

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod output;

use autofix_core::CoreError;
use autofix_github::GitHubError;
use autofix_llm::LlmError;
use commands::{Cli, Commands};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_CONFIG: u8 = 2;
    pub const CHECKS_TIMEOUT: u8 = 3;
}

fn init_logging(verbose: bool, json: bool) {
    let default_level = if verbose { "autofix=debug" } else { "autofix=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("{},warn", default_level))
    });

    let registry = tracing_subscriber::registry().with(filter);
    let result = if json {
        registry.with(fmt::layer().json().with_target(false)).try_init()
    } else {
        registry.with(fmt::layer().with_target(false)).try_init()
    };

    if result.is_err() {
        // Logging already initialized, continue
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.json_logs);

    let result = match cli.command {
        Commands::Wait(args) => commands::wait::execute(args).await,
        Commands::Collect(args) => commands::collect::execute(args).await,
        Commands::Fix(args) => commands::fix::execute(args).await,
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            eprintln!("❌ Error: {:#}", e);
            ExitCode::from(categorize_error(&e))
        }
    }
}

/// Map an error to its exit code by inspecting the typed causes in its chain.
fn categorize_error(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        if let Some(err) = cause.downcast_ref::<GitHubError>() {
            return match err {
                GitHubError::Timeout { .. } => ExitCodes::CHECKS_TIMEOUT,
                GitHubError::InvalidRepo(_) | GitHubError::MissingToken => ExitCodes::INVALID_CONFIG,
                _ => ExitCodes::GENERAL_ERROR,
            };
        }
        if let Some(err) = cause.downcast_ref::<CoreError>() {
            return match err {
                CoreError::InvalidConfig(_) | CoreError::InvalidReport(_) => ExitCodes::INVALID_CONFIG,
                _ => ExitCodes::GENERAL_ERROR,
            };
        }
        if let Some(LlmError::NotConfigured) = cause.downcast_ref::<LlmError>() {
            return ExitCodes::INVALID_CONFIG;
        }
    }
    ExitCodes::GENERAL_ERROR
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_timeout_exit_code() {
        let err = anyhow::Error::new(GitHubError::Timeout { polls: 30 });
        assert_eq!(categorize_error(&err), ExitCodes::CHECKS_TIMEOUT);
    }

    #[test]
    fn test_invalid_config_exit_code_through_context() {
        let result: Result<(), CoreError> =
            Err(CoreError::InvalidReport("lint errors is not valid JSON".to_string()));
        let err = result.context("Failed to parse error report").unwrap_err();
        assert_eq!(categorize_error(&err), ExitCodes::INVALID_CONFIG);

        let err = anyhow::Error::new(GitHubError::InvalidRepo("nope".to_string()));
        assert_eq!(categorize_error(&err), ExitCodes::INVALID_CONFIG);

        let err = anyhow::Error::new(LlmError::NotConfigured);
        assert_eq!(categorize_error(&err), ExitCodes::INVALID_CONFIG);
    }

    #[test]
    fn test_general_exit_code() {
        let err = anyhow::anyhow!("Failed to fix any files");
        assert_eq!(categorize_error(&err), ExitCodes::GENERAL_ERROR);
    }
}
