//! Verification of fixed files by re-running project tooling.

use async_trait::async_trait;
use tracing::{info, warn};

use autofix_core::{extract_bytes, Language, VerificationOutcome, Verifier};

use crate::detect::CommandDetector;
use crate::runner::{ProcessRunner, DEFAULT_TIMEOUT_SECONDS};

/// Runs the detected verification command for a file and interprets the result.
pub struct CommandVerifier<R: ProcessRunner> {
    runner: R,
    detector: CommandDetector,
    timeout_seconds: u64,
}

impl<R: ProcessRunner> CommandVerifier<R> {
    pub fn new(runner: R, detector: CommandDetector) -> Self {
        Self {
            runner,
            detector,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }
}

#[async_trait]
impl<R: ProcessRunner> Verifier for CommandVerifier<R> {
    async fn verify(&self, path: &str, language: Language) -> VerificationOutcome {
        info!("Verifying fix for {}", path);

        let Some(command) = self.detector.detect(path) else {
            warn!("Could not determine a verification command for {}", path);
            return VerificationOutcome::NoCommand;
        };

        let spec = command.spec.timeout(self.timeout_seconds);
        let command_display = spec.display();
        info!("Running verification command: {}", command_display);

        let result = match self.runner.run(&spec).await {
            Ok(result) => result,
            Err(e) => {
                warn!("Verification of {} could not run: {}", path, e);
                return VerificationOutcome::Failure {
                    command: Some(command_display),
                    detail: format!("Exception during verification: {}", e),
                    errors: Vec::new(),
                };
            }
        };

        if result.success() {
            let stdout = result.stdout_lossy();
            let output = if stdout.is_empty() { "No output" } else { stdout.as_str() };
            return VerificationOutcome::Success {
                detail: format!("Command `{}` executed successfully!\n\nOutput:\n{}", command_display, output),
                command: command_display,
            };
        }

        let raw = result.error_output();
        let errors = extract_bytes(raw, path, language);
        info!(
            "Verification failed for {} (exit {}, {} errors extracted)",
            path,
            result.exit_code,
            errors.len()
        );

        VerificationOutcome::Failure {
            detail: format!(
                "Command `{}` failed!\n\nError:\n{}",
                command_display,
                String::from_utf8_lossy(raw)
            ),
            command: Some(command_display),
            errors,
        }
    }
}
