//! # autofix_runner
//!
//! Local verification for autofix.
//!
//! After a fix is committed, the project's own tooling is re-run against the
//! working tree to decide whether the fix held. This crate selects that
//! command from project markers, executes it and turns the result into a
//! [`autofix_core::VerificationOutcome`].
//!
//! # Features
//!
//! - **Command Detection**: lint scripts, ad-hoc linters, type checks, test suites
//! - **Local Runner**: `tokio::process` execution with timeouts
//! - **Mock Runner**: scripted responses for tests without tooling installed
//!
//! # Example
//!
//! ```rust,no_run
//! use autofix_core::{Language, Verifier};
//! use autofix_runner::{CommandDetector, CommandVerifier, LocalRunner};
//!
//! #[tokio::main]
//! async fn main() {
//!     let verifier = CommandVerifier::new(LocalRunner::new(), CommandDetector::new("."));
//!     let outcome = verifier.verify("calculator/calculator.py", Language::Python).await;
//!     println!("{}", outcome.detail());
//! }
//! ```

pub mod detect;
pub mod error;
pub mod local;
pub mod mock;
pub mod runner;
pub mod verifier;

pub use detect::{CommandDetector, CommandTier, VerificationCommand};
pub use error::{RunnerError, RunnerResult};
pub use local::LocalRunner;
pub use mock::{CapturedCall, MockResponse, MockRunner};
pub use runner::{CommandSpec, ExecutionResult, ProcessRunner, DEFAULT_TIMEOUT_SECONDS};
pub use verifier::CommandVerifier;
