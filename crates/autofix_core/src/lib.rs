//! # autofix_core
//!
//! Remediation engine for autofix.
//!
//! This crate owns the per-file fix/verify loop and everything it depends on
//! that is not an external service: the error model, extraction of errors
//! from tool output, report parsing, git checkpointing and the batch
//! coordinator that walks an error report file by file.
//!
//! # Architecture
//!
//! - **Error Extractor**: turns verification output into [`ErrorDescriptor`]s
//! - **Remediation Loop**: `Pending → Attempting → Verifying → Fixed | Retrying | Exhausted`
//! - **Batch Coordinator**: selects files from an [`ErrorReport`] and runs the loop for each
//! - **Collaborators**: [`FixRequester`], [`Verifier`] and [`Checkpointer`] traits
//!
//! # Example
//!
//! ```rust,ignore
//! use autofix_core::{BatchCoordinator, ErrorReport, FixConfig, GitCheckpointer};
//!
//! let config = FixConfig::for_workspace(".").with_max_attempts(3);
//! let checkpointer = GitCheckpointer::new(config.clone());
//! let coordinator = BatchCoordinator::new(&config, &requester, &verifier, &checkpointer);
//!
//! let report = ErrorReport::from_json_parts(&lint_json, &test_json, &affected_json)?;
//! let run = coordinator.run(&report).await;
//! println!("fixed: {:?}", run.fixed_files());
//! ```

pub mod config;
pub mod coordinator;
pub mod error;
pub mod extract;
pub mod git;
pub mod model;
pub mod parsers;
pub mod remediation;
pub mod report;
pub mod task;
pub mod traits;

pub use config::{FixConfig, DEFAULT_COMMIT_TEMPLATE, DEFAULT_MAX_ATTEMPTS};
pub use coordinator::{errors_for_file, files_to_fix, BatchCoordinator};
pub use error::{CoreError, CoreResult};
pub use extract::{extract, extract_bytes, MAX_FALLBACK_LINES, MAX_SYNTHETIC_CHARS};
pub use git::{GitCheckpointer, GitOps};
pub use model::{Checkpoint, ErrorDescriptor, ErrorOrigin, FixSuggestion, Language, VerificationOutcome};
pub use parsers::{
    collect_lint_findings, collect_test_failures, default_test_parsers, LocationMarkerParser,
    PylintParser, PytestFailureParser, TestOutputParser,
};
pub use remediation::{RemediationLoop, RemediationResult};
pub use report::{ErrorReport, LintEntry, RunReport, TestEntry, GENERAL_KEY};
pub use task::{AttemptOutcome, AttemptRecord, FileTask, TaskStatus};
pub use traits::{Checkpointer, FixRequest, FixRequester, Verifier};
