//! # autofix_github
//!
//! GitHub check-run polling for autofix.
//!
//! [`CheckWaiter`] waits until a commit has completed lint and test checks,
//! then turns failed checks into an [`autofix_core::ErrorReport`]: lint
//! annotations become per-file lint entries, test output is attributed to
//! files with the core report parsers.

pub mod api;
pub mod error;
pub mod waiter;

pub use api::{Annotation, CheckRun, ChecksApi, GitHubChecks, RepoSlug};
pub use error::{GitHubError, GitHubResult};
pub use waiter::{CheckWaiter, CompletedChecks, WaiterConfig};
