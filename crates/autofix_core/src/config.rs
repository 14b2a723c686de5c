//! Run configuration.

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Default number of fix attempts per file.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default commit message template. `{attempt}` and `{path}` are substituted.
pub const DEFAULT_COMMIT_TEMPLATE: &str = "fix: Auto-fix attempt {attempt} for {path}";

/// Configuration shared by the coordinator and every remediation loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixConfig {
    /// Repository working tree.
    pub workspace_root: PathBuf,
    /// Attempt ceiling per file.
    pub max_attempts: u32,
    /// Commit message template for checkpoints.
    pub commit_template: String,
}

impl Default for FixConfig {
    fn default() -> Self {
        Self {
            workspace_root: PathBuf::from("."),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            commit_template: DEFAULT_COMMIT_TEMPLATE.to_string(),
        }
    }
}

impl FixConfig {
    pub fn for_workspace(path: impl Into<PathBuf>) -> Self {
        Self {
            workspace_root: path.into(),
            ..Self::default()
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_commit_template(mut self, template: impl Into<String>) -> Self {
        self.commit_template = template.into();
        self
    }

    /// Reject configurations the loop cannot run with.
    pub fn validate(&self) -> CoreResult<()> {
        if self.max_attempts == 0 {
            return Err(CoreError::InvalidConfig(
                "max attempts must be at least 1".to_string(),
            ));
        }
        if !self.workspace_root.is_dir() {
            return Err(CoreError::InvalidConfig(format!(
                "workspace root {} is not a directory",
                self.workspace_root.display()
            )));
        }
        Ok(())
    }

    /// Location of a report path inside the workspace.
    ///
    /// Paths are normalized lexically; anything that lands outside
    /// `workspace_root` is rejected.
    pub fn resolve(&self, path: &str) -> CoreResult<PathBuf> {
        let root = if self.workspace_root.is_absolute() {
            normalize(&self.workspace_root)
        } else {
            normalize(&std::env::current_dir()?.join(&self.workspace_root))
        };
        let resolved = normalize(&root.join(path));
        let escapes = resolved.components().any(|c| c == Component::ParentDir);
        if escapes || resolved == root || !resolved.starts_with(&root) {
            return Err(CoreError::OutsideWorkspace(path.to_string()));
        }
        Ok(resolved)
    }

    /// Commit message for a checkpoint.
    pub fn commit_message(&self, path: &str, attempt: u32) -> String {
        self.commit_template
            .replace("{attempt}", &attempt.to_string())
            .replace("{path}", path)
    }
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}
