//! Git operations for checkpointing fix attempts.
//!
//! Every accepted replacement is written to the working tree, committed on
//! its own, and the commit's diff for that file is kept for the run report.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use crate::config::FixConfig;
use crate::error::{CoreError, CoreResult};
use crate::model::Checkpoint;
use crate::traits::Checkpointer;

/// Git operations manager.
#[derive(Debug, Clone)]
pub struct GitOps {
    repo_path: PathBuf,
}

impl GitOps {
    /// Create a new Git operations manager for a repository.
    pub fn new<P: AsRef<Path>>(repo_path: P) -> Self {
        Self {
            repo_path: repo_path.as_ref().to_path_buf(),
        }
    }

    /// Check if Git is available on the system.
    pub fn is_git_available() -> bool {
        Command::new("git")
            .arg("--version")
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    /// Check if `repo_path` is inside a git working tree.
    pub fn is_initialized(&self) -> bool {
        Command::new("git")
            .args(["rev-parse", "--is-inside-work-tree"])
            .current_dir(&self.repo_path)
            .output()
            .map(|output| output.status.success() && output.stdout.starts_with(b"true"))
            .unwrap_or(false)
    }

    fn run(&self, args: &[&str]) -> CoreResult<String> {
        debug!("git {}", args.join(" "));
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo_path)
            .output()
            .map_err(|e| CoreError::GitError(format!("Failed to run git {}: {}", args[0], e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            if stdout.contains("nothing to commit") || stderr.contains("nothing to commit") {
                return Err(CoreError::GitError("Nothing to commit".to_string()));
            }
            return Err(CoreError::GitError(format!(
                "git {} failed: {}",
                args[0],
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Initialize a Git repository.
    pub fn init(&self) -> CoreResult<()> {
        if self.is_initialized() {
            debug!("Repository already initialized");
            return Ok(());
        }

        info!("Initializing Git repository at {}", self.repo_path.display());
        self.run(&["init"]).map(|_| ())
    }

    /// Set the committer identity for this repository only.
    pub fn configure_identity(&self, name: &str, email: &str) -> CoreResult<()> {
        self.run(&["config", "--local", "user.name", name])?;
        self.run(&["config", "--local", "user.email", email])?;
        Ok(())
    }

    /// Add files to staging.
    pub fn add(&self, paths: &[&str]) -> CoreResult<()> {
        if !self.is_initialized() {
            return Err(CoreError::GitError("Repository not initialized".to_string()));
        }

        let mut args = vec!["add", "--"];
        args.extend(paths);
        self.run(&args).map(|_| ())
    }

    /// Commit staged changes and return the new commit hash.
    pub fn commit(&self, message: &str) -> CoreResult<String> {
        if !self.is_initialized() {
            return Err(CoreError::GitError("Repository not initialized".to_string()));
        }

        self.run(&["commit", "-m", message])?;
        self.head_commit()
    }

    /// Hash of the current HEAD commit.
    pub fn head_commit(&self) -> CoreResult<String> {
        Ok(self.run(&["rev-parse", "HEAD"])?.trim().to_string())
    }

    fn head_has_parent(&self) -> bool {
        self.run(&["rev-parse", "--verify", "--quiet", "HEAD~1"]).is_ok()
    }

    /// Diff of `path` introduced by the HEAD commit.
    pub fn diff_last_commit(&self, path: &str) -> CoreResult<String> {
        if self.head_has_parent() {
            self.run(&["diff", "HEAD~1", "HEAD", "--", path])
        } else {
            self.run(&["show", "--format=", "HEAD", "--", path])
        }
    }
}

/// Writes replacements to the working tree and commits each one.
#[derive(Debug, Clone)]
pub struct GitCheckpointer {
    git: GitOps,
    config: FixConfig,
}

impl GitCheckpointer {
    pub fn new(config: FixConfig) -> Self {
        Self {
            git: GitOps::new(&config.workspace_root),
            config,
        }
    }

    fn persist(&self, path: &str, content: &str, attempt: u32) -> CoreResult<Checkpoint> {
        std::fs::write(self.config.resolve(path)?, content)?;
        info!("Updated {} with suggested fixes", path);

        self.git.add(&[path])?;
        let commit = self.git.commit(&self.config.commit_message(path, attempt))?;
        let diff = self.git.diff_last_commit(path)?;

        Ok(Checkpoint { commit, diff })
    }
}

impl Checkpointer for GitCheckpointer {
    fn checkpoint(&self, path: &str, content: &str, attempt: u32) -> CoreResult<Checkpoint> {
        self.persist(path, content, attempt)
            .map_err(|e| CoreError::CheckpointFailed {
                path: path.to_string(),
                message: e.to_string(),
            })
    }
}
