//! GitHub Checks API access.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::error::{GitHubError, GitHubResult};

const API_BASE: &str = "https://api.github.com";
const API_TIMEOUT_SECS: u64 = 60;
const USER_AGENT: &str = "autofix";

/// Maximum length for error body content in error messages
const MAX_ERROR_BODY_LEN: usize = 200;

/// `owner/name` repository identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoSlug {
    pub owner: String,
    pub name: String,
}

impl FromStr for RepoSlug {
    type Err = GitHubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty() => Ok(Self {
                owner: owner.to_string(),
                name: name.to_string(),
            }),
            _ => Err(GitHubError::InvalidRepo(s.to_string())),
        }
    }
}

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// A check run attached to a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRun {
    pub id: u64,
    pub name: String,
    /// `queued`, `in_progress` or `completed`.
    pub status: String,
    /// Set once completed: `success`, `failure`, `neutral`, ...
    #[serde(default)]
    pub conclusion: Option<String>,
}

impl CheckRun {
    pub fn is_completed(&self) -> bool {
        self.status == "completed"
    }

    pub fn is_failure(&self) -> bool {
        self.conclusion.as_deref() == Some("failure")
    }
}

/// A line-level annotation on a check run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub path: String,
    pub message: String,
    #[serde(default)]
    pub start_line: Option<u32>,
    #[serde(default)]
    pub start_column: Option<u32>,
}

/// Read access to check runs for a repository.
#[async_trait]
pub trait ChecksApi: Send + Sync {
    /// Check runs for a commit SHA, branch or tag.
    async fn list_check_runs(&self, git_ref: &str) -> GitHubResult<Vec<CheckRun>>;

    /// Free-text output of a check run (empty when it has none).
    async fn check_run_output(&self, check_run_id: u64) -> GitHubResult<String>;

    async fn list_annotations(&self, check_run_id: u64) -> GitHubResult<Vec<Annotation>>;
}

/// [`ChecksApi`] over the GitHub REST API.
pub struct GitHubChecks {
    client: reqwest::Client,
    repo: RepoSlug,
    token: String,
}

impl GitHubChecks {
    pub fn new(repo: RepoSlug, token: impl Into<String>) -> GitHubResult<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(GitHubError::MissingToken);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(API_TIMEOUT_SECS))
            .build()?;

        Ok(Self { client, repo, token })
    }

    pub fn repo(&self) -> &RepoSlug {
        &self.repo
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            API_BASE, self.repo.owner, self.repo.name, path
        )
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> GitHubResult<T> {
        let url = self.url(path);
        debug!("GET {}", url);

        let resp = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .header("Authorization", format!("Bearer {}", self.token))
            .header("User-Agent", USER_AGENT)
            .header("X-GitHub-Api-Version", "2022-11-28")
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GitHubError::Api {
                status: status.as_u16(),
                message: sanitize_error_body(&body),
            });
        }

        Ok(resp.json().await?)
    }
}

#[derive(Deserialize)]
struct CheckRunList {
    check_runs: Vec<CheckRun>,
}

#[derive(Deserialize)]
struct CheckRunDetail {
    #[serde(default)]
    output: Option<CheckRunOutput>,
}

#[derive(Deserialize)]
struct CheckRunOutput {
    #[serde(default)]
    text: Option<String>,
}

#[async_trait]
impl ChecksApi for GitHubChecks {
    async fn list_check_runs(&self, git_ref: &str) -> GitHubResult<Vec<CheckRun>> {
        let list: CheckRunList = self
            .get(&format!("commits/{}/check-runs?per_page=100", git_ref))
            .await?;
        Ok(list.check_runs)
    }

    async fn check_run_output(&self, check_run_id: u64) -> GitHubResult<String> {
        let detail: CheckRunDetail = self.get(&format!("check-runs/{}", check_run_id)).await?;
        Ok(detail.output.and_then(|o| o.text).unwrap_or_default())
    }

    async fn list_annotations(&self, check_run_id: u64) -> GitHubResult<Vec<Annotation>> {
        self.get(&format!("check-runs/{}/annotations?per_page=100", check_run_id))
            .await
    }
}

/// Truncate an API error body and redact anything that looks like a credential.
fn sanitize_error_body(body: &str) -> String {
    const SECRET_PATTERNS: &[&str] = &[
        "token",
        "secret",
        "password",
        "credential",
        "bearer",
        "ghp_",
        "gho_",
        "ghs_",
        "github_pat_",
    ];

    let truncated: String = if body.chars().count() > MAX_ERROR_BODY_LEN {
        let head: String = body.chars().take(MAX_ERROR_BODY_LEN).collect();
        format!("{}... (truncated)", head)
    } else {
        body.to_string()
    };

    let lower = truncated.to_lowercase();
    if SECRET_PATTERNS.iter().any(|p| lower.contains(p)) {
        return "(error details redacted - may contain sensitive data)".to_string();
    }

    truncated
}
