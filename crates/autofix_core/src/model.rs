//! Shared value types passed between the remediation loop and its collaborators.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Language family of a source file, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    JavaScriptTypeScript,
    Python,
    Java,
    Ruby,
    Go,
    Php,
    CCpp,
    CSharp,
    Html,
    Css,
    Unknown,
}

impl Language {
    /// Detect the language from a file path's extension.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("js" | "jsx" | "ts" | "tsx") => Self::JavaScriptTypeScript,
            Some("py") => Self::Python,
            Some("java") => Self::Java,
            Some("rb") => Self::Ruby,
            Some("go") => Self::Go,
            Some("php") => Self::Php,
            Some("c" | "cpp" | "h" | "hpp") => Self::CCpp,
            Some("cs") => Self::CSharp,
            Some("html" | "htm") => Self::Html,
            Some("css" | "scss" | "sass" | "less") => Self::Css,
            _ => Self::Unknown,
        }
    }

    /// Human-readable label used in prompts and logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::JavaScriptTypeScript => "JavaScript/TypeScript",
            Self::Python => "Python",
            Self::Java => "Java",
            Self::Ruby => "Ruby",
            Self::Go => "Go",
            Self::Php => "PHP",
            Self::CCpp => "C/C++",
            Self::CSharp => "C#",
            Self::Html => "HTML",
            Self::Css => "CSS",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Where an error descriptor came from. Controls how it is rendered for the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorOrigin {
    /// Lint annotation reported by a check run.
    Lint,
    /// Test failure attributed to a specific file.
    Test,
    /// Test failure with no attributable file.
    General,
    /// Line extracted from a local verification command.
    Verification,
}

/// A single normalized error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDescriptor {
    pub message: String,
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub detail: Option<String>,
    pub origin: ErrorOrigin,
}

impl ErrorDescriptor {
    pub fn lint(message: impl Into<String>, line: Option<u32>, column: Option<u32>) -> Self {
        Self {
            message: message.into(),
            line,
            column,
            detail: None,
            origin: ErrorOrigin::Lint,
        }
    }

    pub fn test(message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: None,
            column: None,
            detail: Some(detail.into()),
            origin: ErrorOrigin::Test,
        }
    }

    pub fn general(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: None,
            column: None,
            detail: None,
            origin: ErrorOrigin::General,
        }
    }

    pub fn verification(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: None,
            column: None,
            detail: None,
            origin: ErrorOrigin::Verification,
        }
    }

    /// Render the descriptor as a single line of model-facing text.
    pub fn render(&self) -> String {
        match self.origin {
            ErrorOrigin::Lint => {
                let line = self
                    .line
                    .map(|l| l.to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                match self.column.filter(|&col| col != 0) {
                    Some(col) => format!("Lint error at line {}, column {}: {}", line, col, self.message),
                    None => format!("Lint error at line {}: {}", line, self.message),
                }
            }
            ErrorOrigin::Test => format!(
                "Test error: {} - {}",
                self.message,
                self.detail.as_deref().unwrap_or_default()
            ),
            ErrorOrigin::General => format!(
                "General test error that might relate to this file: {}",
                self.message
            ),
            ErrorOrigin::Verification => self.message.clone(),
        }
    }
}

impl fmt::Display for ErrorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Reply from a fix requester.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixSuggestion {
    /// Full replacement content for the file.
    Replacement(String),
    /// The requester had nothing to offer.
    NoSuggestion,
}

/// Result of re-running a verification command against a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VerificationOutcome {
    Success {
        command: String,
        detail: String,
    },
    Failure {
        command: Option<String>,
        detail: String,
        errors: Vec<ErrorDescriptor>,
    },
    /// No verification command applies to this file.
    NoCommand,
}

impl VerificationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Human-readable detail. Empty for [`VerificationOutcome::NoCommand`].
    pub fn detail(&self) -> &str {
        match self {
            Self::Success { detail, .. } | Self::Failure { detail, .. } => detail,
            Self::NoCommand => "",
        }
    }

    /// Errors extracted from the verification output, if any.
    pub fn errors(&self) -> &[ErrorDescriptor] {
        match self {
            Self::Failure { errors, .. } => errors,
            _ => &[],
        }
    }
}

/// A committed replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub commit: String,
    pub diff: String,
}
