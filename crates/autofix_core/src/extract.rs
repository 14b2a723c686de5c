//! Error extraction from raw verification output.
//!
//! Linters and test runners print errors in many formats. Extraction keeps
//! lines that mention the file under repair and carry the language's
//! severity marker; when nothing matches it degrades to a generic
//! `error`/`fail` heuristic that ignores the file path.

use tracing::{debug, warn};

use crate::model::{ErrorDescriptor, Language};

/// Maximum number of lines kept by the generic fallback.
pub const MAX_FALLBACK_LINES: usize = 10;

/// Maximum length of the synthetic descriptor produced for unparseable output.
pub const MAX_SYNTHETIC_CHARS: usize = 500;

/// Extract error descriptors for `file_path` from captured tool output.
///
/// Output that is not valid UTF-8 cannot be split into lines reliably and
/// yields a single descriptor holding a truncated, lossily decoded copy.
pub fn extract_bytes(raw: &[u8], file_path: &str, language: Language) -> Vec<ErrorDescriptor> {
    match std::str::from_utf8(raw) {
        Ok(text) => extract(text, file_path, language),
        Err(e) => {
            warn!("Verification output for {} is not valid UTF-8: {}", file_path, e);
            let lossy = String::from_utf8_lossy(raw);
            vec![synthetic_descriptor(&lossy)]
        }
    }
}

/// Extract error descriptors for `file_path` from tool output text.
pub fn extract(raw: &str, file_path: &str, language: Language) -> Vec<ErrorDescriptor> {
    let specific: Vec<ErrorDescriptor> = raw
        .lines()
        .filter(|line| line.contains(file_path) && has_severity_marker(line, language))
        .map(|line| ErrorDescriptor::verification(line.trim()))
        .collect();

    if !specific.is_empty() || raw.trim().is_empty() {
        return specific;
    }

    let generic: Vec<ErrorDescriptor> = raw
        .lines()
        .filter(|line| !line.trim().is_empty() && (line.contains("error") || line.contains("fail")))
        .take(MAX_FALLBACK_LINES)
        .map(|line| ErrorDescriptor::verification(line.trim()))
        .collect();

    debug!(
        "No file-specific errors for {}; generic fallback kept {} lines",
        file_path,
        generic.len()
    );
    generic
}

fn has_severity_marker(line: &str, language: Language) -> bool {
    match language {
        Language::JavaScriptTypeScript => line.contains("error") || line.contains("warning"),
        Language::Python => line.contains("E:") || line.contains("W:"),
        _ => true,
    }
}

fn synthetic_descriptor(output: &str) -> ErrorDescriptor {
    let truncated: String = output.trim().chars().take(MAX_SYNTHETIC_CHARS).collect();
    ErrorDescriptor::verification(truncated)
}
