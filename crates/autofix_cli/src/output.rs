//! GitHub Actions step outputs.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;

use autofix_core::ErrorReport;

/// Writes `name=value` step outputs to `GITHUB_OUTPUT`, or to stdout.
pub struct ActionsOutput {
    path: Option<PathBuf>,
}

impl ActionsOutput {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    /// Record one output value.
    pub fn set(&self, name: &str, value: &str) -> Result<()> {
        match &self.path {
            Some(path) => {
                let mut file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .with_context(|| format!("Failed to open output file {}", path.display()))?;
                file.write_all(delimited(name, value).as_bytes())
                    .with_context(|| format!("Failed to write output {}", name))?;
            }
            None => print!("{}", inline(name, value)),
        }
        Ok(())
    }

    /// Record one output value as compact JSON.
    pub fn set_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)
            .with_context(|| format!("Failed to serialize output {}", name))?;
        self.set(name, &json)
    }

    /// The three error-map outputs shared by `wait` and `collect`.
    pub fn set_error_report(&self, report: &ErrorReport) -> Result<()> {
        self.set_json("lint-errors", &report.lint)?;
        self.set_json("test-errors", &report.test)?;
        self.set_json("affected-files", &report.affected_files)
    }
}

/// `name<<DELIM` block with a delimiter that cannot occur in `value`.
fn delimited(name: &str, value: &str) -> String {
    let mut delimiter = format!("ghadelimiter_{}", uuid::Uuid::new_v4().simple());
    while value.contains(&delimiter) {
        delimiter = format!("ghadelimiter_{}", uuid::Uuid::new_v4().simple());
    }
    format!("{}<<{}\n{}\n{}\n", name, delimiter, value, delimiter)
}

fn inline(name: &str, value: &str) -> String {
    if value.contains('\n') {
        delimited(name, value)
    } else {
        format!("{}={}\n", name, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autofix_core::{LintEntry, GENERAL_KEY, TestEntry};
    use tempfile::TempDir;

    fn parse_outputs(text: &str) -> Vec<(String, String)> {
        let mut outputs = Vec::new();
        let mut lines = text.lines();
        while let Some(line) = lines.next() {
            let (name, delimiter) = line.split_once("<<").unwrap();
            let mut value = Vec::new();
            for body in lines.by_ref() {
                if body == delimiter {
                    break;
                }
                value.push(body);
            }
            outputs.push((name.to_string(), value.join("\n")));
        }
        outputs
    }

    #[test]
    fn test_inline_single_line() {
        assert_eq!(inline("success", "true"), "success=true\n");
    }

    #[test]
    fn test_inline_multi_line_is_delimited() {
        let text = inline("changes-made", "a\nb");
        assert!(text.starts_with("changes-made<<ghadelimiter_"));
        assert_eq!(parse_outputs(&text), vec![("changes-made".to_string(), "a\nb".to_string())]);
    }

    #[test]
    fn test_file_outputs_are_appended() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("output");
        std::fs::write(&path, "").unwrap();

        let output = ActionsOutput::new(Some(path.clone()));
        output.set("success", "false").unwrap();
        output
            .set("verification-results", "\n### a.py - ❌ Attempt 1 failed\nboom\n")
            .unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let outputs = parse_outputs(&text);
        assert_eq!(outputs[0], ("success".to_string(), "false".to_string()));
        assert_eq!(outputs[1].0, "verification-results");
        assert!(outputs[1].1.contains("### a.py - ❌ Attempt 1 failed"));
    }

    #[test]
    fn test_error_report_outputs() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("output");

        let mut report = ErrorReport::new();
        report.add_lint("a.py", LintEntry { message: "m".into(), line: Some(2), column: None });
        report.add_test(GENERAL_KEY, TestEntry { message: "Test failures detected".into(), details: "x".into() });

        ActionsOutput::new(Some(path.clone()))
            .set_error_report(&report)
            .unwrap();

        let outputs = parse_outputs(&std::fs::read_to_string(&path).unwrap());
        let names: Vec<&str> = outputs.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["lint-errors", "test-errors", "affected-files"]);

        let parsed = ErrorReport::from_json_parts(&outputs[0].1, &outputs[1].1, &outputs[2].1).unwrap();
        assert_eq!(parsed, report);
    }
}
