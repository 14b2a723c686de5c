//! Attribution of free-text tool output to source files.
//!
//! Every test framework reports failures differently, so attribution is a
//! strategy per framework. Callers run a list of parsers over the same text
//! and merge what they find into an [`ErrorReport`].

use std::sync::OnceLock;

use regex::Regex;

use crate::report::{ErrorReport, LintEntry, TestEntry};

/// Attributes test failures in raw output to file paths.
pub trait TestOutputParser: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Return `(path, entry)` pairs in the order they appear in `output`.
    fn parse(&self, output: &str) -> Vec<(String, TestEntry)>;
}

/// Matches `Error at <path>:<line>` and `Failed at <path>:<line>` markers.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocationMarkerParser;

impl TestOutputParser for LocationMarkerParser {
    fn name(&self) -> &'static str {
        "location-marker"
    }

    fn parse(&self, output: &str) -> Vec<(String, TestEntry)> {
        static ERROR_AT: OnceLock<Regex> = OnceLock::new();
        static FAILED_AT: OnceLock<Regex> = OnceLock::new();
        let error_at = ERROR_AT.get_or_init(|| Regex::new(r"Error at .*?:\d+").expect("pattern is valid"));
        let failed_at = FAILED_AT.get_or_init(|| Regex::new(r"Failed at .*?:\d+").expect("pattern is valid"));

        error_at
            .find_iter(output)
            .chain(failed_at.find_iter(output))
            .filter_map(|m| {
                let marker = m.as_str();
                let location = marker
                    .strip_prefix("Error at ")
                    .or_else(|| marker.strip_prefix("Failed at "))?;
                let path = location.split(':').next()?.trim();
                if path.is_empty() || !path.contains('.') {
                    return None;
                }
                Some((
                    path.to_string(),
                    TestEntry {
                        message: format!("Test failure in {}", path),
                        details: marker.to_string(),
                    },
                ))
            })
            .collect()
    }
}

/// Attributes pytest `FAILED` summary lines to every `.py` path they mention.
#[derive(Debug, Default, Clone, Copy)]
pub struct PytestFailureParser;

impl TestOutputParser for PytestFailureParser {
    fn name(&self) -> &'static str {
        "pytest"
    }

    fn parse(&self, output: &str) -> Vec<(String, TestEntry)> {
        static FAILED: OnceLock<Regex> = OnceLock::new();
        static PY_PATH: OnceLock<Regex> = OnceLock::new();
        let failed = FAILED.get_or_init(|| Regex::new(r"FAILED\s+[^\n]+").expect("pattern is valid"));
        let py_path = PY_PATH.get_or_init(|| Regex::new(r"[a-zA-Z0-9_/]+\.py").expect("pattern is valid"));

        let mut found = Vec::new();
        for line in failed.find_iter(output) {
            let line = line.as_str().trim_end();
            for path in py_path.find_iter(line) {
                found.push((
                    path.as_str().to_string(),
                    TestEntry {
                        message: format!("Test failure: {}", line),
                        details: line.to_string(),
                    },
                ));
            }
        }
        found
    }
}

/// Parses pylint text output: `path:line:col: CODE: message`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PylintParser;

impl PylintParser {
    pub fn parse(&self, output: &str) -> Vec<(String, LintEntry)> {
        static LINT_LINE: OnceLock<Regex> = OnceLock::new();
        let re = LINT_LINE.get_or_init(|| {
            Regex::new(r"^([^:]+):(\d+):(\d+): ([A-Z]\d+): (.+)$").expect("pattern is valid")
        });

        output
            .lines()
            .filter_map(|line| {
                let caps = re.captures(line.trim())?;
                Some((
                    caps[1].trim().to_string(),
                    LintEntry {
                        message: format!("{}: {}", &caps[4], &caps[5]),
                        line: caps[2].parse().ok(),
                        column: caps[3].parse().ok(),
                    },
                ))
            })
            .collect()
    }
}

/// Parsers applied to test check output, in order.
pub fn default_test_parsers() -> Vec<Box<dyn TestOutputParser>> {
    vec![Box::new(LocationMarkerParser), Box::new(PytestFailureParser)]
}

/// Run every parser over `output`, recording attributed failures in `report`.
///
/// Returns the number of failures recorded.
pub fn collect_test_failures(
    parsers: &[Box<dyn TestOutputParser>],
    output: &str,
    report: &mut ErrorReport,
) -> usize {
    let mut recorded = 0;
    for parser in parsers {
        for (path, entry) in parser.parse(output) {
            report.add_test(path, entry);
            recorded += 1;
        }
    }
    recorded
}

/// Record pylint findings in `report`. Returns the number recorded.
pub fn collect_lint_findings(output: &str, report: &mut ErrorReport) -> usize {
    let findings = PylintParser.parse(output);
    let count = findings.len();
    for (path, entry) in findings {
        report.add_lint(path, entry);
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::GENERAL_KEY;

    #[test]
    fn test_location_markers() {
        let output = "Running suite\nError at src/math.js:12 expected 3\nFailed at test/math.test.js:40\nError at nowhere:3\n";
        let found = LocationMarkerParser.parse(output);

        let paths: Vec<&str> = found.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(paths, vec!["src/math.js", "test/math.test.js"]);
        assert_eq!(found[0].1.message, "Test failure in src/math.js");
        assert_eq!(found[0].1.details, "Error at src/math.js:12");
    }

    #[test]
    fn test_pytest_failures() {
        let output = "=== short test summary info ===\n\
                      FAILED tests/test_calculator.py::test_divide - ZeroDivisionError\n\
                      PASSED tests/test_calculator.py::test_add\n";
        let found = PytestFailureParser.parse(output);

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, "tests/test_calculator.py");
        assert!(found[0].1.message.starts_with("Test failure: FAILED tests/test_calculator.py"));
    }

    #[test]
    fn test_pylint_lines() {
        let output = "************* Module calculator.calculator\n\
                      calculator/calculator.py:5:0: W0611: Unused import random (unused-import)\n\
                      calculator/calculator.py:12:4: E0602: Undefined variable 'y' (undefined-variable)\n\
                      \n\
                      Your code has been rated at 5.00/10\n";
        let found = PylintParser.parse(output);

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].0, "calculator/calculator.py");
        assert_eq!(found[0].1.line, Some(5));
        assert_eq!(found[0].1.column, Some(0));
        assert_eq!(found[0].1.message, "W0611: Unused import random (unused-import)");
    }

    #[test]
    fn test_collect_merges_into_report() {
        let mut report = ErrorReport::new();
        let parsers = default_test_parsers();
        let output = "Error at a.js:1\nFAILED tests/test_b.py::test_x\n";

        let recorded = collect_test_failures(&parsers, output, &mut report);

        assert_eq!(recorded, 2);
        assert!(report.test.contains_key("a.js"));
        assert!(report.test.contains_key("tests/test_b.py"));
        assert!(!report.test.contains_key(GENERAL_KEY));
        assert_eq!(report.affected_files.len(), 2);
    }
}
