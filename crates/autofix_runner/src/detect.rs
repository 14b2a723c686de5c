//! Verification command detection.
//!
//! Picks the command that best checks a single file from the project
//! markers present at the workspace root. The table is ordered; the first
//! matching row wins.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::runner::CommandSpec;

/// How specific a verification command is to the file being fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandTier {
    /// The project's own `lint` script.
    LintScript,
    /// The project's `eslint` script.
    AltLintScript,
    /// A linter invoked directly on the file.
    AdHocLinter,
    /// Whole-project type check.
    TypeChecker,
    /// The project's test suite.
    TestRunner,
}

/// A selected verification command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationCommand {
    pub tier: CommandTier,
    pub spec: CommandSpec,
}

impl VerificationCommand {
    fn new(tier: CommandTier, program: &str, args: &[&str]) -> Self {
        Self {
            tier,
            spec: CommandSpec::new(program).args(args.iter().copied()),
        }
    }
}

/// Inspects a workspace root for project markers.
#[derive(Debug, Clone)]
pub struct CommandDetector {
    root: PathBuf,
}

impl CommandDetector {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn exists(&self, name: &str) -> bool {
        self.root.join(name).exists()
    }

    fn any_exists(&self, names: &[&str]) -> bool {
        names.iter().any(|n| self.exists(n))
    }

    /// Names of the scripts declared in `package.json`, `None` without one.
    fn npm_scripts(&self) -> Option<Vec<String>> {
        let path = self.root.join("package.json");
        if !path.is_file() {
            return None;
        }

        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Could not read package.json: {}", e);
                return Some(Vec::new());
            }
        };

        match serde_json::from_str::<serde_json::Value>(&raw) {
            Ok(manifest) => Some(
                manifest
                    .get("scripts")
                    .and_then(|s| s.as_object())
                    .map(|scripts| scripts.keys().cloned().collect())
                    .unwrap_or_default(),
            ),
            Err(e) => {
                warn!("package.json is not valid JSON: {}", e);
                Some(Vec::new())
            }
        }
    }

    /// Select the verification command for `path`, if any applies.
    pub fn detect(&self, path: &str) -> Option<VerificationCommand> {
        let scripts = self.npm_scripts();
        let has_script =
            |name: &str| scripts.as_ref().is_some_and(|s| s.iter().any(|k| k == name));

        let ext = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();

        let lint = match ext {
            "js" | "jsx" => {
                if has_script("lint") {
                    Some(VerificationCommand::new(CommandTier::LintScript, "npm", &["run", "lint"]))
                } else if has_script("eslint") {
                    Some(VerificationCommand::new(CommandTier::AltLintScript, "npm", &["run", "eslint"]))
                } else if self.any_exists(&[".eslintrc", ".eslintrc.js", ".eslintrc.json"]) {
                    Some(VerificationCommand::new(CommandTier::AdHocLinter, "npx", &["eslint", path]))
                } else {
                    None
                }
            }
            "ts" | "tsx" => {
                if has_script("lint") {
                    Some(VerificationCommand::new(CommandTier::LintScript, "npm", &["run", "lint"]))
                } else if self.exists("tsconfig.json") {
                    Some(VerificationCommand::new(CommandTier::TypeChecker, "npx", &["tsc", "--noEmit"]))
                } else {
                    None
                }
            }
            "py" if self.any_exists(&["requirements.txt", "pyproject.toml"]) => Some(
                VerificationCommand::new(CommandTier::AdHocLinter, "python", &["-m", "pylint", path]),
            ),
            _ => None,
        };

        let command = lint.or_else(|| match &scripts {
            Some(_) if has_script("test") => {
                Some(VerificationCommand::new(CommandTier::TestRunner, "npm", &["test"]))
            }
            Some(_) => None,
            None if self.any_exists(&["pytest.ini", "conftest.py"]) => Some(
                VerificationCommand::new(CommandTier::TestRunner, "python", &["-m", "pytest"]),
            ),
            None if self.any_exists(&["build.gradle", "build.gradle.kts"]) => {
                Some(VerificationCommand::new(CommandTier::TestRunner, "./gradlew", &["test"]))
            }
            None => None,
        });

        match &command {
            Some(cmd) => debug!("Verification command for {}: {} ({:?})", path, cmd.spec, cmd.tier),
            None => debug!("No verification command for {}", path),
        }

        command.map(|mut cmd| {
            cmd.spec = cmd.spec.workdir(&self.root);
            cmd
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn project(files: &[(&str, &str)]) -> TempDir {
        let temp = TempDir::new().unwrap();
        for (name, content) in files {
            std::fs::write(temp.path().join(name), content).unwrap();
        }
        temp
    }

    fn detect(temp: &TempDir, path: &str) -> Option<(CommandTier, String)> {
        CommandDetector::new(temp.path())
            .detect(path)
            .map(|c| (c.tier, c.spec.display()))
    }

    #[test]
    fn test_js_prefers_lint_script() {
        let temp = project(&[
            ("package.json", r#"{"scripts": {"lint": "eslint .", "eslint": "eslint src", "test": "jest"}}"#),
            (".eslintrc.json", "{}"),
        ]);
        assert_eq!(
            detect(&temp, "src/a.js"),
            Some((CommandTier::LintScript, "npm run lint".to_string()))
        );
    }

    #[test]
    fn test_js_alt_lint_script() {
        let temp = project(&[("package.json", r#"{"scripts": {"eslint": "eslint src"}}"#)]);
        assert_eq!(
            detect(&temp, "src/a.jsx"),
            Some((CommandTier::AltLintScript, "npm run eslint".to_string()))
        );
    }

    #[test]
    fn test_js_eslintrc_without_scripts() {
        let temp = project(&[("package.json", r#"{"name": "x"}"#), (".eslintrc", "")]);
        assert_eq!(
            detect(&temp, "src/a.js"),
            Some((CommandTier::AdHocLinter, "npx eslint src/a.js".to_string()))
        );
    }

    #[test]
    fn test_ts_type_checker() {
        let temp = project(&[("tsconfig.json", "{}")]);
        assert_eq!(
            detect(&temp, "src/a.ts"),
            Some((CommandTier::TypeChecker, "npx tsc --noEmit".to_string()))
        );
    }

    #[test]
    fn test_ts_ignores_eslint_script() {
        let temp = project(&[
            ("package.json", r#"{"scripts": {"eslint": "eslint", "test": "jest"}}"#),
        ]);
        assert_eq!(
            detect(&temp, "a.tsx"),
            Some((CommandTier::TestRunner, "npm test".to_string()))
        );
    }

    #[test]
    fn test_python_pylint() {
        let temp = project(&[("requirements.txt", "pytest\n"), ("pytest.ini", "")]);
        assert_eq!(
            detect(&temp, "calculator/calculator.py"),
            Some((
                CommandTier::AdHocLinter,
                "python -m pylint calculator/calculator.py".to_string()
            ))
        );
    }

    #[test]
    fn test_python_falls_back_to_pytest() {
        let temp = project(&[("conftest.py", "")]);
        assert_eq!(
            detect(&temp, "a.py"),
            Some((CommandTier::TestRunner, "python -m pytest".to_string()))
        );
    }

    #[test]
    fn test_package_json_blocks_other_test_runners() {
        let temp = project(&[("package.json", "{}"), ("pytest.ini", "")]);
        assert_eq!(detect(&temp, "a.py"), None);
    }

    #[test]
    fn test_gradle_fallback() {
        let temp = project(&[("build.gradle.kts", "")]);
        assert_eq!(
            detect(&temp, "src/Main.java"),
            Some((CommandTier::TestRunner, "./gradlew test".to_string()))
        );
    }

    #[test]
    fn test_no_command() {
        let temp = project(&[]);
        assert_eq!(detect(&temp, "c.rb"), None);
    }

    #[test]
    fn test_invalid_package_json_has_no_scripts() {
        let temp = project(&[("package.json", "{not json"), (".eslintrc.js", "")]);
        assert_eq!(
            detect(&temp, "a.js"),
            Some((CommandTier::AdHocLinter, "npx eslint a.js".to_string()))
        );
    }

    #[test]
    fn test_command_runs_in_root() {
        let temp = project(&[("conftest.py", "")]);
        let cmd = CommandDetector::new(temp.path()).detect("a.py").unwrap();
        assert_eq!(cmd.spec.workdir.as_deref(), Some(temp.path()));
    }
}
