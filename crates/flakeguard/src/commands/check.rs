//! Check command - verify the environment before running flaky jobs
//!
//! Confirms that the retry configuration resolves and validates, and that
//! every required tool can be found on `PATH`.

use anyhow::{anyhow, Result};
use camino::Utf8Path;
use flakeguard_core::ConfigLoader;

use crate::cli::CheckArgs;
use crate::output;

/// Outcome of one verification
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    pub detail: String,
}

impl CheckResult {
    fn pass(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: true,
            detail: detail.into(),
        }
    }

    fn fail(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: false,
            detail: detail.into(),
        }
    }
}

pub fn run(args: CheckArgs, config_path: Option<&Utf8Path>) -> Result<()> {
    let loader = super::loader(config_path);
    let results = run_checks(&loader, &args.required_tools);

    output::header("Environment checks");
    for result in &results {
        let line = format!("{}: {}", result.name, result.detail);
        if result.passed {
            output::success(&line);
        } else {
            output::error(&line);
        }
    }

    let passed = results.iter().filter(|r| r.passed).count();
    output::kv("passed", &format!("{}/{}", passed, results.len()));

    if passed == results.len() {
        Ok(())
    } else {
        Err(anyhow!("{} check(s) failed", results.len() - passed))
    }
}

/// Run every check without printing
pub fn run_checks(loader: &ConfigLoader, required_tools: &[String]) -> Vec<CheckResult> {
    let mut results = Vec::with_capacity(required_tools.len() + 1);

    let source = loader
        .config_file()
        .map(|path| path.to_string())
        .unwrap_or_else(|| "embedded defaults".to_string());

    results.push(match loader.load() {
        Ok(config) => CheckResult::pass(
            "configuration",
            format!(
                "{} (default: {} attempts, {})",
                source, config.default.max_attempts, config.default.strategy
            ),
        ),
        Err(e) => CheckResult::fail("configuration", format!("{}: {}", source, e)),
    });

    for tool in required_tools {
        results.push(match which::which(tool) {
            Ok(path) => CheckResult::pass(tool.as_str(), path.display().to_string()),
            Err(_) => CheckResult::fail(tool.as_str(), "not found on PATH"),
        });
    }

    tracing::debug!(
        checks = results.len(),
        failed = results.iter().filter(|r| !r.passed).count(),
        "environment checks finished"
    );

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    fn isolated_loader(dir: &TempDir) -> ConfigLoader {
        ConfigLoader::new()
            .with_dir(Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap())
            .with_env(Vec::<(String, String)>::new())
    }

    #[test]
    fn test_defaults_pass() {
        let dir = TempDir::new().unwrap();
        let results = run_checks(&isolated_loader(&dir), &[]);

        assert_eq!(results.len(), 1);
        assert!(results[0].passed);
        assert!(results[0].detail.contains("embedded defaults"));
    }

    #[test]
    fn test_missing_tool_fails() {
        let dir = TempDir::new().unwrap();
        let results = run_checks(
            &isolated_loader(&dir),
            &["flakeguard-no-such-tool".to_string()],
        );

        assert_eq!(results.len(), 2);
        assert!(!results[1].passed);
        assert_eq!(results[1].detail, "not found on PATH");
    }

    #[test]
    fn test_invalid_config_fails() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("config.yaml"),
            "default:\n  max-attempts: 0\n",
        )
        .unwrap();

        let results = run_checks(&isolated_loader(&dir), &[]);

        assert!(!results[0].passed);
        assert!(results[0].detail.contains("max-attempts"));
    }
}
