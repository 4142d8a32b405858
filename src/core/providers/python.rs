//! Python validation steps: ruff for formatting and lint, pytest for tests.

use std::fs;

use crate::context::ProjectContext;
use crate::ecosystem::EcosystemKind;
use crate::provider::Provider;
use crate::step::{Criticality, Phase, ValidationStep};

pub struct PythonProvider;

const KIND: EcosystemKind = EcosystemKind::Python;

impl Provider for PythonProvider {
    fn kind(&self) -> EcosystemKind {
        KIND
    }

    fn steps(&self, phase: Phase) -> Vec<ValidationStep> {
        match phase {
            Phase::Preflight => vec![
                ValidationStep::command(
                    "python-format",
                    "ruff format check",
                    KIND,
                    phase,
                    Criticality::Fatal,
                    "ruff",
                    &["format", "--check", "."],
                ),
                ValidationStep::command(
                    "python-lint",
                    "ruff lint",
                    KIND,
                    phase,
                    Criticality::Fatal,
                    "ruff",
                    &["check", "."],
                ),
                ValidationStep::command(
                    "python-test",
                    "pytest",
                    KIND,
                    phase,
                    Criticality::Fatal,
                    "pytest",
                    &["-q"],
                ),
            ],
            Phase::Postflight => vec![
                ValidationStep::command(
                    "python-test-full",
                    "pytest full suite",
                    KIND,
                    phase,
                    Criticality::Advisory,
                    "pytest",
                    &["-q", "--tb=short"],
                ),
                ValidationStep::command(
                    "python-security",
                    "safety audit",
                    KIND,
                    phase,
                    Criticality::Advisory,
                    "safety",
                    &["check"],
                ),
            ],
        }
    }

    fn unavailable(&self, _ctx: &ProjectContext) -> bool {
        which::which("python3").is_err() && which::which("python").is_err()
    }

    fn skip_reason(&self, step: &ValidationStep, ctx: &ProjectContext) -> Option<String> {
        let options = ctx.config.provider(KIND).options;
        match step.id.as_str() {
            "python-format" | "python-lint" => tool_missing("ruff"),
            "python-test" | "python-test-full" => {
                if super::tests_disabled(&options) {
                    return Some("tests disabled by configuration".to_string());
                }
                if !has_test_files(ctx) {
                    return Some("no test files present".to_string());
                }
                tool_missing("pytest")
            }
            "python-security" => tool_missing("safety"),
            _ => None,
        }
    }
}

fn tool_missing(tool: &str) -> Option<String> {
    if which::which(tool).is_err() {
        Some(format!("{} not available", tool))
    } else {
        None
    }
}

/// A `tests/` directory or any `test_*.py` at the root counts.
fn has_test_files(ctx: &ProjectContext) -> bool {
    if ctx.root.join("tests").is_dir() {
        return true;
    }
    let Ok(entries) = fs::read_dir(&ctx.root) else {
        return false;
    };
    entries.flatten().any(|e| {
        let name = e.file_name();
        let name = name.to_string_lossy();
        name.starts_with("test_") && name.ends_with(".py")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::collections::BTreeSet;

    fn context(temp: &tempfile::TempDir) -> ProjectContext {
        ProjectContext::new(
            temp.path().to_path_buf(),
            BTreeSet::from([KIND]),
            Config::default(),
        )
    }

    #[test]
    fn preflight_order_is_format_lint_test() {
        let ids: Vec<_> = PythonProvider
            .steps(Phase::Preflight)
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec!["python-format", "python-lint", "python-test"]);
    }

    #[test]
    fn postflight_steps_are_advisory() {
        for step in PythonProvider.steps(Phase::Postflight) {
            assert_eq!(step.criticality, Criticality::Advisory, "{}", step.id);
        }
    }

    #[test]
    fn tests_skipped_when_no_test_files() {
        let temp = tempfile::tempdir().unwrap();
        let ctx = context(&temp);
        let step = PythonProvider
            .steps(Phase::Preflight)
            .into_iter()
            .find(|s| s.id == "python-test")
            .unwrap();

        let reason = PythonProvider.skip_reason(&step, &ctx).unwrap();
        assert_eq!(reason, "no test files present");
    }

    #[test]
    fn tests_disabled_by_option() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::create_dir(temp.path().join("tests")).unwrap();
        let mut ctx = context(&temp);
        let mut provider_cfg = crate::config::ProviderConfig::default();
        provider_cfg
            .options
            .insert("skip_tests".to_string(), "true".to_string());
        ctx.config.providers.insert("python".to_string(), provider_cfg);

        let step = PythonProvider
            .steps(Phase::Preflight)
            .into_iter()
            .find(|s| s.id == "python-test")
            .unwrap();
        assert_eq!(
            PythonProvider.skip_reason(&step, &ctx).unwrap(),
            "tests disabled by configuration"
        );
    }
}
