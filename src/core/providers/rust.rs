//! Rust validation steps driven through cargo.

use crate::context::ProjectContext;
use crate::ecosystem::EcosystemKind;
use crate::provider::Provider;
use crate::step::{Criticality, Phase, ValidationStep};

pub struct RustProvider;

const KIND: EcosystemKind = EcosystemKind::Rust;

impl Provider for RustProvider {
    fn kind(&self) -> EcosystemKind {
        KIND
    }

    fn steps(&self, phase: Phase) -> Vec<ValidationStep> {
        match phase {
            Phase::Preflight => vec![
                ValidationStep::command(
                    "rust-format",
                    "cargo fmt check",
                    KIND,
                    phase,
                    Criticality::Fatal,
                    "cargo",
                    &["fmt", "--", "--check"],
                ),
                ValidationStep::command(
                    "rust-check",
                    "cargo check",
                    KIND,
                    phase,
                    Criticality::Fatal,
                    "cargo",
                    &["check", "--quiet"],
                ),
                ValidationStep::command(
                    "rust-clippy",
                    "cargo clippy",
                    KIND,
                    phase,
                    Criticality::Fatal,
                    "cargo",
                    &["clippy", "--quiet", "--", "-D", "warnings"],
                ),
                ValidationStep::command(
                    "rust-test",
                    "cargo test",
                    KIND,
                    phase,
                    Criticality::Fatal,
                    "cargo",
                    &["test", "--quiet"],
                ),
            ],
            Phase::Postflight => vec![
                ValidationStep::command(
                    "rust-test-all",
                    "cargo test workspace",
                    KIND,
                    phase,
                    Criticality::Fatal,
                    "cargo",
                    &["test", "--workspace", "--quiet"],
                ),
                ValidationStep::command(
                    "rust-build-release",
                    "cargo build release",
                    KIND,
                    phase,
                    Criticality::Advisory,
                    "cargo",
                    &["build", "--release", "--quiet"],
                ),
            ],
        }
    }

    fn unavailable(&self, _ctx: &ProjectContext) -> bool {
        which::which("cargo").is_err()
    }

    fn skip_reason(&self, step: &ValidationStep, ctx: &ProjectContext) -> Option<String> {
        match step.id.as_str() {
            "rust-test" | "rust-test-all"
                if super::tests_disabled(&ctx.config.provider(KIND).options) =>
            {
                Some("tests disabled by configuration".to_string())
            }
            // rustfmt and clippy ship as cargo subcommands but can be absent
            // on minimal toolchains.
            "rust-format" if which::which("rustfmt").is_err() => {
                Some("rustfmt not available".to_string())
            }
            "rust-clippy" if which::which("cargo-clippy").is_err() => {
                Some("clippy not available".to_string())
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preflight_order_is_fail_fast() {
        let ids: Vec<_> = RustProvider
            .steps(Phase::Preflight)
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(
            ids,
            vec!["rust-format", "rust-check", "rust-clippy", "rust-test"]
        );
    }

    #[test]
    fn release_build_is_advisory() {
        let steps = RustProvider.steps(Phase::Postflight);
        let release = steps.iter().find(|s| s.id == "rust-build-release").unwrap();
        assert_eq!(release.criticality, Criticality::Advisory);

        let test_all = steps.iter().find(|s| s.id == "rust-test-all").unwrap();
        assert_eq!(test_all.criticality, Criticality::Fatal);
    }
}
