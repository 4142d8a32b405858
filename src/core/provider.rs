//! The provider capability contract and the registry that assembles enabled
//! providers for a run.

use std::time::Instant;

use crate::context::ProjectContext;
use crate::ecosystem::EcosystemKind;
use crate::providers;
use crate::step::{Phase, StepAction, StepResult, ValidationStep};
use crate::utils::command::{self, StepCommandOutcome};

/// One ecosystem's ordered validation steps.
///
/// Providers are stateless across invocations; everything a step needs
/// arrives through the [`ProjectContext`]. Step order within a phase is
/// fixed and significant: formatting before static analysis before tests
/// before build, so cheap deterministic checks fail first.
pub trait Provider: Send + Sync {
    fn kind(&self) -> EcosystemKind;

    /// The ordered step sequence for a phase.
    fn steps(&self, phase: Phase) -> Vec<ValidationStep>;

    /// True when the toolchain this provider's checks depend on is missing.
    /// An unavailable provider has all its steps converted to Skipped; it
    /// never aborts the workflow.
    fn unavailable(&self, ctx: &ProjectContext) -> bool;

    /// A reason this step does not apply right now (e.g. no test files).
    /// "Not applicable" becomes Skipped, never a silent Passed.
    fn skip_reason(&self, _step: &ValidationStep, _ctx: &ProjectContext) -> Option<String> {
        None
    }

    /// Execute one step and translate the outcome into a [`StepResult`].
    ///
    /// The default covers command steps: non-zero or abnormal exit is
    /// Failed, zero is Passed, timeout is a tagged failure. Providers with
    /// builtin checks override this and fall back to the default for their
    /// command steps.
    fn run_step(&self, step: &ValidationStep, ctx: &ProjectContext) -> StepResult {
        if let Some(reason) = self.skip_reason(step, ctx) {
            return StepResult::skipped(step, reason);
        }
        match &step.action {
            StepAction::Command { program, args } => run_command_step(step, ctx, program, args),
            StepAction::Builtin { check } => StepResult::failed(
                step,
                format!("No builtin check named '{}' in {} provider", check, self.kind()),
                0,
            ),
        }
    }
}

/// Run a command step under the configured timeout.
pub fn run_command_step(
    step: &ValidationStep,
    ctx: &ProjectContext,
    program: &str,
    args: &[String],
) -> StepResult {
    let timeout = ctx.step_timeout_seconds();
    let started = Instant::now();
    let outcome = command::run_step_command(&ctx.root, program, args, timeout, &ctx.cancel);
    let duration_ms = started.elapsed().as_millis() as u64;

    match outcome {
        StepCommandOutcome::Completed(out) if out.success => {
            StepResult::passed(step, out.diagnostic(), duration_ms)
        }
        StepCommandOutcome::Completed(out) => StepResult::failed(
            step,
            format!("exit {}: {}", out.exit_code, out.diagnostic()),
            duration_ms,
        ),
        StepCommandOutcome::TimedOut { seconds } => StepResult::timed_out(step, seconds, duration_ms),
        StepCommandOutcome::Cancelled => StepResult::skipped(step, "cancelled"),
        StepCommandOutcome::SpawnFailed(detail) => StepResult::failed(step, detail, duration_ms),
    }
}

/// Assembles providers for a context.
pub struct ProviderRegistry;

impl ProviderRegistry {
    /// Providers for every detected, config-enabled ecosystem, in
    /// [`EcosystemKind::all`] order so multi-ecosystem repositories run in a
    /// stable order regardless of how the detection set iterates.
    ///
    /// Never fails; an empty result is valid and the workflow skips straight
    /// to commit.
    pub fn build(ctx: &ProjectContext) -> Vec<Box<dyn Provider>> {
        EcosystemKind::all()
            .iter()
            .filter(|kind| ctx.detected.contains(kind))
            .filter(|kind| ctx.config.provider_enabled(**kind))
            .map(|kind| providers::make(*kind))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, ProviderConfig};
    use std::collections::BTreeSet;
    use std::path::PathBuf;

    fn context(detected: &[EcosystemKind], config: Config) -> ProjectContext {
        ProjectContext::new(
            PathBuf::from("/tmp/does-not-matter"),
            detected.iter().copied().collect::<BTreeSet<_>>(),
            config,
        )
    }

    #[test]
    fn registry_follows_enumeration_order() {
        // Detection order deliberately reversed from enumeration order.
        let ctx = context(
            &[EcosystemKind::ChromeExtension, EcosystemKind::Rust, EcosystemKind::Python],
            Config::default(),
        );
        let kinds: Vec<_> = ProviderRegistry::build(&ctx).iter().map(|p| p.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                EcosystemKind::Python,
                EcosystemKind::Rust,
                EcosystemKind::ChromeExtension,
            ]
        );
    }

    #[test]
    fn registry_is_deterministic_across_builds() {
        let ctx = context(&[EcosystemKind::Rust, EcosystemKind::Python], Config::default());
        let first: Vec<_> = ProviderRegistry::build(&ctx).iter().map(|p| p.kind()).collect();
        let second: Vec<_> = ProviderRegistry::build(&ctx).iter().map(|p| p.kind()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn disabled_providers_are_excluded() {
        let mut config = Config::default();
        config.providers.insert(
            "rust".to_string(),
            ProviderConfig {
                enabled: false,
                options: Default::default(),
            },
        );
        let ctx = context(&[EcosystemKind::Rust, EcosystemKind::Python], config);
        let kinds: Vec<_> = ProviderRegistry::build(&ctx).iter().map(|p| p.kind()).collect();
        assert_eq!(kinds, vec![EcosystemKind::Python]);
    }

    #[test]
    fn empty_detection_builds_empty_registry() {
        let ctx = context(&[], Config::default());
        assert!(ProviderRegistry::build(&ctx).is_empty());
    }
}
