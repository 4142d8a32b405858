//! Step result aggregation and the gate decision rule.

use serde::{Deserialize, Serialize};

use crate::step::{Phase, StepResult, StepStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Proceed,
    Abort,
}

/// A gate decision with the ordered results that justify it. Computed fresh
/// at each gate, never cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateDecision {
    pub phase: Phase,
    pub verdict: Verdict,
    /// Every failed result in the phase, fatal and advisory alike, so the
    /// reporter can show exactly why a gate aborted (or what it tolerated).
    pub justification: Vec<StepResult>,
}

impl GateDecision {
    pub fn proceeds(&self) -> bool {
        self.verdict == Verdict::Proceed
    }
}

/// Accumulates step results for the phase in flight.
///
/// Phase-scoped: `begin_phase` moves the previous phase's results into
/// history so a Postflight decision is never contaminated by Preflight
/// state. `record` is the only mutation and is serialized behind a single
/// lock when steps run in parallel.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    phase: Option<Phase>,
    current: Vec<StepResult>,
    history: Vec<StepResult>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start accumulating for `phase`, retiring prior results to history.
    pub fn begin_phase(&mut self, phase: Phase) {
        self.history.append(&mut self.current);
        self.phase = Some(phase);
    }

    pub fn record(&mut self, result: StepResult) {
        self.current.push(result);
    }

    /// Decide the gate from the current phase's results. Pure: any Fatal
    /// failure forces Abort; Advisory failures are surfaced but never flip
    /// the verdict. An empty phase proceeds vacuously.
    pub fn decide(&self) -> GateDecision {
        let phase = self.phase.unwrap_or(Phase::Preflight);
        let justification: Vec<StepResult> = self
            .current
            .iter()
            .filter(|r| r.status == StepStatus::Failed)
            .cloned()
            .collect();
        let verdict = if justification.iter().any(|r| r.is_fatal_failure()) {
            Verdict::Abort
        } else {
            Verdict::Proceed
        };
        GateDecision {
            phase,
            verdict,
            justification,
        }
    }

    pub fn current_results(&self) -> &[StepResult] {
        &self.current
    }

    /// All results recorded so far, history first, then the open phase.
    pub fn into_results(mut self) -> Vec<StepResult> {
        self.history.append(&mut self.current);
        self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecosystem::EcosystemKind;
    use crate::step::{Criticality, ValidationStep};

    fn result(id: &str, phase: Phase, criticality: Criticality, status: StepStatus) -> StepResult {
        let step = ValidationStep::command(
            id,
            id,
            EcosystemKind::Python,
            phase,
            criticality,
            "true",
            &[],
        );
        match status {
            StepStatus::Passed => StepResult::passed(&step, String::new(), 1),
            StepStatus::Failed => StepResult::failed(&step, "boom".into(), 1),
            StepStatus::Skipped => StepResult::skipped(&step, "n/a"),
        }
    }

    #[test]
    fn empty_phase_proceeds_vacuously() {
        let mut agg = ResultAggregator::new();
        agg.begin_phase(Phase::Preflight);
        assert!(agg.decide().proceeds());
    }

    #[test]
    fn fatal_failure_forces_abort() {
        let mut agg = ResultAggregator::new();
        agg.begin_phase(Phase::Preflight);
        agg.record(result("a", Phase::Preflight, Criticality::Fatal, StepStatus::Passed));
        agg.record(result("b", Phase::Preflight, Criticality::Fatal, StepStatus::Failed));
        agg.record(result("c", Phase::Preflight, Criticality::Advisory, StepStatus::Failed));

        let decision = agg.decide();
        assert_eq!(decision.verdict, Verdict::Abort);
        assert_eq!(decision.justification.len(), 2);
    }

    #[test]
    fn advisory_failures_never_flip_the_verdict() {
        let mut agg = ResultAggregator::new();
        agg.begin_phase(Phase::Postflight);
        agg.record(result("a", Phase::Postflight, Criticality::Advisory, StepStatus::Failed));
        agg.record(result("b", Phase::Postflight, Criticality::Fatal, StepStatus::Passed));

        let decision = agg.decide();
        assert!(decision.proceeds());
        assert_eq!(decision.justification.len(), 1);
        assert_eq!(decision.justification[0].step_id, "a");
    }

    #[test]
    fn advisory_step_timeout_aborts_the_gate() {
        let step = ValidationStep::command(
            "audit",
            "dependency audit",
            EcosystemKind::Python,
            Phase::Postflight,
            Criticality::Advisory,
            "safety",
            &["check"],
        );
        let mut agg = ResultAggregator::new();
        agg.begin_phase(Phase::Postflight);
        agg.record(StepResult::timed_out(&step, 1, 1_000));

        assert_eq!(agg.decide().verdict, Verdict::Abort);
    }

    #[test]
    fn skipped_steps_cannot_abort() {
        let mut agg = ResultAggregator::new();
        agg.begin_phase(Phase::Preflight);
        agg.record(result("a", Phase::Preflight, Criticality::Fatal, StepStatus::Skipped));
        assert!(agg.decide().proceeds());
    }

    #[test]
    fn begin_phase_clears_stale_results() {
        let mut agg = ResultAggregator::new();
        agg.begin_phase(Phase::Preflight);
        agg.record(result("a", Phase::Preflight, Criticality::Fatal, StepStatus::Failed));
        assert_eq!(agg.decide().verdict, Verdict::Abort);

        agg.begin_phase(Phase::Postflight);
        assert!(agg.decide().proceeds());

        // History still holds everything for the run report.
        let all = agg.into_results();
        assert_eq!(all.len(), 1);
    }
}
