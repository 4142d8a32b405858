//! Validation steps and their results.

use serde::{Deserialize, Serialize};

use crate::ecosystem::EcosystemKind;

/// Validation phase relative to the commit operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Preflight,
    Postflight,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Preflight => write!(f, "preflight"),
            Phase::Postflight => write!(f, "postflight"),
        }
    }
}

/// Whether a failing step blocks the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criticality {
    /// Failure forces the gate to Abort.
    Fatal,
    /// Failure is reported but never blocks.
    Advisory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Passed,
    Failed,
    Skipped,
}

/// What a step executes. Most steps delegate to an external process; a few
/// (manifest validation) are builtin checks the provider runs in-process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepAction {
    Command { program: String, args: Vec<String> },
    Builtin { check: String },
}

/// A named unit of validation work owned by exactly one provider.
///
/// Order within a provider's step sequence is significant: cheap,
/// deterministic checks come before expensive ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationStep {
    pub id: String,
    pub name: String,
    pub ecosystem: EcosystemKind,
    pub phase: Phase,
    pub criticality: Criticality,
    pub action: StepAction,
}

impl ValidationStep {
    pub fn command(
        id: &str,
        name: &str,
        ecosystem: EcosystemKind,
        phase: Phase,
        criticality: Criticality,
        program: &str,
        args: &[&str],
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            ecosystem,
            phase,
            criticality,
            action: StepAction::Command {
                program: program.to_string(),
                args: args.iter().map(|a| a.to_string()).collect(),
            },
        }
    }

    pub fn builtin(
        id: &str,
        name: &str,
        ecosystem: EcosystemKind,
        phase: Phase,
        criticality: Criticality,
        check: &str,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            ecosystem,
            phase,
            criticality,
            action: StepAction::Builtin {
                check: check.to_string(),
            },
        }
    }
}

/// Outcome of one step. Immutable once produced; always references the step
/// that produced it through `step_id` and carries its criticality so the
/// gate can be decided from results alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub step_id: String,
    pub step_name: String,
    pub ecosystem: EcosystemKind,
    pub phase: Phase,
    pub criticality: Criticality,
    pub status: StepStatus,
    pub duration_ms: u64,
    /// Captured diagnostic text (process output, skip reason, timeout tag).
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub output: String,
}

impl StepResult {
    pub fn passed(step: &ValidationStep, output: String, duration_ms: u64) -> Self {
        Self::from_step(step, StepStatus::Passed, output, duration_ms)
    }

    pub fn failed(step: &ValidationStep, output: String, duration_ms: u64) -> Self {
        Self::from_step(step, StepStatus::Failed, output, duration_ms)
    }

    pub fn skipped(step: &ValidationStep, reason: impl Into<String>) -> Self {
        Self::from_step(step, StepStatus::Skipped, reason.into(), 0)
    }

    /// A timeout is a failure with a distinguishing tag, never a crash.
    /// It is recorded as Fatal regardless of the step's own criticality:
    /// a hung tool says nothing about the check it was running.
    pub fn timed_out(step: &ValidationStep, seconds: u64, duration_ms: u64) -> Self {
        let mut result = Self::from_step(
            step,
            StepStatus::Failed,
            format!("timed out after {}s", seconds),
            duration_ms,
        );
        result.criticality = Criticality::Fatal;
        result
    }

    pub fn is_fatal_failure(&self) -> bool {
        self.status == StepStatus::Failed && self.criticality == Criticality::Fatal
    }

    fn from_step(
        step: &ValidationStep,
        status: StepStatus,
        output: String,
        duration_ms: u64,
    ) -> Self {
        Self {
            step_id: step.id.clone(),
            step_name: step.name.clone(),
            ecosystem: step.ecosystem,
            phase: step.phase,
            criticality: step.criticality,
            status,
            duration_ms,
            output,
        }
    }
}
