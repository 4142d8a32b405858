//! Chrome extension validation. Manifest checks run in-process; the only
//! external tool involved is npm, and only when the extension has a
//! `package.json` build.

use std::fs;

use serde_json::Value;

use crate::context::ProjectContext;
use crate::ecosystem::EcosystemKind;
use crate::provider::{self, Provider};
use crate::step::{Criticality, Phase, StepAction, StepResult, ValidationStep};

pub struct ChromeProvider;

const KIND: EcosystemKind = EcosystemKind::ChromeExtension;

impl Provider for ChromeProvider {
    fn kind(&self) -> EcosystemKind {
        KIND
    }

    fn steps(&self, phase: Phase) -> Vec<ValidationStep> {
        match phase {
            Phase::Preflight => vec![
                ValidationStep::builtin(
                    "chrome-manifest",
                    "manifest validation",
                    KIND,
                    phase,
                    Criticality::Fatal,
                    "manifest",
                ),
                ValidationStep::builtin(
                    "chrome-files",
                    "referenced files exist",
                    KIND,
                    phase,
                    Criticality::Fatal,
                    "required-files",
                ),
                ValidationStep::command(
                    "chrome-build",
                    "npm build",
                    KIND,
                    phase,
                    Criticality::Fatal,
                    "npm",
                    &["run", "build"],
                ),
            ],
            Phase::Postflight => vec![ValidationStep::builtin(
                "chrome-manifest-recheck",
                "manifest still valid after build",
                KIND,
                phase,
                Criticality::Advisory,
                "manifest",
            )],
        }
    }

    // The manifest checks need nothing beyond the filesystem.
    fn unavailable(&self, _ctx: &ProjectContext) -> bool {
        false
    }

    fn skip_reason(&self, step: &ValidationStep, ctx: &ProjectContext) -> Option<String> {
        if step.id == "chrome-build" {
            if !ctx.root.join("package.json").is_file() {
                return Some("no package.json build".to_string());
            }
            if which::which("npm").is_err() {
                return Some("npm not available".to_string());
            }
        }
        None
    }

    fn run_step(&self, step: &ValidationStep, ctx: &ProjectContext) -> StepResult {
        if let Some(reason) = self.skip_reason(step, ctx) {
            return StepResult::skipped(step, reason);
        }
        match &step.action {
            StepAction::Builtin { check } => match check.as_str() {
                "manifest" => check_manifest(step, ctx),
                "required-files" => check_required_files(step, ctx),
                other => StepResult::failed(
                    step,
                    format!("No builtin check named '{}' in {} provider", other, KIND),
                    0,
                ),
            },
            StepAction::Command { program, args } => {
                provider::run_command_step(step, ctx, program, args)
            }
        }
    }
}

/// Chrome versions are one to four dot-separated integers.
fn valid_version(v: &str) -> bool {
    let parts: Vec<&str> = v.split('.').collect();
    (1..=4).contains(&parts.len())
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
}

fn load_manifest(ctx: &ProjectContext) -> std::result::Result<Value, String> {
    let path = ctx.root.join("manifest.json");
    let content =
        fs::read_to_string(&path).map_err(|e| format!("cannot read manifest.json: {}", e))?;
    serde_json::from_str(&content).map_err(|e| format!("manifest.json is not valid JSON: {}", e))
}

/// manifest_version must be 2 or 3, name and version must be present, and
/// version must be a valid Chrome version string.
fn check_manifest(step: &ValidationStep, ctx: &ProjectContext) -> StepResult {
    let manifest = match load_manifest(ctx) {
        Ok(m) => m,
        Err(detail) => return StepResult::failed(step, detail, 0),
    };

    let mut problems = Vec::new();
    match manifest.get("manifest_version").and_then(Value::as_u64) {
        Some(2) | Some(3) => {}
        Some(v) => problems.push(format!("unsupported manifest_version {}", v)),
        None => problems.push("missing manifest_version".to_string()),
    }
    if manifest.get("name").and_then(Value::as_str).map(str::trim).unwrap_or("").is_empty() {
        problems.push("missing name".to_string());
    }
    match manifest.get("version").and_then(Value::as_str) {
        Some(v) if valid_version(v) => {}
        Some(v) => problems.push(format!("invalid version '{}'", v)),
        None => problems.push("missing version".to_string()),
    }

    if problems.is_empty() {
        StepResult::passed(step, String::new(), 0)
    } else {
        StepResult::failed(step, problems.join("; "), 0)
    }
}

/// Every file the manifest references must exist relative to the root:
/// icons and the MV3 background service worker.
fn check_required_files(step: &ValidationStep, ctx: &ProjectContext) -> StepResult {
    let manifest = match load_manifest(ctx) {
        Ok(m) => m,
        Err(detail) => return StepResult::failed(step, detail, 0),
    };

    let mut missing = Vec::new();
    if let Some(icons) = manifest.get("icons").and_then(Value::as_object) {
        for icon in icons.values().filter_map(Value::as_str) {
            if !ctx.root.join(icon).is_file() {
                missing.push(icon.to_string());
            }
        }
    }
    if let Some(worker) = manifest
        .get("background")
        .and_then(|b| b.get("service_worker"))
        .and_then(Value::as_str)
    {
        if !ctx.root.join(worker).is_file() {
            missing.push(worker.to_string());
        }
    }

    if missing.is_empty() {
        StepResult::passed(step, String::new(), 0)
    } else {
        StepResult::failed(step, format!("missing files: {}", missing.join(", ")), 0)
    }
}
