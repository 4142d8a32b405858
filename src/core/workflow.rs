//! The commit workflow state machine.
//!
//! One linear pass: Idle -> Detecting -> Validating(Preflight) ->
//! Committing -> Validating(Postflight) -> Publishing -> Done, with Aborted
//! as the single terminal failure state. Every run produces a
//! [`WorkflowRun`] report regardless of how it ended; the orchestrator
//! never panics its way out of a phase.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Instant;

use serde::Serialize;

use crate::aggregate::{GateDecision, ResultAggregator};
use crate::config::Config;
use crate::context::ProjectContext;
use crate::ecosystem::EcosystemKind;
use crate::git::GitCollaborator;
use crate::provider::{Provider, ProviderRegistry};
use crate::step::{Phase, StepResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortReason {
    /// The project root could not be examined at all.
    Detection,
    /// A fatal preflight failure; nothing was committed.
    PreflightGate,
    /// A fatal postflight failure; the commit exists but was not pushed.
    PostflightGate,
    /// Staging or committing itself failed.
    CommitFailed,
    /// Cancellation observed at a step or phase boundary.
    Cancelled,
}

impl std::fmt::Display for AbortReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AbortReason::Detection => write!(f, "detection failed"),
            AbortReason::PreflightGate => write!(f, "preflight gate"),
            AbortReason::PostflightGate => write!(f, "postflight gate"),
            AbortReason::CommitFailed => write!(f, "commit failed"),
            AbortReason::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    Idle,
    Detecting,
    Validating(Phase),
    Committing,
    Publishing,
    Done,
    Aborted(AbortReason),
}

impl std::fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkflowState::Idle => write!(f, "idle"),
            WorkflowState::Detecting => write!(f, "detecting"),
            WorkflowState::Validating(phase) => write!(f, "validating:{}", phase),
            WorkflowState::Committing => write!(f, "committing"),
            WorkflowState::Publishing => write!(f, "publishing"),
            WorkflowState::Done => write!(f, "done"),
            WorkflowState::Aborted(_) => write!(f, "aborted"),
        }
    }
}

/// What the commit operation produced. `simulated` marks dry runs, which
/// never touch the repository and therefore carry no hash.
#[derive(Debug, Clone, Serialize)]
pub struct CommitOutcome {
    pub message: String,
    pub hash: Option<String>,
    pub simulated: bool,
}

/// Caller-supplied knobs for one run.
#[derive(Debug, Clone)]
pub struct WorkflowOptions {
    pub message: String,
    pub dry_run: bool,
    pub auto_add: bool,
}

impl WorkflowOptions {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            dry_run: false,
            auto_add: true,
        }
    }
}

/// Complete report of one workflow run.
#[derive(Debug, Serialize)]
pub struct WorkflowRun {
    pub root: PathBuf,
    pub detected: Vec<EcosystemKind>,
    /// Terminal state: Done or Aborted.
    pub state: WorkflowState,
    /// Every state entered, in order.
    pub states: Vec<WorkflowState>,
    pub dry_run: bool,
    pub preflight: Option<GateDecision>,
    pub postflight: Option<GateDecision>,
    /// All step results across both phases, in execution order.
    pub results: Vec<StepResult>,
    pub commit: Option<CommitOutcome>,
    /// Some(true) pushed, Some(false) push failed, None push not attempted.
    pub published: Option<bool>,
    pub warnings: Vec<String>,
    pub started_at: String,
    pub duration_ms: u64,
}

impl WorkflowRun {
    pub fn abort_reason(&self) -> Option<AbortReason> {
        match self.state {
            WorkflowState::Aborted(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.state == WorkflowState::Done
    }
}

/// Drives a full run. Stateless; every run gets a fresh context and report.
pub struct WorkflowOrchestrator;

impl WorkflowOrchestrator {
    /// Detect ecosystems under `root`, assemble the registry, and run.
    ///
    /// Always returns a report; a detection failure becomes an
    /// Aborted(Detection) run rather than an error.
    pub fn run(
        root: &Path,
        config: Config,
        options: WorkflowOptions,
        git: &dyn GitCollaborator,
    ) -> WorkflowRun {
        let started = Instant::now();
        let started_at = chrono::Utc::now().to_rfc3339();

        let ctx = match ProjectContext::resolve(root, config) {
            Ok(ctx) => ctx,
            Err(e) => {
                return WorkflowRun {
                    root: root.to_path_buf(),
                    detected: Vec::new(),
                    state: WorkflowState::Aborted(AbortReason::Detection),
                    states: vec![
                        WorkflowState::Idle,
                        WorkflowState::Detecting,
                        WorkflowState::Aborted(AbortReason::Detection),
                    ],
                    dry_run: options.dry_run,
                    preflight: None,
                    postflight: None,
                    results: Vec::new(),
                    commit: None,
                    published: None,
                    warnings: vec![e.to_string()],
                    started_at,
                    duration_ms: started.elapsed().as_millis() as u64,
                };
            }
        };

        let providers = ProviderRegistry::build(&ctx);
        Self::drive(ctx, providers, options, git, started, started_at)
    }

    /// Run with an already-resolved context and an explicit provider list.
    /// The registry is bypassed, which is how tests substitute doubles.
    pub fn run_with_providers(
        ctx: ProjectContext,
        providers: Vec<Box<dyn Provider>>,
        options: WorkflowOptions,
        git: &dyn GitCollaborator,
    ) -> WorkflowRun {
        let started = Instant::now();
        let started_at = chrono::Utc::now().to_rfc3339();
        Self::drive(ctx, providers, options, git, started, started_at)
    }

    fn drive(
        ctx: ProjectContext,
        providers: Vec<Box<dyn Provider>>,
        options: WorkflowOptions,
        git: &dyn GitCollaborator,
        started: Instant,
        started_at: String,
    ) -> WorkflowRun {
        let mut run = Builder::new(&ctx, &options, started_at);
        run.enter(WorkflowState::Idle);
        run.enter(WorkflowState::Detecting);

        let mut aggregator = ResultAggregator::new();

        // Preflight gate.
        run.enter(WorkflowState::Validating(Phase::Preflight));
        let cancelled = run_phase(&ctx, &providers, Phase::Preflight, &mut aggregator);
        let decision = aggregator.decide();
        let proceeds = decision.proceeds();
        run.preflight = Some(decision);
        if cancelled {
            return run.finish_aborted(AbortReason::Cancelled, aggregator, started);
        }
        if !proceeds {
            return run.finish_aborted(AbortReason::PreflightGate, aggregator, started);
        }

        // Commit.
        run.enter(WorkflowState::Committing);
        if ctx.cancel.is_set() {
            return run.finish_aborted(AbortReason::Cancelled, aggregator, started);
        }
        let message = tagged_message(&ctx, &options.message);
        if options.dry_run {
            run.commit = Some(CommitOutcome {
                message,
                hash: None,
                simulated: true,
            });
        } else {
            if options.auto_add {
                let staged = git.stage_all();
                if !staged.success {
                    run.warnings.push(format!("staging failed: {}", staged.detail));
                    return run.finish_aborted(AbortReason::CommitFailed, aggregator, started);
                }
            }
            let committed = git.commit(&message);
            if !committed.success {
                run.warnings
                    .push(format!("commit failed: {}", committed.detail));
                return run.finish_aborted(AbortReason::CommitFailed, aggregator, started);
            }
            run.commit = Some(CommitOutcome {
                message,
                hash: git.last_commit_hash(),
                simulated: false,
            });
        }

        // Postflight gate.
        run.enter(WorkflowState::Validating(Phase::Postflight));
        let cancelled = run_phase(&ctx, &providers, Phase::Postflight, &mut aggregator);
        let decision = aggregator.decide();
        let proceeds = decision.proceeds();
        run.postflight = Some(decision);
        if cancelled {
            return run.finish_aborted(AbortReason::Cancelled, aggregator, started);
        }
        if !proceeds {
            if !options.dry_run {
                run.warnings
                    .push("postflight gate aborted; the commit exists locally but was not pushed".to_string());
            }
            return run.finish_aborted(AbortReason::PostflightGate, aggregator, started);
        }

        // Publish.
        run.enter(WorkflowState::Publishing);
        if !options.dry_run && ctx.config.workflow.auto_push {
            let pushed = git.push();
            if pushed.success {
                run.published = Some(true);
            } else {
                // A failed push does not undo the commit; the run still
                // completes, flagged for the caller.
                run.published = Some(false);
                run.warnings.push(format!("push failed: {}", pushed.detail));
            }
        }

        run.enter(WorkflowState::Done);
        run.finish(WorkflowState::Done, aggregator, started)
    }
}

/// `[PYTHON, RUST] message` when anything was detected, plain otherwise.
fn tagged_message(ctx: &ProjectContext, message: &str) -> String {
    let tags = ctx.ecosystem_tags();
    if tags.is_empty() {
        message.to_string()
    } else {
        format!("[{}] {}", tags.join(", "), message)
    }
}

/// Run one phase across all providers, recording into the aggregator in
/// provider order. Returns true when cancellation was observed.
fn run_phase(
    ctx: &ProjectContext,
    providers: &[Box<dyn Provider>],
    phase: Phase,
    aggregator: &mut ResultAggregator,
) -> bool {
    aggregator.begin_phase(phase);

    let batches: Vec<Vec<StepResult>> = if ctx.config.workflow.parallel_steps && providers.len() > 1
    {
        parallel_phase(ctx, providers, phase)
    } else {
        providers
            .iter()
            .map(|p| provider_phase_results(p.as_ref(), phase, ctx))
            .collect()
    };

    for batch in batches {
        for result in batch {
            aggregator.record(result);
        }
    }
    ctx.cancel.is_set()
}

/// One worker per provider, capped by available parallelism. Results are
/// collected per provider and recorded in registry order afterwards, so the
/// report is identical to a sequential run.
fn parallel_phase(
    ctx: &ProjectContext,
    providers: &[Box<dyn Provider>],
    phase: Phase,
) -> Vec<Vec<StepResult>> {
    let max_workers = thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .max(1);

    let mut batches = Vec::with_capacity(providers.len());
    for chunk in providers.chunks(max_workers) {
        let chunk_results: Vec<Vec<StepResult>> = thread::scope(|scope| {
            let handles: Vec<_> = chunk
                .iter()
                .map(|p| scope.spawn(move || provider_phase_results(p.as_ref(), phase, ctx)))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_default())
                .collect()
        });
        batches.extend(chunk_results);
    }
    batches
}

/// All of one provider's results for a phase. An unavailable toolchain
/// yields Skipped for every step; cancellation skips the remainder.
fn provider_phase_results(
    provider: &dyn Provider,
    phase: Phase,
    ctx: &ProjectContext,
) -> Vec<StepResult> {
    let steps = provider.steps(phase);
    if provider.unavailable(ctx) {
        return steps
            .iter()
            .map(|s| StepResult::skipped(s, format!("{} toolchain unavailable", provider.kind())))
            .collect();
    }

    let mut results = Vec::with_capacity(steps.len());
    for step in &steps {
        if ctx.cancel.is_set() {
            results.push(StepResult::skipped(step, "cancelled"));
            continue;
        }
        results.push(provider.run_step(step, ctx));
    }
    results
}

/// Accumulates report fields while the state machine advances.
struct Builder {
    root: PathBuf,
    detected: Vec<EcosystemKind>,
    states: Vec<WorkflowState>,
    dry_run: bool,
    preflight: Option<GateDecision>,
    postflight: Option<GateDecision>,
    commit: Option<CommitOutcome>,
    published: Option<bool>,
    warnings: Vec<String>,
    started_at: String,
}

impl Builder {
    fn new(ctx: &ProjectContext, options: &WorkflowOptions, started_at: String) -> Self {
        Self {
            root: ctx.root.clone(),
            detected: EcosystemKind::all()
                .iter()
                .filter(|k| ctx.detected.contains(k))
                .copied()
                .collect(),
            states: Vec::new(),
            dry_run: options.dry_run,
            preflight: None,
            postflight: None,
            commit: None,
            published: None,
            warnings: Vec::new(),
            started_at,
        }
    }

    fn enter(&mut self, state: WorkflowState) {
        self.states.push(state);
    }

    fn finish_aborted(
        self,
        reason: AbortReason,
        aggregator: ResultAggregator,
        started: Instant,
    ) -> WorkflowRun {
        self.finish(WorkflowState::Aborted(reason), aggregator, started)
    }

    fn finish(
        mut self,
        state: WorkflowState,
        aggregator: ResultAggregator,
        started: Instant,
    ) -> WorkflowRun {
        if self.states.last() != Some(&state) {
            self.states.push(state);
        }
        WorkflowRun {
            root: self.root,
            detected: self.detected,
            state,
            states: self.states,
            dry_run: self.dry_run,
            preflight: self.preflight,
            postflight: self.postflight,
            results: aggregator.into_results(),
            commit: self.commit,
            published: self.published,
            warnings: self.warnings,
            started_at: self.started_at,
            duration_ms: started.elapsed().as_millis() as u64,
        }
    }
}
