use std::path::PathBuf;

use clap::Args;

use shipshape::git::GitCli;
use shipshape::log_status;
use shipshape::step::StepStatus;
use shipshape::workflow::{WorkflowOptions, WorkflowOrchestrator, WorkflowRun, WorkflowState};
use shipshape::Config;

use super::CmdResult;
use crate::output;

#[derive(Args)]
pub struct CommitArgs {
    /// Commit message (tagged with the detected ecosystems)
    #[arg(short, long)]
    pub message: String,

    /// Run all validation but simulate the commit and push
    #[arg(long)]
    pub dry_run: bool,

    /// Do not stage changes before committing
    #[arg(long)]
    pub no_add: bool,

    /// Do not push after a successful postflight gate
    #[arg(long)]
    pub no_push: bool,

    /// Run providers' steps in parallel
    #[arg(long)]
    pub parallel: bool,

    /// Project root (defaults to the current directory)
    #[arg(long)]
    pub root: Option<PathBuf>,
}

pub fn run_json(args: CommitArgs) -> CmdResult<WorkflowRun> {
    let root = super::resolve_root(args.root.as_deref())?;
    let mut config = Config::load(&root)?;
    if args.no_push {
        config.workflow.auto_push = false;
    }
    if args.parallel {
        config.workflow.parallel_steps = true;
    }

    let options = WorkflowOptions {
        message: args.message,
        dry_run: args.dry_run,
        auto_add: !args.no_add,
    };

    if options.dry_run {
        log_status!("commit", "Dry run in {}", root.display());
    } else {
        log_status!("commit", "Workflow starting in {}", root.display());
    }

    let git = GitCli::new(&root);
    let run = WorkflowOrchestrator::run(&root, config, options, &git);
    report(&run);

    let exit_code = output::exit_code_for_run(&run);
    Ok((run, exit_code))
}

fn report(run: &WorkflowRun) {
    match run.state {
        WorkflowState::Done => {
            if let Some(commit) = &run.commit {
                if commit.simulated {
                    log_status!("commit", "Would commit: {}", commit.message);
                } else {
                    log_status!("commit", "Committed: {}", commit.message);
                }
            }
            match run.published {
                Some(true) => log_status!("push", "Pushed"),
                Some(false) => log_status!("push", "Push failed; commit remains local"),
                None => {}
            }
        }
        WorkflowState::Aborted(reason) => {
            log_status!("commit", "Workflow aborted: {}", reason);
            for gate in [&run.preflight, &run.postflight].into_iter().flatten() {
                for failure in &gate.justification {
                    log_status!(
                        "commit",
                        "  {} failed [{}]: {}",
                        failure.step_name,
                        failure.ecosystem,
                        failure.output
                    );
                }
            }
        }
        _ => {}
    }

    let skipped = run
        .results
        .iter()
        .filter(|r| r.status == StepStatus::Skipped)
        .count();
    if skipped > 0 {
        log_status!("commit", "{} step(s) skipped", skipped);
    }
    for warning in &run.warnings {
        log_status!("commit", "warning: {}", warning);
    }
}
