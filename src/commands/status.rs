use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use shipshape::detect;
use shipshape::git;
use shipshape::Config;
use shipshape::EcosystemKind;

use super::CmdResult;

#[derive(Args)]
pub struct StatusArgs {
    /// Project root (defaults to the current directory)
    #[arg(long)]
    pub root: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct StatusOutput {
    pub command: &'static str,
    pub root: PathBuf,
    pub detected: Vec<EcosystemKind>,
    pub is_git_repo: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    pub workdir_clean: bool,
    pub staged_changes: bool,
}

pub fn run_json(args: StatusArgs) -> CmdResult<StatusOutput> {
    let root = super::resolve_root(args.root.as_deref())?;
    let config = Config::load(&root)?;
    let detected = detect::detect(&root, config.workflow.detect_depth)?;

    let is_git_repo = git::is_git_repo(&root);
    let (branch, workdir_clean, staged_changes) = if is_git_repo {
        (
            git::current_branch(&root),
            git::is_workdir_clean(&root),
            git::has_staged_changes(&root),
        )
    } else {
        (None, true, false)
    };

    Ok((
        StatusOutput {
            command: "status",
            root,
            detected: detected.into_iter().collect(),
            is_git_repo,
            branch,
            workdir_clean,
            staged_changes,
        },
        0,
    ))
}
