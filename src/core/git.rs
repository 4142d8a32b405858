//! Git collaboration boundary.
//!
//! The workflow never inspects repository internals; it asks a
//! [`GitCollaborator`] to stage, commit, and push, and trusts the reported
//! outcomes. The production implementation shells out to the `git` binary.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::utils::command;

/// Success-or-detail outcome of one git operation. `detail` carries the
/// failure text when `success` is false, and is empty otherwise.
#[derive(Debug, Clone, Serialize)]
pub struct GitOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub detail: String,
}

impl GitOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            detail: String::new(),
        }
    }

    pub fn failed(detail: impl Into<String>) -> Self {
        Self {
            success: false,
            detail: detail.into(),
        }
    }
}

/// The three operations the workflow depends on. Implementations must be
/// safe to call in the stage/commit/push order; the workflow never reorders
/// them and never retries.
pub trait GitCollaborator {
    fn stage_all(&self) -> GitOutcome;
    fn commit(&self, message: &str) -> GitOutcome;
    fn push(&self) -> GitOutcome;

    /// Hash of the most recent commit, when the backend can report one.
    fn last_commit_hash(&self) -> Option<String> {
        None
    }
}

/// Shells out to `git` in the project root.
pub struct GitCli {
    root: PathBuf,
}

impl GitCli {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    fn run(&self, args: &[&str], context: &str) -> GitOutcome {
        match command::run_in(&self.root, "git", args, context) {
            Ok(_) => GitOutcome::ok(),
            Err(e) => GitOutcome::failed(e.to_string()),
        }
    }
}

impl GitCollaborator for GitCli {
    fn stage_all(&self) -> GitOutcome {
        self.run(&["add", "-A"], "git add")
    }

    fn commit(&self, message: &str) -> GitOutcome {
        self.run(&["commit", "-m", message], "git commit")
    }

    fn push(&self) -> GitOutcome {
        self.run(&["push"], "git push")
    }

    fn last_commit_hash(&self) -> Option<String> {
        command::run_in_optional(&self.root, "git", &["rev-parse", "HEAD"])
    }
}

/// Read-only repository facts for the status command. None of these fail
/// hard; a directory that is not a repository simply reports as such.
pub fn is_git_repo(root: &Path) -> bool {
    command::succeeded_in(root, "git", &["rev-parse", "--is-inside-work-tree"])
}

pub fn current_branch(root: &Path) -> Option<String> {
    command::run_in_optional(root, "git", &["branch", "--show-current"])
}

pub fn is_workdir_clean(root: &Path) -> bool {
    command::run_in_optional(root, "git", &["status", "--porcelain"]).is_none()
}

pub fn has_staged_changes(root: &Path) -> bool {
    !command::succeeded_in(root, "git", &["diff", "--cached", "--quiet"])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_repo_directory_reports_as_such() {
        let temp = tempfile::tempdir().unwrap();
        assert!(!is_git_repo(temp.path()));
        assert!(current_branch(temp.path()).is_none());
    }

    #[test]
    fn cli_commit_outside_a_repo_fails_with_detail() {
        let temp = tempfile::tempdir().unwrap();
        let git = GitCli::new(temp.path());

        let outcome = git.commit("message");
        assert!(!outcome.success);
        assert!(!outcome.detail.is_empty());
    }

    #[test]
    fn last_commit_hash_is_none_outside_a_repo() {
        let temp = tempfile::tempdir().unwrap();
        assert!(GitCli::new(temp.path()).last_commit_hash().is_none());
    }
}
