//! Immutable per-invocation project context.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::Config;
use crate::detect;
use crate::ecosystem::EcosystemKind;
use crate::error::Result;
use crate::utils::command::CancelFlag;

/// Everything a provider is allowed to see: the project root, the detected
/// ecosystem set, and the merged configuration. Created once per invocation
/// and never mutated; no component reaches into filesystem or environment
/// state the orchestrator did not hand it.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectContext {
    pub root: PathBuf,
    pub detected: BTreeSet<EcosystemKind>,
    #[serde(skip)]
    pub config: Config,
    /// Checked at step boundaries; an in-flight step process is killed when
    /// the flag is raised.
    #[serde(skip)]
    pub cancel: CancelFlag,
}

impl ProjectContext {
    /// Run detection under `root` and capture the result with the config.
    pub fn resolve(root: &Path, config: Config) -> Result<Self> {
        let detected = detect::detect(root, config.workflow.detect_depth)?;
        Ok(Self {
            root: root.to_path_buf(),
            detected,
            config,
            cancel: CancelFlag::new(),
        })
    }

    /// Construct directly from known parts. Used by tests and by callers
    /// that already ran detection.
    pub fn new(root: PathBuf, detected: BTreeSet<EcosystemKind>, config: Config) -> Self {
        Self {
            root,
            detected,
            config,
            cancel: CancelFlag::new(),
        }
    }

    pub fn step_timeout_seconds(&self) -> u64 {
        self.config.timeouts.step_seconds
    }

    /// Ordered uppercase tags for the detected set, used in commit message
    /// prefixes: `[PYTHON, RUST] message`.
    pub fn ecosystem_tags(&self) -> Vec<&'static str> {
        EcosystemKind::all()
            .iter()
            .filter(|k| self.detected.contains(k))
            .map(|k| k.tag())
            .collect()
    }
}
