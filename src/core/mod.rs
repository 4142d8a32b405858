// Public modules
pub mod aggregate;
pub mod config;
pub mod context;
pub mod detect;
pub mod ecosystem;
pub mod error;
pub mod git;
pub mod provider;
pub mod providers;
pub mod step;
pub mod workflow;

// Re-export common types for convenience
pub use aggregate::{GateDecision, ResultAggregator, Verdict};
pub use config::Config;
pub use context::ProjectContext;
pub use ecosystem::EcosystemKind;
pub use error::{Error, Result};
pub use git::{GitCli, GitCollaborator, GitOutcome};
pub use provider::{Provider, ProviderRegistry};
pub use step::{Criticality, Phase, StepResult, StepStatus, ValidationStep};
pub use workflow::{
    AbortReason, CommitOutcome, WorkflowOptions, WorkflowOrchestrator, WorkflowRun, WorkflowState,
};
