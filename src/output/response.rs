//! CLI response formatting and output.
//!
//! Provides JSON envelope, printing, and exit code mapping.

use serde::Serialize;
use shipshape::workflow::{AbortReason, WorkflowRun, WorkflowState};
use shipshape::{Error, Result};

#[derive(Debug, Serialize)]
pub struct CliResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CliError>,
}

#[derive(Debug, Serialize)]
pub struct CliError {
    pub code: String,
    pub message: String,
}

impl<T: Serialize> CliResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(Error::from)
    }
}

impl CliResponse<()> {
    pub fn from_error(err: &Error) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(CliError {
                code: err.code().to_string(),
                message: err.to_string(),
            }),
        }
    }
}

fn print_response<T: Serialize>(response: &CliResponse<T>) -> Result<()> {
    use std::io::{self, Write};

    let payload = response.to_json()?;
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if let Err(e) = writeln!(handle, "{}", payload) {
        if e.kind() == io::ErrorKind::BrokenPipe {
            return Ok(()); // Exit gracefully on SIGPIPE
        }
        return Err(Error::Io(e));
    }
    Ok(())
}

pub fn print_result<T: Serialize>(result: Result<T>) -> Result<()> {
    match result {
        Ok(data) => print_response(&CliResponse::success(data)),
        Err(err) => print_response(&CliResponse::<()>::from_error(&err)),
    }
}

pub fn print_json_result(result: Result<serde_json::Value>) -> Result<()> {
    print_result(result)
}

/// Exit codes for the commit workflow, discriminating how a run ended:
/// 0 full success, 6 committed but not pushed, 2/3 gate aborts, 4 local
/// git or cancellation failures, 5 detection failures.
pub fn exit_code_for_run(run: &WorkflowRun) -> i32 {
    match run.state {
        WorkflowState::Done => {
            if run.published == Some(false) {
                6
            } else {
                0
            }
        }
        WorkflowState::Aborted(AbortReason::PreflightGate) => 2,
        WorkflowState::Aborted(AbortReason::PostflightGate) => 3,
        WorkflowState::Aborted(AbortReason::CommitFailed)
        | WorkflowState::Aborted(AbortReason::Cancelled) => 4,
        WorkflowState::Aborted(AbortReason::Detection) => 5,
        // Non-terminal states never escape the orchestrator.
        _ => 1,
    }
}

pub fn exit_code_for_error(err: &Error) -> i32 {
    match err {
        Error::Config(_) | Error::Toml(_) => 2,
        Error::Detection(_) | Error::Io(_) => 5,
        _ => 1,
    }
}
