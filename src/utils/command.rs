//! Command execution primitives with consistent error handling.

use std::path::Path;
use std::process::{Command, Output, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

/// Cooperative cancellation flag shared between the orchestrator and
/// in-flight step processes. Cloning shares the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Captured output from a completed process.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub success: bool,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Diagnostic text: stderr preferred, stdout as fallback.
    pub fn diagnostic(&self) -> String {
        if !self.stderr.trim().is_empty() {
            self.stderr.trim().to_string()
        } else {
            self.stdout.trim().to_string()
        }
    }
}

/// Outcome of a bounded step command.
#[derive(Debug)]
pub enum StepCommandOutcome {
    Completed(CommandOutput),
    TimedOut { seconds: u64 },
    Cancelled,
    /// The process could not be started at all (missing binary, permissions).
    SpawnFailed(String),
}

/// Run a command and return trimmed stdout on success.
///
/// Returns an error with stderr (or stdout fallback) if it fails.
pub fn run_in(dir: &Path, program: &str, args: &[&str], context: &str) -> Result<String> {
    let output = Command::new(program)
        .args(args)
        .current_dir(dir)
        .output()
        .map_err(|e| Error::Other(format!("Failed to run {}: {}", context, e)))?;

    if !output.status.success() {
        return Err(Error::Other(format!(
            "{} failed: {}",
            context,
            error_text(&output)
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Run a command in a directory, returning None on any failure.
///
/// Useful when failure is expected/acceptable (e.g. no commits yet).
pub fn run_in_optional(dir: &Path, program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program)
        .args(args)
        .current_dir(dir)
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if stdout.is_empty() {
        None
    } else {
        Some(stdout)
    }
}

/// Check if a command succeeds in a directory without capturing output.
pub fn succeeded_in(dir: &Path, program: &str, args: &[&str]) -> bool {
    Command::new(program)
        .args(args)
        .current_dir(dir)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Extract error text from command output.
///
/// Prefers stderr, falls back to stdout if stderr is empty.
pub fn error_text(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        stderr.trim().to_string()
    } else {
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }
}

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Run a step's external process with a deadline and a cancellation flag.
///
/// The process is killed on timeout or cancellation. Output is drained on
/// reader threads so a chatty child never deadlocks against a full pipe.
pub fn run_step_command(
    dir: &Path,
    program: &str,
    args: &[String],
    timeout_seconds: u64,
    cancel: &CancelFlag,
) -> StepCommandOutcome {
    let mut child = match Command::new(program)
        .args(args)
        .current_dir(dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(e) => return StepCommandOutcome::SpawnFailed(format!("{}: {}", program, e)),
    };

    let stdout_reader = spawn_reader(child.stdout.take());
    let stderr_reader = spawn_reader(child.stderr.take());

    let deadline = Instant::now() + Duration::from_secs(timeout_seconds);
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                let stdout = join_reader(stdout_reader);
                let stderr = join_reader(stderr_reader);
                return StepCommandOutcome::Completed(CommandOutput {
                    success: status.success(),
                    exit_code: status.code().unwrap_or(-1),
                    stdout,
                    stderr,
                });
            }
            Ok(None) => {}
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return StepCommandOutcome::SpawnFailed(format!("{}: {}", program, e));
            }
        }

        if cancel.is_set() {
            let _ = child.kill();
            let _ = child.wait();
            return StepCommandOutcome::Cancelled;
        }

        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return StepCommandOutcome::TimedOut {
                seconds: timeout_seconds,
            };
        }

        std::thread::sleep(POLL_INTERVAL);
    }
}

fn spawn_reader<R: std::io::Read + Send + 'static>(
    source: Option<R>,
) -> Option<std::thread::JoinHandle<String>> {
    source.map(|mut r| {
        std::thread::spawn(move || {
            let mut buf = String::new();
            let _ = std::io::Read::read_to_string(&mut r, &mut buf);
            buf
        })
    })
}

fn join_reader(handle: Option<std::thread::JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> tempfile::TempDir {
        tempfile::tempdir().unwrap()
    }

    #[test]
    fn completed_command_captures_output() {
        let temp = temp_dir();
        let outcome = run_step_command(
            temp.path(),
            "echo",
            &["hello".to_string()],
            10,
            &CancelFlag::new(),
        );

        match outcome {
            StepCommandOutcome::Completed(out) => {
                assert!(out.success);
                assert_eq!(out.stdout.trim(), "hello");
            }
            other => panic!("expected completion, got {:?}", other),
        }
    }

    #[test]
    fn missing_binary_is_spawn_failure() {
        let temp = temp_dir();
        let outcome = run_step_command(
            temp.path(),
            "shipshape-definitely-not-a-binary",
            &[],
            10,
            &CancelFlag::new(),
        );
        assert!(matches!(outcome, StepCommandOutcome::SpawnFailed(_)));
    }

    #[test]
    fn slow_command_times_out() {
        let temp = temp_dir();
        let outcome = run_step_command(
            temp.path(),
            "sleep",
            &["5".to_string()],
            1,
            &CancelFlag::new(),
        );
        assert!(matches!(
            outcome,
            StepCommandOutcome::TimedOut { seconds: 1 }
        ));
    }

    #[test]
    fn cancellation_kills_the_child() {
        let temp = temp_dir();
        let cancel = CancelFlag::new();
        cancel.set();

        let outcome = run_step_command(temp.path(), "sleep", &["5".to_string()], 30, &cancel);
        assert!(matches!(outcome, StepCommandOutcome::Cancelled));
    }

    #[test]
    fn run_in_returns_trimmed_stdout() {
        let temp = temp_dir();
        let out = run_in(temp.path(), "echo", &["ok"], "echo test").unwrap();
        assert_eq!(out, "ok");
    }

    #[test]
    fn run_in_optional_swallows_failure() {
        let temp = temp_dir();
        assert!(run_in_optional(temp.path(), "false", &[]).is_none());
    }
}
