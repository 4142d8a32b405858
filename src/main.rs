use clap::{Parser, Subcommand};
use serde::Serialize;

mod commands;
mod output;

use commands::{commit, detect, status, CmdResult};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "shipshape")]
#[command(version = VERSION)]
#[command(about = "Validated commit workflows for multi-ecosystem repositories")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate, commit, and push in one pass
    Commit(commit::CommitArgs),
    /// Show detection and repository state
    Status(status::StatusArgs),
    /// Show detected ecosystems and the markers that matched
    Detect(detect::DetectArgs),
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let (json_result, exit_code) = match cli.command {
        Commands::Commit(args) => to_json(commit::run_json(args)),
        Commands::Status(args) => to_json(status::run_json(args)),
        Commands::Detect(args) => to_json(detect::run_json(args)),
    };

    if output::print_json_result(json_result).is_err() {
        return std::process::ExitCode::from(1);
    }
    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

fn to_json<T: Serialize>(result: CmdResult<T>) -> (shipshape::Result<serde_json::Value>, i32) {
    match result {
        Ok((data, exit_code)) => match serde_json::to_value(data) {
            Ok(value) => (Ok(value), exit_code),
            Err(err) => (Err(shipshape::Error::from(err)), 1),
        },
        Err(err) => {
            let exit_code = output::exit_code_for_error(&err);
            (Err(err), exit_code)
        }
    }
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
