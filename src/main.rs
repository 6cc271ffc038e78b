//! atomicio: atomic, locked file operations from the command line.
//!
//! This is the main entry point for the `atomicio` CLI. It parses arguments,
//! dispatches to the appropriate command handler, and handles errors with
//! proper exit codes.

mod cli;
mod commands;

use atomicio::exit_codes;
use cli::Cli;
use std::process::ExitCode;

fn main() -> ExitCode {
    atomicio::logging::init();

    let cli = match Cli::try_parse_args() {
        Ok(cli) => cli,
        Err(err) => {
            // Help and version requests are not failures
            let code = if err.use_stderr() {
                exit_codes::USER_ERROR
            } else {
                exit_codes::SUCCESS
            };
            let _ = err.print();
            return ExitCode::from(code as u8);
        }
    };

    match commands::dispatch(cli) {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            // Print user-actionable error message to stderr
            eprintln!("Error: {}", err);

            // Return appropriate exit code
            ExitCode::from(err.exit_code() as u8)
        }
    }
}
