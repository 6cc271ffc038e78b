//! Command implementations for atomicio.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations. Every command reads and writes through `SafeFile`, so
//! the CLI coordinates with other processes using the same sentinel locks.

mod formats;
mod read;
mod write;

#[cfg(test)]
mod tests;

use crate::cli::{Cli, Command};
use atomicio::config::Config;
use atomicio::error::Result;
use std::io::{self, Write};

/// Dispatch a command to its implementation.
///
/// Loads the configuration named by `--config` (defaults otherwise), applies
/// `--timeout` on top, and routes the command to its handler with stdout as
/// the output.
pub fn dispatch(cli: Cli) -> Result<()> {
    let config = resolve_config(&cli)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::Read(args) => read::cmd_read(&config, &args, &mut out),
        Command::Write(args) => write::cmd_write(&config, &args),
        Command::Formats => formats::cmd_formats(&mut out),
    }
}

/// The effective configuration for this invocation.
fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(timeout) = cli.timeout {
        config.timeout = timeout;
    }
    Ok(config)
}

/// Wrap a failure to write command output.
fn output_error(err: io::Error) -> atomicio::AtomicIoError {
    atomicio::AtomicIoError::Usage(format!("failed to write output: {}", err))
}

fn write_line(out: &mut dyn Write, line: &str) -> Result<()> {
    writeln!(out, "{}", line).map_err(output_error)
}
