//! CLI argument parsing for atomicio.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use atomicio::locks::TimeoutPolicy;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// atomicio: atomic, locked file operations with extension-based formats.
///
/// Every command goes through the per-call locking handle, so it cooperates
/// with other atomicio processes working on the same files.
#[derive(Parser, Debug)]
#[command(name = "atomicio")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// YAML file with timeout and lock settings.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Lock timeout: `true` (15s), `false` (wait forever) or seconds.
    ///
    /// Overrides the timeout from `--config`.
    #[arg(long, global = true, value_name = "TIMEOUT")]
    pub timeout: Option<TimeoutPolicy>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for atomicio.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read a file and print its content.
    ///
    /// The format is chosen from the file extension. Structured values are
    /// printed as pretty JSON, text as is.
    Read(ReadArgs),

    /// Atomically replace a file's content.
    ///
    /// DATA is parsed as JSON; anything that is not valid JSON is written as
    /// a plain string.
    Write(WriteArgs),

    /// List the supported file extensions.
    Formats,
}

/// Arguments for the `read` command.
#[derive(Parser, Debug)]
pub struct ReadArgs {
    /// File to read.
    pub file: PathBuf,

    /// Copy the raw bytes to stdout instead of decoding.
    #[arg(long)]
    pub as_bytes: bool,
}

/// Arguments for the `write` command.
#[derive(Parser, Debug)]
pub struct WriteArgs {
    /// File to write.
    pub file: PathBuf,

    /// Data to write.
    pub data: String,

    /// Write the UTF-8 bytes of DATA without encoding.
    #[arg(long)]
    pub as_bytes: bool,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn try_parse_args() -> Result<Self, clap::Error> {
        Cli::try_parse()
    }
}
