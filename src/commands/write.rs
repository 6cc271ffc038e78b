//! Implementation of the `atomicio write` command.

use crate::cli::WriteArgs;
use atomicio::config::Config;
use atomicio::error::{AtomicIoError, Result};
use atomicio::SafeFile;
use serde_json::Value;

/// Atomically replace a file with the given data.
///
/// The target's directory must already exist. Data that parses as JSON is
/// written as that value; anything else is written as a string.
pub fn cmd_write(config: &Config, args: &WriteArgs) -> Result<()> {
    if let Some(parent) = args.file.parent()
        && !parent.as_os_str().is_empty()
        && !parent.is_dir()
    {
        return Err(AtomicIoError::Usage(format!(
            "directory does not exist: {}",
            parent.display()
        )));
    }

    let file = SafeFile::new(&args.file).with_config(config);

    if args.as_bytes {
        return file.write_bytes(args.data.as_bytes());
    }

    file.write(&parse_data(&args.data))
}

/// Parse command-line data as JSON, falling back to a plain string.
pub(super) fn parse_data(data: &str) -> Value {
    serde_json::from_str(data).unwrap_or_else(|_| Value::String(data.to_string()))
}
