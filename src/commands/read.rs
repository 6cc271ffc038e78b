//! Implementation of the `atomicio read` command.

use super::{output_error, write_line};
use crate::cli::ReadArgs;
use atomicio::config::Config;
use atomicio::error::{AtomicIoError, Result};
use atomicio::SafeFile;
use serde_json::Value;
use std::io::Write;

/// Print the decoded content of a file, or its raw bytes with `--as-bytes`.
///
/// A missing file is a usage error. An empty file prints an empty line.
pub fn cmd_read(config: &Config, args: &ReadArgs, out: &mut dyn Write) -> Result<()> {
    if !args.file.exists() {
        return Err(AtomicIoError::Usage(format!(
            "file not found: {}",
            args.file.display()
        )));
    }

    let file = SafeFile::new(&args.file).with_config(config);

    if args.as_bytes {
        let raw = file.read_bytes()?.unwrap_or_default();
        out.write_all(&raw).map_err(output_error)?;
        return out.flush().map_err(output_error);
    }

    match file.read()? {
        Some(Value::String(text)) => write_line(out, &text),
        Some(value @ (Value::Object(_) | Value::Array(_))) => {
            let pretty = serde_json::to_string_pretty(&value)
                .map_err(|e| AtomicIoError::Usage(format!("failed to render value: {}", e)))?;
            write_line(out, &pretty)
        }
        Some(scalar) => write_line(out, &scalar.to_string()),
        None => write_line(out, ""),
    }
}
