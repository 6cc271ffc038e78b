//! Implementation of the `atomicio formats` command.

use super::write_line;
use atomicio::error::Result;
use atomicio::formats::FormatRegistry;
use std::io::Write;

/// Print the extensions the built-in format registry handles.
pub fn cmd_formats(out: &mut dyn Write) -> Result<()> {
    let extensions = FormatRegistry::global().extensions();
    write_line(out, &format!("Supported formats: {}", extensions.join(", ")))
}
