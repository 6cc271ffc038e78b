//! Keep sentinel files out of version control.
//!
//! When a locked file lives inside a git working tree, `*.lock` is added to
//! the `.gitignore` at the working tree root. Every failure here is logged
//! and swallowed.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Pattern that matches every sentinel file.
pub const LOCK_IGNORE_PATTERN: &str = "*.lock";

/// Find the nearest ancestor of `start` that contains a `.git` entry.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
}

/// Best-effort: make sure the project enclosing `target` ignores sentinels.
pub fn ensure_lock_pattern_ignored(target: &Path) {
    let Some(dir) = target.parent() else {
        return;
    };
    let Some(root) = find_project_root(dir) else {
        return;
    };

    let ignore_file = root.join(".gitignore");
    match append_pattern_if_missing(&ignore_file, LOCK_IGNORE_PATTERN) {
        Ok(true) => {
            tracing::debug!(file = %ignore_file.display(), "added lock pattern to ignore file")
        }
        Ok(false) => {}
        Err(e) => tracing::warn!(
            file = %ignore_file.display(),
            error = %e,
            "failed to update ignore file"
        ),
    }
}

/// Append `pattern` as its own line unless a line already equals it.
///
/// Returns whether the file was changed.
fn append_pattern_if_missing(ignore_file: &Path, pattern: &str) -> io::Result<bool> {
    let existing = match fs::read_to_string(ignore_file) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e),
    };

    if existing.lines().any(|line| line.trim() == pattern) {
        return Ok(false);
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(ignore_file)?;

    if !existing.is_empty() && !existing.ends_with('\n') {
        file.write_all(b"\n")?;
    }
    writeln!(file, "{}", pattern)?;
    Ok(true)
}
