//! Atomic filesystem writes.
//!
//! All atomic writes follow this pattern:
//! 1. Create a uniquely named temporary file in the same directory as the target
//! 2. Let the caller write the payload into it
//! 3. Flush, then sync the file contents to disk (fsync)
//! 4. Rename the temporary file over the target in one step
//!
//! Readers therefore see either the complete old content or the complete new
//! content. Keeping the temporary file in the target's directory keeps the
//! rename on one filesystem, which is what makes it atomic.
//!
//! # Important Notes
//!
//! - On any failure before the rename, the temporary file is removed and the
//!   target is left untouched.
//! - If the process dies between creating the temporary file and the rename,
//!   a stray `.{filename}.XXXXXX.tmp` may remain. Nothing scans for these.
//! - Payloads are written byte for byte; text goes in as UTF-8 with no
//!   newline translation.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Atomically write a payload produced by `write_fn` to `path`.
///
/// `write_fn` receives a buffered writer over the pending temporary file.
/// Any error it returns aborts the write and propagates unchanged.
///
/// # Example
///
/// ```no_run
/// use atomicio::fs::atomic_write_with;
/// use std::io::Write;
/// use std::path::Path;
///
/// atomic_write_with(Path::new("notes.txt"), |out| -> std::io::Result<()> {
///     out.write_all(b"first line\n")?;
///     out.write_all(b"second line\n")
/// })?;
/// # Ok::<(), std::io::Error>(())
/// ```
pub fn atomic_write_with<F, E>(path: &Path, write_fn: F) -> Result<(), E>
where
    F: FnOnce(&mut dyn Write) -> Result<(), E>,
    E: From<io::Error>,
{
    let parent = parent_dir(path);

    if !parent.exists() {
        fs::create_dir_all(parent)?;
    }

    let mut pending = create_pending(path, parent)?;

    {
        let mut writer = BufWriter::new(pending.as_file_mut());
        write_fn(&mut writer)?;
        writer.flush()?;
    }

    pending.as_file().sync_all()?;

    // Dropping a failed PersistError removes the temporary file.
    pending.persist(path).map_err(|e| e.error)?;

    sync_dir(parent);

    tracing::trace!(path = %path.display(), "atomic write committed");
    Ok(())
}

/// Atomically write bytes to a file.
pub fn atomic_write<P: AsRef<Path>>(path: P, content: &[u8]) -> io::Result<()> {
    atomic_write_with(path.as_ref(), |out| out.write_all(content))
}

/// Atomically write a string to a file as UTF-8.
pub fn atomic_write_str<P: AsRef<Path>>(path: P, content: &str) -> io::Result<()> {
    atomic_write(path, content.as_bytes())
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Create the pending temporary file next to the target.
fn create_pending(target: &Path, parent: &Path) -> io::Result<NamedTempFile> {
    let filename = target
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid file path '{}'", target.display()),
            )
        })?;

    tempfile::Builder::new()
        .prefix(&format!(".{}.", filename))
        .suffix(".tmp")
        .tempfile_in(parent)
}

/// Persist the directory entry after a rename.
#[cfg(unix)]
fn sync_dir(dir: &Path) {
    if let Ok(handle) = File::open(dir)
        && let Err(e) = handle.sync_all()
    {
        tracing::debug!(dir = %dir.display(), error = %e, "directory sync failed");
    }
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) {}
