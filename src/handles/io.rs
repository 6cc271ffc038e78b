//! Unlocked file operations shared by every handle and session.
//!
//! Callers are responsible for holding the appropriate locks. Every failure
//! leaves this module wrapped in the error variant of the operation together
//! with the target path.

use crate::error::{AtomicIoError, FailureCause, Result};
use crate::formats::FormatRegistry;
use crate::fs::{atomic_write, atomic_write_with};
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Which operation a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OpKind {
    Read,
    Write,
    Append,
}

impl OpKind {
    pub(crate) fn error(self, path: &Path, cause: impl Into<FailureCause>) -> AtomicIoError {
        match self {
            OpKind::Read => AtomicIoError::read(path, cause),
            OpKind::Write => AtomicIoError::write(path, cause),
            OpKind::Append => AtomicIoError::append(path, cause),
        }
    }
}

/// A canonical target path and the formats used to encode it.
#[derive(Debug, Clone)]
pub(crate) struct FileOps {
    path: PathBuf,
    formats: Arc<FormatRegistry>,
}

impl FileOps {
    pub(crate) fn new(path: PathBuf, formats: Arc<FormatRegistry>) -> Self {
        Self { path, formats }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn formats(&self) -> &Arc<FormatRegistry> {
        &self.formats
    }

    pub(crate) fn set_formats(&mut self, formats: Arc<FormatRegistry>) {
        self.formats = formats;
    }

    /// Whether the directory that will hold the file exists.
    pub(crate) fn parent_exists(&self) -> bool {
        self.path.parent().is_none_or(Path::is_dir)
    }

    /// Create the directory that will hold the file.
    pub(crate) fn create_parent(&self, kind: OpKind) -> Result<()> {
        match self.path.parent() {
            Some(parent) if !parent.is_dir() => {
                fs::create_dir_all(parent).map_err(|e| kind.error(&self.path, e))
            }
            _ => Ok(()),
        }
    }

    /// Decode the file with the format registered for its extension.
    ///
    /// A missing file reads as `None`. A zero-length file is handed to the
    /// format, so text reads as `""` and TOML as `{}`; formats that cannot
    /// decode zero bytes (JSON) or decode them to null (YAML) read as `None`.
    pub(crate) fn read(&self) -> Result<Option<Value>> {
        let Some(raw) = self.read_bytes()? else {
            return Ok(None);
        };

        let format = self.formats.lookup_path(&self.path);
        if raw.is_empty() {
            return Ok(format
                .ok()
                .and_then(|format| format.decode(&raw).ok())
                .filter(|value| !value.is_null()));
        }

        format
            .map_err(|e| OpKind::Read.error(&self.path, e))?
            .decode(&raw)
            .map(Some)
            .map_err(|e| OpKind::Read.error(&self.path, e))
    }

    /// Encode `value` and atomically replace the file with it.
    ///
    /// The format is resolved before anything touches the disk, so an
    /// unsupported extension never leaves a pending file behind.
    pub(crate) fn write(&self, value: &Value) -> Result<()> {
        let format = self
            .formats
            .lookup_path(&self.path)
            .map_err(|e| OpKind::Write.error(&self.path, e))?;

        atomic_write_with(&self.path, |out| -> std::result::Result<(), FailureCause> {
            format.encode(value, out)?;
            Ok(())
        })
        .map_err(|cause| OpKind::Write.error(&self.path, cause))?;

        tracing::debug!(path = %self.path.display(), "wrote value");
        Ok(())
    }

    /// Append `text` to the end of the file, creating it if needed.
    ///
    /// This is not atomic: a crash mid-append can leave partial content.
    pub(crate) fn append(&self, text: &str) -> Result<()> {
        let append = || -> io::Result<()> {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?;
            file.write_all(text.as_bytes())?;
            file.flush()
        };
        append().map_err(|e| OpKind::Append.error(&self.path, e))
    }

    /// Raw file content, or `None` if the file does not exist.
    pub(crate) fn read_bytes(&self) -> Result<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(OpKind::Read.error(&self.path, e)),
        }
    }

    /// Atomically replace the file with `data`.
    pub(crate) fn write_bytes(&self, data: &[u8]) -> Result<()> {
        atomic_write(&self.path, data).map_err(|e| OpKind::Write.error(&self.path, e))
    }
}
