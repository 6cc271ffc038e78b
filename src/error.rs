//! Error types for atomicio.
//!
//! Uses thiserror for derive macros. Filesystem and format failures are
//! wrapped at the operation boundary together with the path they concern, so
//! callers never see a bare `std::io::Error` from a handle operation.

use crate::exit_codes;
use crate::formats::FormatError;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Main error type for atomicio operations.
#[derive(Error, Debug)]
pub enum AtomicIoError {
    /// A timeout value could not be turned into a `TimeoutPolicy`.
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),

    /// Configuration file could not be loaded or failed validation.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Lock acquisition exceeded its bound.
    #[error("timed out after {timeout:?} waiting for lock on '{}'", path.display())]
    LockTimeout { path: PathBuf, timeout: Duration },

    /// Reading or decoding the file failed.
    #[error("failed to read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: FailureCause,
    },

    /// Encoding or atomically writing the file failed.
    #[error("failed to write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: FailureCause,
    },

    /// Appending to the file failed.
    #[error("failed to append to '{}': {source}", path.display())]
    Append {
        path: PathBuf,
        #[source]
        source: FailureCause,
    },

    /// An in-process or inter-process lock primitive failed for a reason
    /// other than a timeout.
    #[error("lock coordination failed for '{}': {message}", path.display())]
    LockCoordination { path: PathBuf, message: String },

    /// Bad command-line usage or a missing input.
    #[error("{0}")]
    Usage(String),
}

/// Underlying cause of a read, write or append failure.
#[derive(Error, Debug)]
pub enum FailureCause {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Format(#[from] FormatError),

    /// The blocking worker running the I/O panicked or was cancelled.
    #[error("background worker failed: {0}")]
    Worker(String),
}

impl AtomicIoError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            AtomicIoError::InvalidTimeout(_) => exit_codes::USER_ERROR,
            AtomicIoError::Config(_) => exit_codes::USER_ERROR,
            AtomicIoError::Usage(_) => exit_codes::USER_ERROR,
            AtomicIoError::LockTimeout { .. } => exit_codes::OPERATION_FAILURE,
            AtomicIoError::Read { .. } => exit_codes::OPERATION_FAILURE,
            AtomicIoError::Write { .. } => exit_codes::OPERATION_FAILURE,
            AtomicIoError::Append { .. } => exit_codes::OPERATION_FAILURE,
            AtomicIoError::LockCoordination { .. } => exit_codes::OPERATION_FAILURE,
        }
    }

    /// Whether this error is an acquisition timeout, which is safe to retry.
    pub fn is_timeout(&self) -> bool {
        matches!(self, AtomicIoError::LockTimeout { .. })
    }

    /// The file path this error concerns, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            AtomicIoError::LockTimeout { path, .. }
            | AtomicIoError::Read { path, .. }
            | AtomicIoError::Write { path, .. }
            | AtomicIoError::Append { path, .. }
            | AtomicIoError::LockCoordination { path, .. } => Some(path),
            _ => None,
        }
    }

    pub(crate) fn read(path: &Path, source: impl Into<FailureCause>) -> Self {
        AtomicIoError::Read {
            path: path.to_path_buf(),
            source: source.into(),
        }
    }

    pub(crate) fn write(path: &Path, source: impl Into<FailureCause>) -> Self {
        AtomicIoError::Write {
            path: path.to_path_buf(),
            source: source.into(),
        }
    }

    pub(crate) fn append(path: &Path, source: impl Into<FailureCause>) -> Self {
        AtomicIoError::Append {
            path: path.to_path_buf(),
            source: source.into(),
        }
    }

    pub(crate) fn timeout(path: &Path, timeout: Duration) -> Self {
        AtomicIoError::LockTimeout {
            path: path.to_path_buf(),
            timeout,
        }
    }
}

/// Result type alias for atomicio operations.
pub type Result<T> = std::result::Result<T, AtomicIoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_errors_are_user_errors() {
        let err = AtomicIoError::InvalidTimeout("nope".to_string());
        assert_eq!(err.exit_code(), exit_codes::USER_ERROR);

        let err = AtomicIoError::Config("release_retries must be at least 1".to_string());
        assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
    }

    #[test]
    fn operation_errors_are_operation_failures() {
        let err = AtomicIoError::read(
            Path::new("/tmp/a.json"),
            std::io::Error::other("disk on fire"),
        );
        assert_eq!(err.exit_code(), exit_codes::OPERATION_FAILURE);

        let err = AtomicIoError::timeout(Path::new("/tmp/a.json"), Duration::from_secs(1));
        assert_eq!(err.exit_code(), exit_codes::OPERATION_FAILURE);
    }

    #[test]
    fn timeouts_are_distinguishable_from_io_failures() {
        let timeout = AtomicIoError::timeout(Path::new("/tmp/a.json"), Duration::from_millis(500));
        assert!(timeout.is_timeout());

        let write = AtomicIoError::write(Path::new("/tmp/a.json"), std::io::Error::other("boom"));
        assert!(!write.is_timeout());
    }

    #[test]
    fn error_messages_carry_path_and_cause() {
        let err = AtomicIoError::append(
            Path::new("/data/log.txt"),
            std::io::Error::other("read-only filesystem"),
        );
        let message = err.to_string();
        assert!(message.contains("/data/log.txt"));
        assert!(message.contains("read-only filesystem"));
        assert_eq!(err.path(), Some(Path::new("/data/log.txt")));

        let err = AtomicIoError::timeout(Path::new("/data/a.json"), Duration::from_millis(250));
        assert!(err.to_string().contains("250ms"));
    }
}
