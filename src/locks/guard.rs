//! RAII guard for the inter-process sentinel lock.

use super::ignore::ensure_lock_pattern_ignored;
use super::interprocess::LockOptions;
use fs2::FileExt;
use std::fs::File;
use std::path::{Path, PathBuf};

/// RAII guard for a held sentinel lock.
///
/// When dropped, the OS lock is released. Release is best-effort: failures
/// are retried, then logged, and never surface to the caller. The sentinel
/// file itself stays on disk.
#[derive(Debug)]
pub struct InterProcessGuard {
    /// Open handle carrying the OS lock; `None` once released.
    file: Option<File>,

    /// The file the lock protects.
    target: PathBuf,

    /// Path to the sentinel file.
    sentinel: PathBuf,

    options: LockOptions,
}

impl InterProcessGuard {
    pub(super) fn new(file: File, target: PathBuf, sentinel: PathBuf, options: LockOptions) -> Self {
        Self {
            file: Some(file),
            target,
            sentinel,
            options,
        }
    }

    /// Get the path to the sentinel file.
    pub fn sentinel(&self) -> &Path {
        &self.sentinel
    }

    pub fn is_released(&self) -> bool {
        self.file.is_none()
    }

    /// Manually release the lock before the guard goes out of scope.
    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        let Some(file) = self.file.take() else {
            return;
        };

        // Runs before unlocking so only one holder at a time edits the ignore file.
        if self.options.update_ignore_file {
            ensure_lock_pattern_ignored(&self.target);
        }

        let attempts = self.options.release_retries.max(1);
        let mut last_error = None;
        for attempt in 1..=attempts {
            match FileExt::unlock(&file) {
                Ok(()) => {
                    last_error = None;
                    break;
                }
                Err(e) => {
                    tracing::debug!(
                        sentinel = %self.sentinel.display(),
                        attempt,
                        error = %e,
                        "unlock attempt failed"
                    );
                    last_error = Some(e);
                    if attempt < attempts {
                        std::thread::sleep(self.options.release_backoff * attempt);
                    }
                }
            }
        }

        // Closing the handle drops the OS lock even if unlock kept failing.
        drop(file);

        if let Some(e) = last_error {
            tracing::warn!(
                sentinel = %self.sentinel.display(),
                error = %e,
                "failed to release inter-process lock after {} attempts",
                attempts
            );
        } else {
            tracing::debug!(sentinel = %self.sentinel.display(), "inter-process lock released");
        }
    }
}

impl Drop for InterProcessGuard {
    fn drop(&mut self) {
        self.release_inner();
    }
}
