//! Advisory inter-process lock on a sentinel file.
//!
//! The sentinel lives next to the target as `<file name>.lock` and is locked
//! with the OS advisory exclusive lock (`flock` on Unix, `LockFileEx` on
//! Windows) through `fs2`. Only processes using the same mechanism are
//! coordinated.
//!
//! The sentinel is opened with create-without-truncate and is never deleted:
//! removing a locked file lets a newcomer lock a fresh inode while a waiter
//! still holds the old one, producing two holders. A sentinel left behind by
//! a crashed process does not block anyone because the OS lock died with it.
//!
//! No fairness is promised. Waiters poll with exponential backoff, and on
//! networked filesystems throughput under heavy contention can be poor.

use super::guard::InterProcessGuard;
use super::timeout::TimeoutPolicy;
use crate::error::{AtomicIoError, Result};
use fs2::FileExt;
use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Suffix appended to a target's file name to form its sentinel.
pub const LOCK_SUFFIX: &str = ".lock";

/// Tuning for inter-process acquisition and release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockOptions {
    /// Unlock attempts before giving up with a warning.
    pub release_retries: u32,
    /// Pause between unlock attempts.
    pub release_backoff: Duration,
    /// First pause between acquisition attempts.
    pub poll_interval: Duration,
    /// Upper bound for the doubling acquisition pause.
    pub max_poll_interval: Duration,
    /// Whether to add `*.lock` to the enclosing project's `.gitignore`.
    pub update_ignore_file: bool,
}

impl Default for LockOptions {
    fn default() -> Self {
        Self {
            release_retries: 3,
            release_backoff: Duration::from_millis(10),
            poll_interval: Duration::from_millis(10),
            max_poll_interval: Duration::from_millis(250),
            update_ignore_file: true,
        }
    }
}

/// Sentinel-file lock for one target path.
#[derive(Debug, Clone)]
pub struct InterProcessLock {
    target: PathBuf,
    sentinel: PathBuf,
    options: LockOptions,
}

impl InterProcessLock {
    pub fn new(target: impl Into<PathBuf>) -> Self {
        Self::with_options(target, LockOptions::default())
    }

    pub fn with_options(target: impl Into<PathBuf>, options: LockOptions) -> Self {
        let target = target.into();
        let sentinel = sentinel_path(&target);
        Self {
            target,
            sentinel,
            options,
        }
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn sentinel(&self) -> &Path {
        &self.sentinel
    }

    pub fn options(&self) -> &LockOptions {
        &self.options
    }

    /// Acquire the lock, waiting as long as `timeout` allows.
    ///
    /// # Returns
    ///
    /// * `Ok(InterProcessGuard)` - Lock held until the guard is released or dropped
    /// * `Err(AtomicIoError::LockTimeout)` - Another holder outlasted the timeout
    /// * `Err(AtomicIoError::LockCoordination)` - The sentinel could not be opened or locked
    pub fn acquire(&self, timeout: TimeoutPolicy) -> Result<InterProcessGuard> {
        let start = Instant::now();
        let deadline = timeout.deadline_from(start);
        let mut pause = self.options.poll_interval;

        loop {
            if let Some(file) = self.try_lock_once()? {
                tracing::debug!(
                    sentinel = %self.sentinel.display(),
                    waited_ms = start.elapsed().as_millis() as u64,
                    "inter-process lock acquired"
                );
                return Ok(InterProcessGuard::new(
                    file,
                    self.target.clone(),
                    self.sentinel.clone(),
                    self.options.clone(),
                ));
            }

            if let Some(deadline) = deadline {
                let now = Instant::now();
                if now >= deadline {
                    tracing::debug!(sentinel = %self.sentinel.display(), "inter-process lock timed out");
                    return Err(AtomicIoError::timeout(
                        &self.target,
                        timeout.as_duration().unwrap_or_default(),
                    ));
                }
                pause = pause.min(deadline - now);
            }

            std::thread::sleep(pause);
            pause = (pause * 2)
                .min(self.options.max_poll_interval)
                .max(self.options.poll_interval);
        }
    }

    /// Try once to lock the sentinel.
    ///
    /// Returns `Ok(None)` when another holder has it.
    pub fn try_acquire(&self) -> Result<Option<InterProcessGuard>> {
        Ok(self.try_lock_once()?.map(|file| {
            InterProcessGuard::new(
                file,
                self.target.clone(),
                self.sentinel.clone(),
                self.options.clone(),
            )
        }))
    }

    fn try_lock_once(&self) -> Result<Option<File>> {
        let file = self.open_sentinel().map_err(|e| AtomicIoError::LockCoordination {
            path: self.target.clone(),
            message: format!(
                "failed to open lock file '{}': {}",
                self.sentinel.display(),
                e
            ),
        })?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(file)),
            Err(e) if is_contended(&e) => Ok(None),
            Err(e) => Err(AtomicIoError::LockCoordination {
                path: self.target.clone(),
                message: format!("failed to lock '{}': {}", self.sentinel.display(), e),
            }),
        }
    }

    fn open_sentinel(&self) -> io::Result<File> {
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.sentinel)
    }
}

/// The sentinel path for `target`: its file name with [`LOCK_SUFFIX`] added.
pub fn sentinel_path(target: &Path) -> PathBuf {
    let mut name: OsString = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(LOCK_SUFFIX);
    target.with_file_name(name)
}

fn is_contended(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}
