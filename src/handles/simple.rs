//! Handle that locks once per call.

use super::io::{FileOps, OpKind};
use super::{canonical_path, timed_out};
use crate::config::Config;
use crate::error::{AtomicIoError, Result};
use crate::formats::FormatRegistry;
use crate::locks::{
    InterProcessGuard, InterProcessLock, LockOptions, ReentrantGuard, ReentrantLock,
    TimeoutPolicy,
};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};
use std::sync::Arc;
use std::time::Instant;

thread_local! {
    /// Sentinel locks held by this thread, shared by nested critical sections.
    static HELD_SENTINELS: RefCell<HashMap<PathBuf, Weak<InterProcessGuard>>> =
        RefCell::new(HashMap::new());
}

/// A file whose every operation is its own critical section.
///
/// Each call acquires the process-wide reentrant thread lock, then the
/// inter-process sentinel lock, performs the I/O and releases both in reverse
/// order. Nothing is held between calls, so a read-modify-write built from
/// separate calls can lose updates under contention. Use [`lock`](Self::lock)
/// or [`with_lock`](Self::with_lock) when that matters.
///
/// Per-call operations made on a thread that already holds a [`SafeSession`]
/// for the same path re-enter both locks instead of waiting on themselves.
///
/// The sentinel lives beside the file, so its directory must exist before
/// the inter-process lock can be taken: reads of a file in a missing
/// directory return `None` without locking, writes create the directory
/// first, and appends fail with [`AtomicIoError::Append`](crate::AtomicIoError::Append).
///
/// # Example
///
/// ```no_run
/// use atomicio::SafeFile;
/// use serde_json::json;
///
/// let file = SafeFile::new("settings.json");
/// file.write(&json!({"theme": "dark"}))?;
/// assert_eq!(file.read()?, Some(json!({"theme": "dark"})));
/// # Ok::<(), atomicio::AtomicIoError>(())
/// ```
#[derive(Debug, Clone)]
pub struct SafeFile {
    ops: FileOps,
    timeout: TimeoutPolicy,
    thread_lock: Arc<ReentrantLock>,
    lock_options: LockOptions,
}

impl SafeFile {
    /// A handle that waits indefinitely for its locks.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self::with_timeout(path, TimeoutPolicy::Infinite)
    }

    pub fn with_timeout(path: impl AsRef<Path>, timeout: impl Into<TimeoutPolicy>) -> Self {
        Self {
            ops: FileOps::new(canonical_path(path.as_ref()), FormatRegistry::global()),
            timeout: timeout.into(),
            thread_lock: ReentrantLock::process_wide(),
            lock_options: LockOptions::default(),
        }
    }

    /// Take the timeout and inter-process lock tuning from `config`.
    pub fn with_config(mut self, config: &Config) -> Self {
        self.timeout = config.timeout;
        self.lock_options = config.lock_options();
        self
    }

    pub fn with_formats(mut self, formats: Arc<FormatRegistry>) -> Self {
        self.ops.set_formats(formats);
        self
    }

    /// Use `lock` instead of the process-wide thread lock.
    pub fn with_thread_lock(mut self, lock: Arc<ReentrantLock>) -> Self {
        self.thread_lock = lock;
        self
    }

    /// The canonical path of the file.
    pub fn path(&self) -> &Path {
        self.ops.path()
    }

    pub fn timeout(&self) -> TimeoutPolicy {
        self.timeout
    }

    /// Extensions this handle can encode and decode.
    pub fn supported_formats(&self) -> Vec<String> {
        self.ops.formats().extensions()
    }

    /// Hold the thread lock and the inter-process lock until the returned
    /// session is released or dropped.
    ///
    /// The file's directory is created if needed, since the sentinel lives
    /// there.
    pub fn lock(&self) -> Result<SafeSession<'_>> {
        self.ops.create_parent(OpKind::Write)?;
        let (thread_guard, process) = self.enter()?;
        tracing::debug!(path = %self.path().display(), "file session started");
        Ok(SafeSession {
            file: self,
            process: Some(process),
            thread_guard: Some(thread_guard),
        })
    }

    /// Run `f` with both locks held, releasing them however `f` exits.
    pub fn with_lock<T, E, F>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&SafeSession<'_>) -> std::result::Result<T, E>,
        E: From<AtomicIoError>,
    {
        let session = self.lock()?;
        let result = f(&session);
        session.release();
        result
    }

    /// Read and decode the file; `None` if it does not exist.
    pub fn read(&self) -> Result<Option<Value>> {
        if !self.ops.parent_exists() {
            return Ok(None);
        }
        self.locked(|ops| ops.read())
    }

    /// Encode `value` and atomically replace the file.
    pub fn write(&self, value: &Value) -> Result<()> {
        self.ops.create_parent(OpKind::Write)?;
        self.locked(|ops| ops.write(value))
    }

    /// Append `text` to the file. Not atomic.
    pub fn append(&self, text: &str) -> Result<()> {
        if !self.ops.parent_exists() {
            return Err(OpKind::Append.error(
                self.path(),
                std::io::Error::from(std::io::ErrorKind::NotFound),
            ));
        }
        self.locked(|ops| ops.append(text))
    }

    /// Read the raw bytes; `None` if the file does not exist.
    pub fn read_bytes(&self) -> Result<Option<Vec<u8>>> {
        if !self.ops.parent_exists() {
            return Ok(None);
        }
        self.locked(|ops| ops.read_bytes())
    }

    /// Atomically replace the file with `data`.
    pub fn write_bytes(&self, data: &[u8]) -> Result<()> {
        self.ops.create_parent(OpKind::Write)?;
        self.locked(|ops| ops.write_bytes(data))
    }

    /// Run `op` holding the thread lock and then the inter-process lock.
    fn locked<T>(&self, op: impl FnOnce(&FileOps) -> Result<T>) -> Result<T> {
        let (thread_guard, process) = self.enter()?;
        let result = op(&self.ops);

        drop(process);
        drop(thread_guard);
        result
    }

    /// Take the thread lock, then the inter-process lock, under one deadline
    /// derived from the handle's timeout.
    fn enter(&self) -> Result<(ReentrantGuard, ProcessHold)> {
        let path = self.ops.path();
        let deadline = self.timeout.deadline_from(Instant::now());

        let thread_guard = self
            .thread_lock
            .acquire_until(deadline)
            .ok_or_else(|| timed_out(path, self.timeout))?;

        let remaining = match deadline {
            Some(deadline) => {
                TimeoutPolicy::Explicit(deadline.saturating_duration_since(Instant::now()))
            }
            None => TimeoutPolicy::Infinite,
        };
        let process = ProcessHold::acquire(path, &self.lock_options, remaining).map_err(|e| {
            if e.is_timeout() {
                timed_out(path, self.timeout)
            } else {
                e
            }
        })?;

        Ok((thread_guard, process))
    }
}

/// A share of this thread's sentinel lock on one path.
///
/// The first hold on a path takes the OS lock; later holds on the same
/// thread reuse it. The lock is released when the last share is dropped.
struct ProcessHold {
    path: PathBuf,
    guard: Option<Rc<InterProcessGuard>>,
}

impl ProcessHold {
    fn acquire(path: &Path, options: &LockOptions, timeout: TimeoutPolicy) -> Result<Self> {
        let held = HELD_SENTINELS.with_borrow(|held| held.get(path).and_then(Weak::upgrade));
        let guard = match held {
            Some(guard) => guard,
            None => {
                let lock = InterProcessLock::with_options(path, options.clone());
                let guard = Rc::new(lock.acquire(timeout)?);
                HELD_SENTINELS.with_borrow_mut(|held| {
                    held.insert(path.to_path_buf(), Rc::downgrade(&guard))
                });
                guard
            }
        };

        Ok(Self {
            path: path.to_path_buf(),
            guard: Some(guard),
        })
    }
}

impl Drop for ProcessHold {
    fn drop(&mut self) {
        let Some(guard) = self.guard.take() else {
            return;
        };
        if Rc::strong_count(&guard) == 1 {
            HELD_SENTINELS.with_borrow_mut(|held| held.remove(&self.path));
        }
        // The last share releases the OS lock here.
        drop(guard);
    }
}

/// The thread lock and the inter-process lock, held across operations.
///
/// Operations on the session run under the held locks. Both are released,
/// inter-process lock first, when the session is dropped or
/// [`release`](Self::release)d.
pub struct SafeSession<'a> {
    file: &'a SafeFile,
    process: Option<ProcessHold>,
    thread_guard: Option<ReentrantGuard>,
}

impl SafeSession<'_> {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn read(&self) -> Result<Option<Value>> {
        self.file.ops.read()
    }

    pub fn write(&self, value: &Value) -> Result<()> {
        self.file.ops.write(value)
    }

    pub fn append(&self, text: &str) -> Result<()> {
        self.file.ops.append(text)
    }

    pub fn read_bytes(&self) -> Result<Option<Vec<u8>>> {
        self.file.ops.read_bytes()
    }

    pub fn write_bytes(&self, data: &[u8]) -> Result<()> {
        self.file.ops.write_bytes(data)
    }

    /// Release both locks now instead of at the end of scope.
    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        let held = self.process.take().is_some();
        self.thread_guard.take();
        if held {
            tracing::debug!(path = %self.path().display(), "file session released");
        }
    }
}

impl fmt::Debug for SafeSession<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SafeSession")
            .field("path", &self.path())
            .field("held", &self.process.is_some())
            .finish()
    }
}

impl Drop for SafeSession<'_> {
    fn drop(&mut self) {
        self.release_inner();
    }
}
