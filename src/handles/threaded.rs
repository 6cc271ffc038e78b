//! Handle backed by a per-path reentrant thread lock.

use super::io::FileOps;
use super::{canonical_path, timed_out};
use crate::config::Config;
use crate::error::{AtomicIoError, Result};
use crate::formats::FormatRegistry;
use crate::locks::{ReentrantGuard, ThreadLockRegistry, TimeoutPolicy};
use serde_json::Value;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// A file coordinated between threads of this process.
///
/// Operations called directly on the handle lock and unlock around each
/// call. [`lock`](Self::lock) and [`with_lock`](Self::with_lock) hold the
/// path's lock across several operations. The lock is reentrant, so the
/// thread holding a session may still call the handle's own operations.
///
/// Only threads of this process are coordinated; no sentinel file is used.
#[derive(Debug, Clone)]
pub struct ThreadedSafeFile {
    ops: FileOps,
    timeout: TimeoutPolicy,
    registry: Arc<ThreadLockRegistry>,
}

impl ThreadedSafeFile {
    /// A handle that waits indefinitely for its lock.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self::with_timeout(path, TimeoutPolicy::Infinite)
    }

    pub fn with_timeout(path: impl AsRef<Path>, timeout: impl Into<TimeoutPolicy>) -> Self {
        Self {
            ops: FileOps::new(canonical_path(path.as_ref()), FormatRegistry::global()),
            timeout: timeout.into(),
            registry: ThreadLockRegistry::global(),
        }
    }

    /// Take the timeout from `config`.
    pub fn with_config(mut self, config: &Config) -> Self {
        self.timeout = config.timeout;
        self
    }

    pub fn with_formats(mut self, formats: Arc<FormatRegistry>) -> Self {
        self.ops.set_formats(formats);
        self
    }

    /// Look locks up in `registry` instead of the process-wide one.
    pub fn with_registry(mut self, registry: Arc<ThreadLockRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// The canonical path of the file.
    pub fn path(&self) -> &Path {
        self.ops.path()
    }

    pub fn timeout(&self) -> TimeoutPolicy {
        self.timeout
    }

    pub fn supported_formats(&self) -> Vec<String> {
        self.ops.formats().extensions()
    }

    /// Evict idle, unreferenced locks from this handle's registry.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_locks(&self) -> usize {
        self.registry.cleanup()
    }

    /// Acquire the path's lock and hold it until the session is dropped.
    ///
    /// # Returns
    ///
    /// * `Ok(ThreadedSession)` - Lock held for the session's lifetime
    /// * `Err(AtomicIoError::LockTimeout)` - Another thread held it past the timeout
    ///
    /// # Example
    ///
    /// ```no_run
    /// use atomicio::ThreadedSafeFile;
    /// use serde_json::json;
    ///
    /// let file = ThreadedSafeFile::new("counter.json");
    /// let session = file.lock()?;
    /// let count = session.read()?.and_then(|v| v["count"].as_i64()).unwrap_or(0);
    /// session.write(&json!({"count": count + 1}))?;
    /// # Ok::<(), atomicio::AtomicIoError>(())
    /// ```
    pub fn lock(&self) -> Result<ThreadedSession<'_>> {
        let guard = self.acquire()?;
        tracing::debug!(path = %self.path().display(), "thread session started");
        Ok(ThreadedSession {
            file: self,
            guard: Some(guard),
        })
    }

    /// Run `f` with the lock held, releasing it however `f` exits.
    ///
    /// Errors returned by `f` pass through unchanged; a panic unwinds
    /// through the session's drop, which releases the lock.
    pub fn with_lock<T, E, F>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&ThreadedSession<'_>) -> std::result::Result<T, E>,
        E: From<AtomicIoError>,
    {
        let session = self.lock()?;
        let result = f(&session);
        session.release();
        result
    }

    pub fn read(&self) -> Result<Option<Value>> {
        let _guard = self.acquire()?;
        self.ops.read()
    }

    pub fn write(&self, value: &Value) -> Result<()> {
        let _guard = self.acquire()?;
        self.ops.write(value)
    }

    pub fn append(&self, text: &str) -> Result<()> {
        let _guard = self.acquire()?;
        self.ops.append(text)
    }

    pub fn read_bytes(&self) -> Result<Option<Vec<u8>>> {
        let _guard = self.acquire()?;
        self.ops.read_bytes()
    }

    pub fn write_bytes(&self, data: &[u8]) -> Result<()> {
        let _guard = self.acquire()?;
        self.ops.write_bytes(data)
    }

    fn acquire(&self) -> Result<ReentrantGuard> {
        let deadline = self.timeout.deadline_from(Instant::now());
        self.registry
            .get_or_create(self.path())
            .acquire_until(deadline)
            .ok_or_else(|| timed_out(self.path(), self.timeout))
    }
}

/// The path's thread lock, held across operations.
///
/// Operations on the session never touch the lock. The lock is released
/// when the session is dropped or [`release`](Self::release)d; a session
/// cannot be reacquired.
pub struct ThreadedSession<'a> {
    file: &'a ThreadedSafeFile,
    guard: Option<ReentrantGuard>,
}

impl ThreadedSession<'_> {
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

    /// Release the lock now instead of at the end of scope.
    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if self.guard.take().is_some() {
            tracing::debug!(path = %self.path().display(), "thread session released");
        }
    }
}

impl fmt::Debug for ThreadedSession<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadedSession")
            .field("path", &self.path())
            .field("held", &self.guard.is_some())
            .finish()
    }
}

impl Drop for ThreadedSession<'_> {
    fn drop(&mut self) {
        self.release_inner();
    }
}
