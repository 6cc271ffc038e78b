//! Handle for tasks on a tokio runtime.
//!
//! Locking uses one `tokio::sync::Mutex` per canonical path, so waiting for
//! a lock suspends the task instead of blocking the runtime thread. File
//! I/O runs on the blocking pool via `spawn_blocking`; the mutex guard is
//! moved into the blocking closure, so the lock outlives a caller that stops
//! awaiting mid-operation and is released only when the I/O has finished.
//!
//! Acquisition with a timeout is cancel-safe: the pending `lock_owned`
//! future is dropped on expiry, which withdraws it from the mutex's queue
//! without ever handing it the lock.

use super::io::{FileOps, OpKind};
use super::{canonical_path, timed_out};
use crate::config::Config;
use crate::error::{FailureCause, Result};
use crate::formats::FormatRegistry;
use crate::locks::{AsyncLockRegistry, TimeoutPolicy};
use serde_json::Value;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;
use tokio::task::JoinError;

/// A file coordinated between tasks of this process.
///
/// The mutex is not reentrant: a task holding an [`AsyncSession`] must use
/// the session's operations, since calling the handle's own operations from
/// that task waits for itself until the timeout expires.
#[derive(Debug, Clone)]
pub struct AsyncSafeFile {
    ops: FileOps,
    timeout: TimeoutPolicy,
    registry: Arc<AsyncLockRegistry>,
}

impl AsyncSafeFile {
    /// A handle that waits indefinitely for its lock.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self::with_timeout(path, TimeoutPolicy::Infinite)
    }

    pub fn with_timeout(path: impl AsRef<Path>, timeout: impl Into<TimeoutPolicy>) -> Self {
        Self {
            ops: FileOps::new(canonical_path(path.as_ref()), FormatRegistry::global()),
            timeout: timeout.into(),
            registry: AsyncLockRegistry::global(),
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

    /// Look mutexes up in `registry` instead of the process-wide one.
    pub fn with_registry(mut self, registry: Arc<AsyncLockRegistry>) -> Self {
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

    /// Evict unlocked, unreferenced mutexes from this handle's registry.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_locks(&self) -> usize {
        self.registry.cleanup()
    }

    /// Acquire the path's mutex and hold it until the session is dropped.
    ///
    /// If the timeout expires first, the pending acquisition is cancelled
    /// and `AtomicIoError::LockTimeout` is returned; the mutex is never left
    /// held by the abandoned attempt.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use atomicio::AsyncSafeFile;
    /// use serde_json::json;
    ///
    /// # async fn bump() -> atomicio::Result<()> {
    /// let file = AsyncSafeFile::new("counter.json");
    /// let mut session = file.lock().await?;
    /// let count = session.read().await?.and_then(|v| v["count"].as_i64()).unwrap_or(0);
    /// session.write(&json!({"count": count + 1})).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn lock(&self) -> Result<AsyncSession<'_>> {
        let guard = self.acquire().await?;
        tracing::debug!(path = %self.path().display(), "task session started");
        Ok(AsyncSession {
            file: self,
            guard: Some(Arc::new(guard)),
        })
    }

    pub async fn read(&self) -> Result<Option<Value>> {
        let guard = self.acquire().await?;
        dispatch(&self.ops, guard, OpKind::Read, |ops| ops.read()).await
    }

    pub async fn write(&self, value: &Value) -> Result<()> {
        let guard = self.acquire().await?;
        let value = value.clone();
        dispatch(&self.ops, guard, OpKind::Write, move |ops| ops.write(&value)).await
    }

    pub async fn append(&self, text: &str) -> Result<()> {
        let guard = self.acquire().await?;
        let text = text.to_owned();
        dispatch(&self.ops, guard, OpKind::Append, move |ops| ops.append(&text)).await
    }

    pub async fn read_bytes(&self) -> Result<Option<Vec<u8>>> {
        let guard = self.acquire().await?;
        dispatch(&self.ops, guard, OpKind::Read, |ops| ops.read_bytes()).await
    }

    pub async fn write_bytes(&self, data: &[u8]) -> Result<()> {
        let guard = self.acquire().await?;
        let data = data.to_vec();
        dispatch(&self.ops, guard, OpKind::Write, move |ops| ops.write_bytes(&data)).await
    }

    async fn acquire(&self) -> Result<OwnedMutexGuard<()>> {
        let mutex = self.registry.get_or_create(self.path());
        match self.timeout.as_duration() {
            None => Ok(mutex.lock_owned().await),
            Some(limit) => tokio::time::timeout(limit, mutex.lock_owned())
                .await
                .map_err(|_| {
                    tracing::debug!(path = %self.path().display(), "task lock timed out");
                    timed_out(self.path(), self.timeout)
                }),
        }
    }
}

/// The path's mutex, held across operations.
///
/// Operations take `&mut self`, so the operations of one session run one
/// after another. The mutex is released when the session is dropped or
/// [`release`](Self::release)d, or later if a dropped operation is still
/// running on the blocking pool.
pub struct AsyncSession<'a> {
    file: &'a AsyncSafeFile,
    guard: Option<Arc<OwnedMutexGuard<()>>>,
}

impl AsyncSession<'_> {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub async fn read(&mut self) -> Result<Option<Value>> {
        let guard = self.held();
        dispatch(&self.file.ops, guard, OpKind::Read, |ops| ops.read()).await
    }

    pub async fn write(&mut self, value: &Value) -> Result<()> {
        let guard = self.held();
        let value = value.clone();
        dispatch(&self.file.ops, guard, OpKind::Write, move |ops| ops.write(&value)).await
    }

    pub async fn append(&mut self, text: &str) -> Result<()> {
        let guard = self.held();
        let text = text.to_owned();
        dispatch(&self.file.ops, guard, OpKind::Append, move |ops| ops.append(&text)).await
    }

    pub async fn read_bytes(&mut self) -> Result<Option<Vec<u8>>> {
        let guard = self.held();
        dispatch(&self.file.ops, guard, OpKind::Read, |ops| ops.read_bytes()).await
    }

    pub async fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        let guard = self.held();
        let data = data.to_vec();
        dispatch(&self.file.ops, guard, OpKind::Write, move |ops| ops.write_bytes(&data)).await
    }

    /// Release the mutex now instead of at the end of scope.
    pub fn release(mut self) {
        self.release_inner();
    }

    fn held(&self) -> Option<Arc<OwnedMutexGuard<()>>> {
        self.guard.clone()
    }

    fn release_inner(&mut self) {
        if self.guard.take().is_some() {
            tracing::debug!(path = %self.path().display(), "task session released");
        }
    }
}

impl fmt::Debug for AsyncSession<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncSession")
            .field("path", &self.path())
            .field("held", &self.guard.is_some())
            .finish()
    }
}

impl Drop for AsyncSession<'_> {
    fn drop(&mut self) {
        self.release_inner();
    }
}

/// Run `op` on the blocking pool, keeping `guard` alive until it returns.
async fn dispatch<T, G, F>(ops: &FileOps, guard: G, kind: OpKind, op: F) -> Result<T>
where
    T: Send + 'static,
    G: Send + 'static,
    F: FnOnce(&FileOps) -> Result<T> + Send + 'static,
{
    let ops = ops.clone();
    let path = ops.path().to_path_buf();
    tokio::task::spawn_blocking(move || {
        let _held = guard;
        op(&ops)
    })
    .await
    .map_err(|e| kind.error(&path, worker_failure(e)))?
}

fn worker_failure(err: JoinError) -> FailureCause {
    if err.is_panic() {
        FailureCause::Worker("blocking task panicked".to_string())
    } else {
        FailureCause::Worker(err.to_string())
    }
}
