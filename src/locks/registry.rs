//! Per-path lock registries.
//!
//! A registry maps a canonical file path to the one lock primitive every
//! handle in the process must contend on for that path. Lookups and inserts
//! happen under the registry's own mutex so two threads can never create two
//! different primitives for the same path.
//!
//! Handles must call [`LockRegistry::get_or_create`] for every acquisition
//! instead of caching the returned `Arc`: [`LockRegistry::cleanup`] may evict
//! an idle entry, and a cached primitive would then diverge from the one a
//! later handle receives.

use super::reentrant::ReentrantLock;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

static THREAD_REGISTRY: LazyLock<Arc<ThreadLockRegistry>> =
    LazyLock::new(|| Arc::new(ThreadLockRegistry::new()));

static ASYNC_REGISTRY: LazyLock<Arc<AsyncLockRegistry>> =
    LazyLock::new(|| Arc::new(AsyncLockRegistry::new()));

/// A lock primitive that can live in a [`LockRegistry`].
pub trait RegistryLock: Send + Sync + 'static {
    fn create() -> Self;

    /// Whether the primitive is known to be unlocked right now.
    ///
    /// Implementations that cannot tell must return `false`.
    fn is_idle(&self) -> bool;
}

impl RegistryLock for ReentrantLock {
    fn create() -> Self {
        ReentrantLock::new()
    }

    fn is_idle(&self) -> bool {
        !self.is_locked()
    }
}

impl RegistryLock for tokio::sync::Mutex<()> {
    fn create() -> Self {
        tokio::sync::Mutex::new(())
    }

    fn is_idle(&self) -> bool {
        self.try_lock().is_ok()
    }
}

/// Process-wide mapping from canonical path to lock primitive.
pub struct LockRegistry<L: RegistryLock> {
    entries: Mutex<HashMap<PathBuf, Arc<L>>>,
}

/// Registry of reentrant thread locks used by `ThreadedSafeFile`.
pub type ThreadLockRegistry = LockRegistry<ReentrantLock>;

/// Registry of cooperative mutexes used by `AsyncSafeFile`.
pub type AsyncLockRegistry = LockRegistry<tokio::sync::Mutex<()>>;

impl<L: RegistryLock> LockRegistry<L> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Return the primitive for `path`, creating it on first use.
    ///
    /// `path` must already be canonical.
    pub fn get_or_create(&self, path: &Path) -> Arc<L> {
        let mut entries = self.entries.lock();
        if let Some(existing) = entries.get(path) {
            return Arc::clone(existing);
        }

        tracing::trace!(path = %path.display(), "creating registry lock");
        let created = Arc::new(L::create());
        entries.insert(path.to_path_buf(), Arc::clone(&created));
        created
    }

    /// Evict entries that are provably unused and return how many went.
    ///
    /// An entry is only evicted when the registry holds the sole reference
    /// (no guard, waiter or in-flight lookup can reach it) and the primitive
    /// itself reports unlocked. Anything else is kept.
    pub fn cleanup(&self) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, lock| Arc::strong_count(lock) > 1 || !lock.is_idle());
        let removed = before - entries.len();

        if removed > 0 {
            tracing::debug!(removed, remaining = entries.len(), "registry cleanup");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.lock().contains_key(path)
    }
}

impl<L: RegistryLock> Default for LockRegistry<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: RegistryLock> fmt::Debug for LockRegistry<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockRegistry")
            .field("entries", &self.len())
            .finish()
    }
}

impl ThreadLockRegistry {
    /// The registry shared by every `ThreadedSafeFile` built without an
    /// explicit registry.
    pub fn global() -> Arc<Self> {
        Arc::clone(&THREAD_REGISTRY)
    }
}

impl AsyncLockRegistry {
    /// The registry shared by every `AsyncSafeFile` built without an
    /// explicit registry.
    pub fn global() -> Arc<Self> {
        Arc::clone(&ASYNC_REGISTRY)
    }
}
