//! Reentrant thread lock with deadline-bounded acquisition.
//!
//! A thin wrapper over `parking_lot`'s [`ReentrantMutex`] that hands out
//! owned guards, so a guard can outlive the borrow of the lock it came from.

use parking_lot::{ArcReentrantMutexGuard, RawMutex, RawThreadId, ReentrantMutex};
use std::fmt;
use std::sync::{Arc, LazyLock};
use std::time::Instant;

static PROCESS_LOCK: LazyLock<Arc<ReentrantLock>> = LazyLock::new(|| Arc::new(ReentrantLock::new()));

/// A mutual-exclusion lock the owning thread may acquire again.
#[derive(Default)]
pub struct ReentrantLock {
    mutex: Arc<ReentrantMutex<()>>,
}

impl ReentrantLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// The single lock shared by every `SafeFile` in this process unless a
    /// handle is given its own.
    pub fn process_wide() -> Arc<Self> {
        Arc::clone(&PROCESS_LOCK)
    }

    /// Acquire the lock, waiting until `deadline` (or forever for `None`).
    ///
    /// Returns `None` if the deadline passed while another thread held it.
    /// The owning thread always re-enters, even past its deadline.
    pub fn acquire_until(&self, deadline: Option<Instant>) -> Option<ReentrantGuard> {
        let guard = match deadline {
            None => self.mutex.lock_arc(),
            Some(deadline) => self.mutex.try_lock_arc_until(deadline)?,
        };
        Some(ReentrantGuard { _guard: guard })
    }

    /// Acquire the lock only if it is free or already ours.
    pub fn try_acquire(&self) -> Option<ReentrantGuard> {
        self.mutex
            .try_lock_arc()
            .map(|guard| ReentrantGuard { _guard: guard })
    }

    /// Whether any thread currently holds the lock.
    pub fn is_locked(&self) -> bool {
        self.mutex.is_locked()
    }

    pub fn is_held_by_current_thread(&self) -> bool {
        self.mutex.is_owned_by_current_thread()
    }
}

impl fmt::Debug for ReentrantLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReentrantLock")
            .field("locked", &self.is_locked())
            .field("held_here", &self.is_held_by_current_thread())
            .finish()
    }
}

/// Proof of holding a [`ReentrantLock`]; releases one level on drop.
///
/// Guards are tied to the acquiring thread and cannot be sent elsewhere.
pub struct ReentrantGuard {
    _guard: ArcReentrantMutexGuard<RawMutex, RawThreadId, ()>,
}

impl fmt::Debug for ReentrantGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReentrantGuard").finish_non_exhaustive()
    }
}
