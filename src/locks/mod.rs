//! Locking subsystem for atomicio.
//!
//! Three layers cooperate to serialize access to a file:
//! - [`InterProcessLock`]: an advisory OS lock on the sentinel `<file>.lock`,
//!   shared by every cooperating process on the same filesystem
//! - [`ReentrantLock`]: a thread lock the owning thread may take again
//! - [`LockRegistry`]: one primitive per canonical path per process, in a
//!   thread flavor ([`ThreadLockRegistry`]) and a cooperative-scheduler
//!   flavor ([`AsyncLockRegistry`])
//!
//! # RAII Guards
//!
//! Every acquisition yields a guard that releases on drop. Releasing the
//! inter-process lock is best-effort: failures are retried and logged but
//! never returned.

mod guard;
mod ignore;
mod interprocess;
mod reentrant;
mod registry;
mod timeout;


// Re-export public API
pub use guard::InterProcessGuard;
pub use ignore::{LOCK_IGNORE_PATTERN, ensure_lock_pattern_ignored, find_project_root};
pub use interprocess::{InterProcessLock, LOCK_SUFFIX, LockOptions, sentinel_path};
pub use reentrant::{ReentrantGuard, ReentrantLock};
pub use registry::{AsyncLockRegistry, LockRegistry, RegistryLock, ThreadLockRegistry};
pub use timeout::{DEFAULT_TIMEOUT, TimeoutPolicy};
