//! File handles: the public read/write/append surface.
//!
//! Three handles share the same operations and differ in how they lock:
//! - [`SafeFile`]: every call takes the process-wide thread lock and the
//!   inter-process sentinel lock, then releases both; a [`SafeSession`]
//!   holds both across several operations
//! - [`ThreadedSafeFile`]: a per-path reentrant thread lock, held across
//!   several operations through a [`ThreadedSession`]
//! - [`AsyncSafeFile`]: a per-path tokio mutex with cancellable acquisition,
//!   held across operations through an [`AsyncSession`]; blocking I/O runs
//!   on tokio's blocking pool
//!
//! All handles canonicalize their path on construction, so different
//! spellings of one file contend for the same lock.

mod cooperative;
mod io;
pub mod path;
mod simple;
mod threaded;


// Re-export public API
pub use cooperative::{AsyncSafeFile, AsyncSession};
pub use path::canonical_path;
pub use simple::{SafeFile, SafeSession};
pub use threaded::{ThreadedSafeFile, ThreadedSession};

use crate::error::AtomicIoError;
use crate::locks::TimeoutPolicy;
use std::path::Path;

/// The timeout error for `path` under `policy`.
fn timed_out(path: &Path, policy: TimeoutPolicy) -> AtomicIoError {
    AtomicIoError::timeout(path, policy.as_duration().unwrap_or_default())
}
