//! atomicio: atomic, concurrency-safe file reads, writes and appends.
//!
//! Writes go to a temporary file beside the target and are renamed into
//! place, so readers see either the old or the new content. Access is
//! coordinated by locks keyed on the canonical path:
//!
//! - [`SafeFile`] locks around every call, across threads and processes
//! - [`ThreadedSafeFile`] holds a reentrant thread lock across operations
//! - [`AsyncSafeFile`] holds a tokio mutex across operations, with
//!   cancellable acquisition and blocking I/O moved off the runtime
//!
//! Values are [`serde_json::Value`]s encoded by the format registered for the
//! file's extension (JSON, YAML, TOML and plain text out of the box).

pub mod config;
pub mod error;
pub mod exit_codes;
pub mod formats;
pub mod fs;
pub mod handles;
pub mod locks;
pub mod logging;

// Re-export the main entry points
pub use config::Config;
pub use error::{AtomicIoError, FailureCause, Result};
pub use formats::{Format, FormatError, FormatRegistry};
pub use handles::{
    AsyncSafeFile, AsyncSession, SafeFile, SafeSession, ThreadedSafeFile, ThreadedSession,
};
pub use locks::TimeoutPolicy;
