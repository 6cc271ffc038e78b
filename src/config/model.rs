//! Config struct definition and default implementation.

use crate::locks::TimeoutPolicy;
use serde::{Deserialize, Serialize};

/// Configuration shared by handles and the CLI.
///
/// Unknown fields in the YAML are ignored for forward compatibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // =========================================================================
    // Acquisition
    // =========================================================================
    /// `true` for the 15 second default, `false` to wait forever, or a
    /// number of seconds.
    pub timeout: TimeoutPolicy,

    /// First pause between inter-process lock attempts, in milliseconds.
    /// Doubles after every failed attempt.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Upper bound for the pause between attempts, in milliseconds.
    #[serde(default = "default_max_poll_interval_ms")]
    pub max_poll_interval_ms: u64,

    // =========================================================================
    // Release
    // =========================================================================
    /// Unlock attempts before the release is abandoned with a warning.
    #[serde(default = "default_release_retries")]
    pub release_retries: u32,

    /// Pause between unlock attempts, in milliseconds; grows linearly.
    #[serde(default = "default_release_backoff_ms")]
    pub release_backoff_ms: u64,

    /// Whether to add `*.lock` to the enclosing project's `.gitignore`.
    #[serde(default = "default_true")]
    pub update_ignore_file: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout: TimeoutPolicy::Infinite,
            poll_interval_ms: default_poll_interval_ms(),
            max_poll_interval_ms: default_max_poll_interval_ms(),
            release_retries: default_release_retries(),
            release_backoff_ms: default_release_backoff_ms(),
            update_ignore_file: default_true(),
        }
    }
}

pub(crate) fn default_poll_interval_ms() -> u64 {
    10
}

pub(crate) fn default_max_poll_interval_ms() -> u64 {
    250
}

pub(crate) fn default_release_retries() -> u32 {
    3
}

pub(crate) fn default_release_backoff_ms() -> u64 {
    10
}

fn default_true() -> bool {
    true
}
