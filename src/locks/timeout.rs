//! Acquisition timeout policy.

use crate::error::{AtomicIoError, Result};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

/// Timeout applied when no explicit bound is given but waiting forever is
/// not wanted.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// How long a handle waits for a lock before giving up.
///
/// Built once per handle from a tri-state input:
/// - `true` selects [`TimeoutPolicy::Default`] (15 seconds)
/// - `false` or no value selects [`TimeoutPolicy::Infinite`]
/// - a number of seconds selects [`TimeoutPolicy::Explicit`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeoutPolicy {
    /// Wait up to [`DEFAULT_TIMEOUT`].
    Default,
    /// Wait indefinitely.
    #[default]
    Infinite,
    /// Wait up to the given duration.
    Explicit(Duration),
}

impl TimeoutPolicy {
    /// Build an explicit policy from fractional seconds.
    ///
    /// Negative, NaN and infinite values are rejected. A finite value too
    /// large for a [`Duration`] waits forever.
    pub fn from_secs_f64(seconds: f64) -> Result<Self> {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(AtomicIoError::InvalidTimeout(format!(
                "timeout must be a finite, non-negative number of seconds (got {})",
                seconds
            )));
        }
        Ok(Duration::try_from_secs_f64(seconds)
            .map(TimeoutPolicy::Explicit)
            .unwrap_or(TimeoutPolicy::Infinite))
    }

    /// The wait bound, or `None` to wait forever.
    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            TimeoutPolicy::Default => Some(DEFAULT_TIMEOUT),
            TimeoutPolicy::Infinite => None,
            TimeoutPolicy::Explicit(d) => Some(*d),
        }
    }

    /// The instant after which a wait started at `start` must give up.
    ///
    /// `None` means wait forever; a bound too large to represent as an
    /// `Instant` is treated the same way.
    pub fn deadline_from(&self, start: Instant) -> Option<Instant> {
        self.as_duration().and_then(|d| start.checked_add(d))
    }

    pub fn is_infinite(&self) -> bool {
        matches!(self, TimeoutPolicy::Infinite)
    }
}

impl From<bool> for TimeoutPolicy {
    fn from(enabled: bool) -> Self {
        if enabled {
            TimeoutPolicy::Default
        } else {
            TimeoutPolicy::Infinite
        }
    }
}

impl From<Duration> for TimeoutPolicy {
    fn from(duration: Duration) -> Self {
        TimeoutPolicy::Explicit(duration)
    }
}

impl From<Option<Duration>> for TimeoutPolicy {
    fn from(duration: Option<Duration>) -> Self {
        match duration {
            Some(d) => TimeoutPolicy::Explicit(d),
            None => TimeoutPolicy::Infinite,
        }
    }
}

impl FromStr for TimeoutPolicy {
    type Err = AtomicIoError;

    /// Parse `true`/`default`, `false`/`none`/`infinite`, or seconds.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "true" | "default" => Ok(TimeoutPolicy::Default),
            "false" | "none" | "infinite" => Ok(TimeoutPolicy::Infinite),
            other => match other.parse::<f64>() {
                Ok(seconds) => TimeoutPolicy::from_secs_f64(seconds),
                Err(_) => Err(AtomicIoError::InvalidTimeout(format!(
                    "expected true, false or a number of seconds (got '{}')",
                    s
                ))),
            },
        }
    }
}

impl fmt::Display for TimeoutPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeoutPolicy::Default => write!(f, "default ({}s)", DEFAULT_TIMEOUT.as_secs()),
            TimeoutPolicy::Infinite => write!(f, "infinite"),
            TimeoutPolicy::Explicit(d) => write!(f, "{}s", d.as_secs_f64()),
        }
    }
}

impl Serialize for TimeoutPolicy {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            TimeoutPolicy::Default => serializer.serialize_bool(true),
            TimeoutPolicy::Infinite => serializer.serialize_bool(false),
            TimeoutPolicy::Explicit(d) => serializer.serialize_f64(d.as_secs_f64()),
        }
    }
}

impl<'de> Deserialize<'de> for TimeoutPolicy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct PolicyVisitor;

        impl Visitor<'_> for PolicyVisitor {
            type Value = TimeoutPolicy;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("true, false, or a non-negative number of seconds")
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<TimeoutPolicy, E> {
                Ok(TimeoutPolicy::from(v))
            }

            fn visit_unit<E: de::Error>(self) -> std::result::Result<TimeoutPolicy, E> {
                Ok(TimeoutPolicy::Infinite)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<TimeoutPolicy, E> {
                Ok(TimeoutPolicy::Explicit(Duration::from_secs(v)))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<TimeoutPolicy, E> {
                TimeoutPolicy::from_secs_f64(v as f64).map_err(E::custom)
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<TimeoutPolicy, E> {
                TimeoutPolicy::from_secs_f64(v).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(PolicyVisitor)
    }
}
