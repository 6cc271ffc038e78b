//! Logging initialization for the atomicio binary.
//!
//! The library only emits `tracing` events; installing a subscriber is left
//! to the binary (or to an embedding application).

use std::sync::OnceLock;

/// Environment variable holding the log level.
pub const LOG_ENV: &str = "ATOMICIO_LOG";

static INIT: OnceLock<()> = OnceLock::new();

fn parse_level(value: Option<&str>) -> tracing::Level {
    match value.unwrap_or("warn").trim().to_ascii_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::WARN,
    }
}

/// Install a stderr subscriber at the level named by `ATOMICIO_LOG`.
///
/// Only the first call has an effect. Never fails: if another subscriber is
/// already installed it is left in place.
pub fn init() {
    INIT.get_or_init(|| {
        let level = parse_level(std::env::var(LOG_ENV).ok().as_deref());
        let _ = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
    });
}
