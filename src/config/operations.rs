//! Config loading, validation, and conversion to lock options.

use super::model::Config;
use crate::error::{AtomicIoError, Result};
use crate::locks::LockOptions;
use std::path::Path;
use std::time::Duration;

impl Config {
    /// Load config from a YAML file.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the YAML file
    ///
    /// # Returns
    ///
    /// * `Ok(Config)` - Successfully loaded and validated config
    /// * `Err(AtomicIoError::Config)` - Read error, parse error or validation failure
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            AtomicIoError::Config(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)
            .map_err(|e| AtomicIoError::Config(format!("failed to parse config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| AtomicIoError::Config(format!("failed to serialize config to YAML: {}", e)))
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - `release_retries` must be positive
    /// - `poll_interval_ms` must be positive
    /// - `max_poll_interval_ms` must not be below `poll_interval_ms`
    pub fn validate(&self) -> Result<()> {
        if self.release_retries == 0 {
            return Err(AtomicIoError::Config(
                "config validation failed: release_retries must be greater than 0".to_string(),
            ));
        }

        if self.poll_interval_ms == 0 {
            return Err(AtomicIoError::Config(
                "config validation failed: poll_interval_ms must be greater than 0".to_string(),
            ));
        }

        if self.max_poll_interval_ms < self.poll_interval_ms {
            return Err(AtomicIoError::Config(format!(
                "config validation failed: max_poll_interval_ms ({}) must be at least poll_interval_ms ({})",
                self.max_poll_interval_ms, self.poll_interval_ms
            )));
        }

        Ok(())
    }

    /// Inter-process lock tuning described by this config.
    pub fn lock_options(&self) -> LockOptions {
        LockOptions {
            release_retries: self.release_retries,
            release_backoff: Duration::from_millis(self.release_backoff_ms),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            max_poll_interval: Duration::from_millis(self.max_poll_interval_ms),
            update_ignore_file: self.update_ignore_file,
        }
    }
}
