//! Format error type.

use thiserror::Error;

/// Errors raised while looking up, decoding or encoding a format.
#[derive(Error, Debug)]
pub enum FormatError {
    /// No format is registered for the extension.
    #[error("no format registered for extension '{extension}'")]
    NotRegistered { extension: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML parse error: {0}")]
    TomlDecode(#[from] toml::de::Error),

    #[error("TOML encode error: {0}")]
    TomlEncode(#[from] toml::ser::Error),

    #[error("content is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Failure reported by a user-registered format.
    #[error("{0}")]
    Custom(Box<dyn std::error::Error + Send + Sync>),
}

impl FormatError {
    /// Wrap an arbitrary error from a custom format.
    pub fn custom(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        FormatError::Custom(err.into())
    }
}
