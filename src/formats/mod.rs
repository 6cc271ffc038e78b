//! Pluggable serialization formats keyed by file extension.
//!
//! Every format converts between raw file bytes and a [`serde_json::Value`].
//! The global registry comes pre-populated with JSON, YAML, TOML and plain
//! text; more can be added at runtime with [`FormatRegistry::register`].
//!
//! ```
//! use atomicio::formats::{Format, FormatError, FormatRegistry};
//! use serde_json::Value;
//! use std::io::Write;
//!
//! struct Lines;
//!
//! impl Format for Lines {
//!     fn decode(&self, raw: &[u8]) -> Result<Value, FormatError> {
//!         let text = std::str::from_utf8(raw)?;
//!         Ok(Value::Array(text.lines().map(|l| Value::String(l.to_string())).collect()))
//!     }
//!
//!     fn encode(&self, value: &Value, out: &mut dyn Write) -> Result<(), FormatError> {
//!         for line in value.as_array().into_iter().flatten() {
//!             writeln!(out, "{}", line.as_str().unwrap_or_default())?;
//!         }
//!         Ok(())
//!     }
//! }
//!
//! let registry = FormatRegistry::with_builtins();
//! registry.register("lines", Lines);
//! assert!(registry.extensions().contains(&".lines".to_string()));
//! ```

mod builtin;
mod error;
mod registry;


pub use builtin::{JsonFormat, TextFormat, TomlFormat, YamlFormat};
pub use error::FormatError;
pub use registry::{Format, FormatRegistry, normalize_extension};
