//! Built-in formats.

use super::error::FormatError;
use super::registry::Format;
use serde_json::Value;
use std::io::Write;

/// Pretty-printed JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormat;

impl Format for JsonFormat {
    fn decode(&self, raw: &[u8]) -> Result<Value, FormatError> {
        Ok(serde_json::from_slice(raw)?)
    }

    fn encode(&self, value: &Value, out: &mut dyn Write) -> Result<(), FormatError> {
        serde_json::to_writer_pretty(&mut *out, value)?;
        out.write_all(b"\n")?;
        Ok(())
    }
}

/// YAML documents (`.yaml` and `.yml`).
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlFormat;

impl Format for YamlFormat {
    fn decode(&self, raw: &[u8]) -> Result<Value, FormatError> {
        Ok(serde_yaml::from_slice(raw)?)
    }

    fn encode(&self, value: &Value, out: &mut dyn Write) -> Result<(), FormatError> {
        serde_yaml::to_writer(out, value)?;
        Ok(())
    }
}

/// TOML documents. The top level must be a table; an empty document is an
/// empty table.
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlFormat;

impl Format for TomlFormat {
    fn decode(&self, raw: &[u8]) -> Result<Value, FormatError> {
        let text = std::str::from_utf8(raw)?;
        if text.trim().is_empty() {
            return Ok(Value::Object(serde_json::Map::new()));
        }
        Ok(toml::from_str(text)?)
    }

    fn encode(&self, value: &Value, out: &mut dyn Write) -> Result<(), FormatError> {
        let text = toml::to_string(value)?;
        out.write_all(text.as_bytes())?;
        Ok(())
    }
}

/// Plain UTF-8 text.
///
/// Decoding yields a string. Strings are written verbatim; any other value
/// is written as its compact JSON rendering.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextFormat;

impl Format for TextFormat {
    fn decode(&self, raw: &[u8]) -> Result<Value, FormatError> {
        Ok(Value::String(std::str::from_utf8(raw)?.to_string()))
    }

    fn encode(&self, value: &Value, out: &mut dyn Write) -> Result<(), FormatError> {
        match value {
            Value::String(text) => out.write_all(text.as_bytes())?,
            other => out.write_all(other.to_string().as_bytes())?,
        }
        Ok(())
    }
}
