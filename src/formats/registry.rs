//! Extension-keyed format registry.

use super::builtin::{JsonFormat, TextFormat, TomlFormat, YamlFormat};
use super::error::FormatError;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, LazyLock};

static GLOBAL_FORMATS: LazyLock<Arc<FormatRegistry>> =
    LazyLock::new(|| Arc::new(FormatRegistry::with_builtins()));

/// A serialization format for one or more file extensions.
pub trait Format: Send + Sync {
    /// Turn the complete file content into a value.
    fn decode(&self, raw: &[u8]) -> Result<Value, FormatError>;

    /// Write `value` to `out`.
    fn encode(&self, value: &Value, out: &mut dyn Write) -> Result<(), FormatError>;
}

/// Normalize an extension to lowercase with a leading dot.
pub fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().to_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{}", ext)
    }
}

/// Maps file extensions to formats.
pub struct FormatRegistry {
    formats: RwLock<BTreeMap<String, Arc<dyn Format>>>,
}

impl FormatRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            formats: RwLock::new(BTreeMap::new()),
        }
    }

    /// A registry holding the built-in formats.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register(".json", JsonFormat);
        registry.register(".yaml", YamlFormat);
        registry.register(".yml", YamlFormat);
        registry.register(".toml", TomlFormat);
        registry.register(".txt", TextFormat);
        registry
    }

    /// The process-wide registry used by handles unless told otherwise.
    pub fn global() -> Arc<Self> {
        Arc::clone(&GLOBAL_FORMATS)
    }

    /// Register `format` for `ext`, replacing any previous registration.
    ///
    /// The extension is matched case-insensitively; the leading dot is optional.
    pub fn register(&self, ext: &str, format: impl Format + 'static) {
        self.formats
            .write()
            .insert(normalize_extension(ext), Arc::new(format));
    }

    /// Find the format for `ext`.
    pub fn lookup(&self, ext: &str) -> Result<Arc<dyn Format>, FormatError> {
        let ext = normalize_extension(ext);
        self.formats
            .read()
            .get(&ext)
            .cloned()
            .ok_or(FormatError::NotRegistered { extension: ext })
    }

    /// Find the format for a path's extension.
    pub fn lookup_path(&self, path: &Path) -> Result<Arc<dyn Format>, FormatError> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_default();
        self.lookup(&ext)
    }

    /// Registered extensions, sorted, with leading dots.
    pub fn extensions(&self) -> Vec<String> {
        self.formats.read().keys().cloned().collect()
    }

    pub fn decode(&self, raw: &[u8], ext: &str) -> Result<Value, FormatError> {
        self.lookup(ext)?.decode(raw)
    }

    pub fn encode(&self, value: &Value, out: &mut dyn Write, ext: &str) -> Result<(), FormatError> {
        self.lookup(ext)?.encode(value, out)
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatRegistry")
            .field("extensions", &self.extensions())
            .finish()
    }
}
