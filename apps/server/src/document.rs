//! Configuration document loading.
//!
//! The document is JSON. Callback slots (`LOG.LOGIN`, `LOG.ALLOW`,
//! `LOG.LOAD`) hold callback names, resolved against a [`Registry`].

use compact_str::CompactString;
use driver::{Callback, ConfigError, Value, config::ROOT};
use std::{collections::BTreeMap, path::Path};

/// Paths of the callback slots in the document.
pub const CALLBACK_SLOTS: [&str; 3] = ["LOG.LOGIN", "LOG.ALLOW", "LOG.LOAD"];

/// Named callbacks available to configuration documents.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    callbacks: BTreeMap<CompactString, Callback>,
}

impl Registry {
    /// Register a callback under its own name, replacing any previous one.
    pub fn insert(&mut self, callback: Callback) -> Option<Callback> {
        self.callbacks
            .insert(CompactString::new(callback.name()), callback)
    }

    pub fn get(&self, name: &str) -> Option<&Callback> {
        self.callbacks.get(name)
    }

    pub fn extend(&mut self, other: Registry) {
        self.callbacks.extend(other.callbacks);
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.callbacks.keys().map(CompactString::as_str)
    }
}

/// Read and parse a configuration file.
pub fn load(path: &Path, registry: &Registry) -> Result<Value, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        tracing::error!("failed to read {}: {e}", path.display());
        ConfigError::new(ROOT, "Error reading configuration file")
    })?;
    parse(&text, registry)
}

/// Parse a configuration document and attach registered callbacks.
///
/// Names without a registered callback are left in place; validation then
/// rejects them.
pub fn parse(text: &str, registry: &Registry) -> Result<Value, ConfigError> {
    let json: serde_json::Value = serde_json::from_str(text).map_err(|e| {
        tracing::error!("invalid configuration json: {e}");
        ConfigError::new(ROOT, "Error in JSON file structure")
    })?;
    if !json.is_object() {
        return Err(ConfigError::new(ROOT, "Inadequate configuration data"));
    }

    let mut doc = Value::from(json);
    for slot in CALLBACK_SLOTS {
        let Some(name) = doc.pointer(slot).and_then(Value::as_str) else {
            continue;
        };
        match registry.get(name) {
            Some(callback) => {
                let callback = callback.clone();
                doc.set(slot, callback);
            }
            None => tracing::warn!("no callback registered as '{name}' for {slot}"),
        }
    }
    Ok(doc)
}
