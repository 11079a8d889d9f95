//! Recursive validator driven by [`Field`] descriptors.

use super::{
    schema::{self, Fallback, Field, Kind},
    value::Value,
};
use crate::ConfigError;
use std::{
    collections::{BTreeMap, BTreeSet},
    path::Path,
};

/// Root segment of every error path.
pub const ROOT: &str = "CONFIG";

/// Validates and normalizes a raw configuration tree.
#[derive(Debug, Clone, Copy)]
pub struct Validator {
    check_files: bool,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Validator {
    /// Create a validator. With `check_files` off, file fields only need
    /// to be non-empty strings.
    pub fn new(check_files: bool) -> Self {
        Self { check_files }
    }

    /// Validator honouring the document's own `CHECK` flag.
    pub fn for_document(doc: &Value) -> Self {
        let check = doc.get("CHECK").and_then(Value::as_bool).unwrap_or(true);
        Self::new(check)
    }

    /// Validate `doc` against the driver schema.
    ///
    /// Returns the normalized tree: unknown keys dropped, defaults filled in.
    pub fn validate(&self, doc: &Value) -> Result<Value, ConfigError> {
        self.validate_with(doc, schema::CONFIG)
    }

    /// Validate `doc` against an arbitrary schema.
    pub fn validate_with(&self, doc: &Value, schema: &[Field]) -> Result<Value, ConfigError> {
        let Some(input) = doc.as_map() else {
            return Err(ConfigError::new(ROOT, "Inadequate configuration data"));
        };
        self.walk(input, schema, ROOT).map(Value::Map)
    }

    fn walk(
        &self,
        input: &BTreeMap<String, Value>,
        schema: &[Field],
        prefix: &str,
    ) -> Result<BTreeMap<String, Value>, ConfigError> {
        let mut out = BTreeMap::new();
        for field in schema {
            let path = format!("{prefix}.{}", field.key);
            let Some(value) = input.get(field.key).filter(|v| !v.is_null()) else {
                if field.required {
                    return Err(ConfigError::new(path, "Information not provided"));
                }
                match field.fallback {
                    Fallback::Skip => {}
                    Fallback::Bool(b) => {
                        out.insert(field.key.to_owned(), Value::Bool(b));
                    }
                    Fallback::EmptyMap => {
                        out.insert(field.key.to_owned(), Value::map());
                    }
                }
                continue;
            };

            self.check(field, value, &path)?;
            let value = match (field.keys.is_empty(), value) {
                (false, Value::Map(nested)) => Value::Map(self.walk(nested, field.keys, &path)?),
                _ => value.clone(),
            };
            out.insert(field.key.to_owned(), value);
        }
        Ok(out)
    }

    fn check(&self, field: &Field, value: &Value, path: &str) -> Result<(), ConfigError> {
        if !self.matches(field.kind, value) {
            tracing::debug!("{path}: expected {}", field.kind.name());
            return Err(ConfigError::new(path, "Inappropriate information"));
        }

        if let Some(min) = field.size {
            let size = match value {
                Value::Map(map) => map.len() as i64,
                Value::List(list) => list.len() as i64,
                Value::Integer(n) => *n,
                _ => min,
            };
            if size < min {
                return Err(ConfigError::new(path, "Insufficient data"));
            }
        }

        if let Value::Map(map) = value
            && let Some(key) = map.keys().find(|k| field.bad_keys.contains(&k.as_str()))
        {
            return Err(ConfigError::new(
                path,
                format!("Inappropriate identifier ({key})"),
            ));
        }

        if let Some(kind) = field.items {
            let bad = match value {
                Value::Map(map) => map
                    .iter()
                    .find(|(_, item)| !self.matches(kind, item))
                    .map(|(key, _)| key.clone()),
                Value::List(list) => list
                    .iter()
                    .position(|item| !self.matches(kind, item))
                    .map(|idx| idx.to_string()),
                _ => None,
            };
            if let Some(key) = bad {
                return Err(ConfigError::new(
                    path,
                    format!("Inappropriate information ({key})"),
                ));
            }
        }

        if field.unique
            && let Value::List(list) = value
        {
            let mut seen = BTreeSet::new();
            if let Some(item) = list.iter().find(|item| !seen.insert(item.to_string())) {
                return Err(ConfigError::new(
                    path,
                    format!("Inappropriate information ({item})"),
                ));
            }
        }

        if !field.values.is_empty()
            && !value.as_str().is_some_and(|s| field.values.contains(&s))
        {
            return Err(ConfigError::new(
                path,
                format!("Inappropriate information ({value})"),
            ));
        }

        Ok(())
    }

    fn matches(&self, kind: Kind, value: &Value) -> bool {
        match (kind, value) {
            (Kind::Boolean, Value::Bool(_))
            | (Kind::Integer, Value::Integer(_))
            | (Kind::String, Value::String(_))
            | (Kind::Map, Value::Map(_))
            | (Kind::List, Value::List(_)) => true,
            (Kind::File, Value::String(path)) => self.is_file(path),
            (Kind::Callback(expected), Value::Callback(cb)) => cb.kind() == expected,
            _ => false,
        }
    }

    /// Whether `path` names a usable resource file.
    pub fn is_file(&self, path: &str) -> bool {
        if self.check_files {
            Path::new(path).is_file()
        } else {
            !path.is_empty()
        }
    }
}
