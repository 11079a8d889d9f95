//! Driver configuration: raw tree, schema, validator, typed view.
//!
//! A document is validated once, up front. Any violation is fatal and
//! names the offending dotted path; a [`Config`] only exists when the
//! whole document passed.

use crate::{ConfigError, DriverError};
use std::collections::BTreeMap;
pub use {
    schema::{EXIT, Fallback, Field, HOME, Kind},
    validate::{ROOT, Validator},
    value::{AllowFn, Callback, CallbackKind, LoadFn, LoginFn, Value},
};

pub mod schema;
mod validate;
mod value;

/// Validated driver configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Whether resource paths are checked against the filesystem.
    pub check: bool,
    /// Main resource.
    pub home: String,
    /// Route id to resource path.
    pub routes: BTreeMap<String, String>,
    /// Authentication block. `None` makes the driver a free-access router.
    pub log: Option<Log>,
}

/// Authentication settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Log {
    /// Resource that collects credentials.
    pub gateway: String,
    /// Resource shown after the session ends.
    pub exit: String,
    /// Expected POST field names.
    pub data: Vec<String>,
    pub login: Callback,
    pub allow: Option<Callback>,
    pub load: Option<Callback>,
    /// Allowed seconds between two requests.
    pub timeout: Option<u64>,
}

impl Config {
    /// Validate a raw document and build the typed configuration.
    pub fn from_value(doc: &Value) -> Result<Self, ConfigError> {
        let normalized = Validator::for_document(doc).validate(doc)?;
        Self::from_normalized(&normalized)
    }

    fn from_normalized(doc: &Value) -> Result<Self, ConfigError> {
        let home = string_at(doc, ROOT, "HOME")?;
        let routes = match doc.get("ID").and_then(Value::as_map) {
            Some(map) => map
                .iter()
                .map(|(id, path)| {
                    let path = path.as_str().ok_or_else(|| {
                        ConfigError::new(format!("{ROOT}.ID"), "Inappropriate information")
                    })?;
                    Ok((id.clone(), path.to_owned()))
                })
                .collect::<Result<_, ConfigError>>()?,
            None => BTreeMap::new(),
        };
        let log = match doc.get("LOG") {
            Some(log) => Some(Log::from_normalized(log)?),
            None => None,
        };

        Ok(Self {
            check: doc.get("CHECK").and_then(Value::as_bool).unwrap_or(true),
            home,
            routes,
            log,
        })
    }

    /// Whether requests must be authenticated.
    pub fn requires_auth(&self) -> bool {
        self.log.is_some()
    }

    /// Resource path of a route id.
    pub fn route(&self, id: &str) -> Option<&str> {
        self.routes.get(id).map(String::as_str)
    }

    /// Every resource path the configuration names.
    pub fn resources(&self) -> impl Iterator<Item = &str> {
        let log = self
            .log
            .iter()
            .flat_map(|log| [log.gateway.as_str(), log.exit.as_str()]);
        std::iter::once(self.home.as_str())
            .chain(self.routes.values().map(String::as_str))
            .chain(log)
    }

    /// Whether `path` is a servable resource.
    ///
    /// With file checks on this is an existing file; otherwise any
    /// configured resource.
    pub fn is_resource(&self, path: &str) -> bool {
        if self.check {
            Validator::new(true).is_file(path)
        } else {
            self.resources().any(|r| r == path)
        }
    }

    /// The normalized configuration tree.
    ///
    /// Validating this tree again yields an identical configuration.
    pub fn to_value(&self) -> Value {
        let mut doc = Value::map();
        doc.set("CHECK", self.check);
        doc.set("HOME", self.home.as_str());
        doc.set(
            "ID",
            Value::Map(
                self.routes
                    .iter()
                    .map(|(id, path)| (id.clone(), Value::from(path.as_str())))
                    .collect(),
            ),
        );
        if let Some(log) = &self.log {
            doc.set("LOG.GATEWAY", log.gateway.as_str());
            doc.set("LOG.EXIT", log.exit.as_str());
            doc.set("LOG.DATA", log.data.clone());
            doc.set("LOG.LOGIN", log.login.clone());
            if let Some(allow) = &log.allow {
                doc.set("LOG.ALLOW", allow.clone());
            }
            if let Some(load) = &log.load {
                doc.set("LOG.LOAD", load.clone());
            }
            if let Some(timeout) = log.timeout {
                doc.set("LOG.TIME", timeout as i64);
            }
        }
        doc
    }

    /// Pretty JSON export of the normalized configuration. Callbacks are
    /// exported by name.
    pub fn to_json(&self) -> Result<String, DriverError> {
        Ok(serde_json::to_string_pretty(&self.to_value())?)
    }
}

impl Log {
    fn from_normalized(log: &Value) -> Result<Self, ConfigError> {
        let prefix = format!("{ROOT}.LOG");
        let path = |key: &str| format!("{prefix}.{key}");
        let data = log
            .get("DATA")
            .and_then(Value::as_list)
            .ok_or_else(|| ConfigError::new(path("DATA"), "Information not provided"))?
            .iter()
            .map(|item| item.as_str().map(str::to_owned))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| ConfigError::new(path("DATA"), "Inappropriate information"))?;
        let login = log
            .get("LOGIN")
            .and_then(Value::as_callback)
            .cloned()
            .ok_or_else(|| ConfigError::new(path("LOGIN"), "Information not provided"))?;
        let timeout = match log.get("TIME").and_then(Value::as_integer) {
            Some(secs) => Some(
                u64::try_from(secs)
                    .map_err(|_| ConfigError::new(path("TIME"), "Insufficient data"))?,
            ),
            None => None,
        };

        Ok(Self {
            gateway: string_at(log, &prefix, "GATEWAY")?,
            exit: string_at(log, &prefix, "EXIT")?,
            data,
            login,
            allow: log.get("ALLOW").and_then(Value::as_callback).cloned(),
            load: log.get("LOAD").and_then(Value::as_callback).cloned(),
            timeout,
        })
    }
}

fn string_at(doc: &Value, prefix: &str, key: &str) -> Result<String, ConfigError> {
    doc.get(key)
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| ConfigError::new(format!("{prefix}.{key}"), "Information not provided"))
}
