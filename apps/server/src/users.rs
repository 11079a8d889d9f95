//! File-backed user directory and the callbacks built on it.

use crate::Registry;
use anyhow::{Context, Result};
use driver::Callback;
use serde::Deserialize;
use std::{collections::BTreeMap, path::Path, sync::Arc};

/// One user account.
#[derive(Debug, Clone, Deserialize)]
pub struct UserRecord {
    pub pwd: String,
    /// Identity payload handed to the driver on login.
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Accounts keyed by user name.
///
/// ```json
/// { "user1": { "pwd": "123456", "data": { "level": ["a"], "name": "User 1" } } }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct UserDirectory {
    users: BTreeMap<String, UserRecord>,
}

impl UserDirectory {
    /// Load a directory from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read user directory {}", path.display()))?;
        Self::from_json(&text)
            .with_context(|| format!("failed to parse user directory {}", path.display()))
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Identity payload of `usr` if `pwd` matches.
    pub fn verify(&self, usr: &str, pwd: &str) -> Option<serde_json::Value> {
        let record = self.users.get(usr)?;
        (record.pwd == pwd).then(|| record.data.clone())
    }

    /// Callbacks backed by this directory: `credentials` and `levels`.
    pub fn registry(self: Arc<Self>) -> Registry {
        let mut registry = Registry::default();
        registry.insert(credentials(self));
        registry.insert(levels());
        registry
    }
}

/// Login callback checking the `usr` and `pwd` fields.
pub fn credentials(directory: Arc<UserDirectory>) -> Callback {
    Callback::login("credentials", move |fields| {
        directory.verify(fields.get("usr")?, fields.get("pwd")?)
    })
}

/// Allow callback granting routes listed in the identity's `level`.
pub fn levels() -> Callback {
    Callback::allow("levels", |user, id, _path| {
        user.get("level")
            .and_then(serde_json::Value::as_array)
            .is_some_and(|levels| levels.iter().any(|level| level == id))
    })
}
