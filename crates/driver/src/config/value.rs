//! Untyped configuration tree.

use crate::Session;
use compact_str::CompactString;
use serde::{Serialize, Serializer};
use std::{collections::BTreeMap, fmt, sync::Arc};

/// Credential check: POST fields in, identity payload out.
pub type LoginFn = dyn Fn(&BTreeMap<String, String>) -> Option<serde_json::Value> + Send + Sync;

/// Per-route access check: identity, route id, resource path.
pub type AllowFn = dyn Fn(&serde_json::Value, &str, &str) -> bool + Send + Sync;

/// Post-routing deviation hook, called with a session snapshot.
pub type LoadFn = dyn Fn(&Session) -> Option<String> + Send + Sync;

/// The kind of function a [`Callback`] wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackKind {
    Login,
    Allow,
    Load,
}

#[derive(Clone)]
enum Target {
    Login(Arc<LoginFn>),
    Allow(Arc<AllowFn>),
    Load(Arc<LoadFn>),
}

/// A named, typed function value held directly in the configuration.
#[derive(Clone)]
pub struct Callback {
    name: CompactString,
    target: Target,
}

impl Callback {
    /// Wrap a credential check.
    pub fn login<F>(name: impl Into<CompactString>, f: F) -> Self
    where
        F: Fn(&BTreeMap<String, String>) -> Option<serde_json::Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            target: Target::Login(Arc::new(f)),
        }
    }

    /// Wrap a per-route access check.
    pub fn allow<F>(name: impl Into<CompactString>, f: F) -> Self
    where
        F: Fn(&serde_json::Value, &str, &str) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            target: Target::Allow(Arc::new(f)),
        }
    }

    /// Wrap a deviation hook.
    pub fn load<F>(name: impl Into<CompactString>, f: F) -> Self
    where
        F: Fn(&Session) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            target: Target::Load(Arc::new(f)),
        }
    }

    /// Name used in exports and logs.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> CallbackKind {
        match self.target {
            Target::Login(_) => CallbackKind::Login,
            Target::Allow(_) => CallbackKind::Allow,
            Target::Load(_) => CallbackKind::Load,
        }
    }

    /// Run as a credential check. A callback of another kind, or a
    /// `null` identity, yields `None`.
    pub fn call_login(&self, fields: &BTreeMap<String, String>) -> Option<serde_json::Value> {
        let Target::Login(f) = &self.target else {
            tracing::warn!("callback '{}' is not a login callback", self.name);
            return None;
        };
        match f(fields) {
            Some(serde_json::Value::Null) => {
                tracing::warn!("login callback '{}' returned a null identity", self.name);
                None
            }
            other => other,
        }
    }

    /// Run as an access check. A callback of another kind denies.
    pub fn call_allow(&self, user: &serde_json::Value, id: &str, path: &str) -> bool {
        let Target::Allow(f) = &self.target else {
            tracing::warn!("callback '{}' is not an allow callback", self.name);
            return false;
        };
        f(user, id, path)
    }

    /// Run as a deviation hook. A callback of another kind yields `None`.
    pub fn call_load(&self, session: &Session) -> Option<String> {
        let Target::Load(f) = &self.target else {
            tracing::warn!("callback '{}' is not a load callback", self.name);
            return None;
        };
        f(session)
    }
}

impl PartialEq for Callback {
    fn eq(&self, other: &Self) -> bool {
        let same = match (&self.target, &other.target) {
            (Target::Login(a), Target::Login(b)) => Arc::ptr_eq(a, b),
            (Target::Allow(a), Target::Allow(b)) => Arc::ptr_eq(a, b),
            (Target::Load(a), Target::Load(b)) => Arc::ptr_eq(a, b),
            _ => false,
        };
        same && self.name == other.name
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("name", &self.name)
            .field("kind", &self.kind())
            .finish()
    }
}

/// A node of the raw configuration tree.
///
/// JSON documents convert into this tree; callbacks are attached
/// afterwards with [`Value::set`].
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Callback(Callback),
}

impl Value {
    /// An empty mapping.
    pub fn map() -> Self {
        Self::Map(BTreeMap::new())
    }

    /// Child of a mapping. `Null` children count as absent.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Self::Map(map) => map.get(key).filter(|v| !v.is_null()),
            _ => None,
        }
    }

    /// Follow a dotted path such as `LOG.GATEWAY`.
    pub fn pointer(&self, path: &str) -> Option<&Value> {
        path.split('.').try_fold(self, |node, key| node.get(key))
    }

    /// Set the node at a dotted path, creating intermediate mappings.
    ///
    /// Returns the previous value. A non-mapping node on the way is
    /// replaced by a mapping.
    pub fn set(&mut self, path: &str, value: impl Into<Value>) -> Option<Value> {
        let (parents, leaf) = match path.rsplit_once('.') {
            Some((parents, leaf)) => (Some(parents), leaf),
            None => (None, path),
        };
        let mut node = self;
        for key in parents.into_iter().flat_map(|p| p.split('.')) {
            node = node
                .ensure_map()
                .entry(key.to_owned())
                .or_insert_with(Self::map);
        }
        node.ensure_map().insert(leaf.to_owned(), value.into())
    }

    fn ensure_map(&mut self) -> &mut BTreeMap<String, Value> {
        if !matches!(self, Self::Map(_)) {
            *self = Self::map();
        }
        match self {
            Self::Map(map) => map,
            _ => unreachable!("node was just replaced by a map"),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_callback(&self) -> Option<&Callback> {
        match self {
            Self::Callback(cb) => Some(cb),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::String(s) => f.write_str(s),
            Self::List(_) => f.write_str("list"),
            Self::Map(_) => f.write_str("map"),
            Self::Callback(cb) => f.write_str(cb.name()),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Self::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Callback> for Value {
    fn from(cb: Callback) -> Self {
        Self::Callback(cb)
    }
}

impl<V: Into<Value>> From<Vec<V>> for Value {
    fn from(items: Vec<V>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Integer(n) => serializer.serialize_i64(*n),
            Self::Float(n) => serializer.serialize_f64(*n),
            Self::String(s) => serializer.serialize_str(s),
            Self::List(items) => serializer.collect_seq(items),
            Self::Map(map) => serializer.collect_map(map),
            Self::Callback(cb) => serializer.serialize_str(cb.name()),
        }
    }
}
