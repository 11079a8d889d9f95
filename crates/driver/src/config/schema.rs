//! Declarative field descriptors for the configuration document.

use super::value::CallbackKind;

/// Expected kind of a configuration value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Boolean,
    /// A path to an existing file (a non-empty string when file checks
    /// are off).
    File,
    Integer,
    String,
    Map,
    List,
    Callback(CallbackKind),
}

impl Kind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::File => "file",
            Self::Integer => "integer",
            Self::String => "string",
            Self::Map => "map",
            Self::List => "list",
            Self::Callback(CallbackKind::Login) => "login callback",
            Self::Callback(CallbackKind::Allow) => "allow callback",
            Self::Callback(CallbackKind::Load) => "load callback",
        }
    }
}

/// Value assigned to an optional key that is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    Skip,
    Bool(bool),
    EmptyMap,
}

/// Constraints on one configuration key.
///
/// Checks run in a fixed order: kind, size, forbidden keys, item kinds,
/// duplicate items, allowed values. The first violation is reported.
#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub key: &'static str,
    pub required: bool,
    pub kind: Kind,
    /// Minimum element count for maps and lists, minimum value for integers.
    pub size: Option<i64>,
    /// Keys a map must not contain.
    pub bad_keys: &'static [&'static str],
    /// Kind every map value or list item must have.
    pub items: Option<Kind>,
    /// List items must be distinct.
    pub unique: bool,
    /// Allowed string values.
    pub values: &'static [&'static str],
    /// Nested schema for map kinds.
    pub keys: &'static [Field],
    /// Normalized value when an optional key is absent.
    pub fallback: Fallback,
}

impl Field {
    pub const fn required(key: &'static str, kind: Kind) -> Self {
        Self {
            key,
            required: true,
            kind,
            size: None,
            bad_keys: &[],
            items: None,
            unique: false,
            values: &[],
            keys: &[],
            fallback: Fallback::Skip,
        }
    }

    pub const fn optional(key: &'static str, kind: Kind) -> Self {
        let mut field = Self::required(key, kind);
        field.required = false;
        field
    }

    pub const fn size(mut self, size: i64) -> Self {
        self.size = Some(size);
        self
    }

    pub const fn bad_keys(mut self, keys: &'static [&'static str]) -> Self {
        self.bad_keys = keys;
        self
    }

    pub const fn items(mut self, kind: Kind) -> Self {
        self.items = Some(kind);
        self
    }

    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub const fn values(mut self, values: &'static [&'static str]) -> Self {
        self.values = values;
        self
    }

    pub const fn keys(mut self, keys: &'static [Field]) -> Self {
        self.keys = keys;
        self
    }

    pub const fn fallback(mut self, fallback: Fallback) -> Self {
        self.fallback = fallback;
        self
    }
}

/// Reserved route ids.
pub const HOME: &str = "HOME";
pub const EXIT: &str = "EXIT";

/// Schema of the `LOG` block.
pub const LOG: &[Field] = &[
    Field::required("GATEWAY", Kind::File),
    Field::required("EXIT", Kind::File),
    Field::required("DATA", Kind::List)
        .size(1)
        .items(Kind::String)
        .unique(),
    Field::required("LOGIN", Kind::Callback(CallbackKind::Login)),
    Field::optional("ALLOW", Kind::Callback(CallbackKind::Allow)),
    Field::optional("LOAD", Kind::Callback(CallbackKind::Load)),
    Field::optional("TIME", Kind::Integer).size(1),
];

/// Schema of the whole configuration document.
pub const CONFIG: &[Field] = &[
    Field::optional("CHECK", Kind::Boolean).fallback(Fallback::Bool(true)),
    Field::required("HOME", Kind::File),
    Field::optional("ID", Kind::Map)
        .bad_keys(&[HOME, EXIT])
        .items(Kind::File)
        .fallback(Fallback::EmptyMap),
    Field::optional("LOG", Kind::Map).keys(LOG),
];
