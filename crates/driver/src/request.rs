//! Read-only facts about the inbound request.

use std::{collections::BTreeMap, fmt, str::FromStr};

/// HTTP method, as far as routing cares.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    #[default]
    Get,
    Post,
    Other,
}

impl FromStr for Method {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_uppercase().as_str() {
            "GET" => Self::Get,
            "POST" => Self::Post,
            _ => Self::Other,
        })
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Other => "OTHER",
        })
    }
}

/// Per-request context handed to the driver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub method: Method,
    /// The `id` query parameter.
    pub id: Option<String>,
    /// POST body fields.
    pub fields: BTreeMap<String, String>,
    pub remote_addr: String,
    pub user_agent: Option<String>,
    /// Script or module serving the request.
    pub source: String,
}

impl RequestContext {
    /// A GET request served by `source`.
    pub fn get(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Default::default()
        }
    }

    /// A POST request served by `source`.
    pub fn post<K, V>(source: impl Into<String>, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            method: Method::Post,
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            source: source.into(),
            ..Default::default()
        }
    }

    /// Set the requested route id.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn remote_addr(mut self, addr: impl Into<String>) -> Self {
        self.remote_addr = addr.into();
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn is_post(&self) -> bool {
        self.method == Method::Post
    }
}
