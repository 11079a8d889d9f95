//! Pagedriver resolves, for each page request, which resource to serve
//! and whether the requester is authenticated.
//!
//! A [`Driver`] is built once from a validated [`Config`] and shared across
//! requests. Each inbound request opens a [`Request`] against a
//! [`SessionStore`] and calls [`Request::resolve`] exactly once.
//!
//! ```rust,ignore
//! use pagedriver::{Driver, MemoryStore, RequestContext};
//!
//! let driver = Driver::from_value(&raw)?;
//! let store = MemoryStore::new();
//! let mut request = driver.request(&store, cookie.as_deref(), RequestContext::get("/"));
//! let resolution = request.resolve()?;
//! serve(resolution.path);
//! ```

pub use {
    auth::Authenticator,
    config::{Callback, Config, Log, Value},
    driver::{Driver, Request, Resolution},
    error::{ConfigError, DriverError},
    history::{History, HistoryEntry},
    request::{Method, RequestContext},
    session::{MemoryStore, Session, SessionHandle, SessionStore},
    status::Status,
    utils::{Clock, SystemClock},
};

pub mod auth;
pub mod config;
mod driver;
mod error;
pub mod hash;
mod history;
mod request;
pub mod session;
mod status;
pub mod utils;
