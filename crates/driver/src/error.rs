//! Error types for configuration and routing.

use thiserror::Error;

/// A configuration document failed validation.
///
/// Always fatal: no partially validated configuration is usable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason} [{path}]")]
pub struct ConfigError {
    /// Dotted path of the offending field, e.g. `CONFIG.LOG.TIME`.
    pub path: String,
    /// Human-readable reason.
    pub reason: String,
}

impl ConfigError {
    /// Create a new configuration error.
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Fatal errors raised while driving a request.
#[derive(Error, Debug)]
pub enum DriverError {
    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// `resolve()` was called a second time on the same request.
    #[error("Method can only be called once [resolve()]")]
    Reinvoked,

    /// Fingerprint material or a debug export could not be encoded.
    #[error("Error encoding data to JSON [{0}]")]
    Serialization(#[from] serde_json::Error),
}
