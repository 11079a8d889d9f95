//! Session fingerprint.
//!
//! Binds a login to the identity, the login time and the request origin.
//! The digest is a 128-bit xxh3 checksum: it detects a session replayed
//! from another address or browser, it is not a MAC.

use crate::{Config, DriverError, RequestContext, Session};
use serde::Serialize;
use xxhash_rust::xxh3::xxh3_128;

#[derive(Serialize)]
struct Material<'a> {
    user: &'a serde_json::Value,
    time: i64,
    date: &'a str,
    ip: &'a str,
    nav: Option<&'a str>,
}

/// Compute the fingerprint of `session` as seen from `request`.
///
/// Returns `None` when authentication is disabled or the session holds
/// no completed login.
pub fn fingerprint(
    config: &Config,
    session: &Session,
    request: &RequestContext,
) -> Result<Option<String>, DriverError> {
    if !config.requires_auth() {
        return Ok(None);
    }
    let (Some(user), Some(time), Some(date)) = (
        session.user.as_ref().filter(|u| !u.is_null()),
        session.login_time,
        session.login_date.as_deref(),
    ) else {
        return Ok(None);
    };

    let material = serde_json::to_vec(&Material {
        user,
        time,
        date,
        ip: &request.remote_addr,
        nav: request.user_agent.as_deref(),
    })?;
    Ok(Some(format!("{:032x}", xxh3_128(&material))))
}
