//! Login detection, login validity and credential registration.

use crate::{
    Config, DriverError, RequestContext, Session,
    hash::fingerprint,
    utils::{format_time, sanitize},
};
use std::collections::{BTreeMap, BTreeSet};

/// Authentication checks for one configuration.
#[derive(Debug, Clone, Copy)]
pub struct Authenticator<'a> {
    config: &'a Config,
}

impl<'a> Authenticator<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Whether the session holds a login whose fingerprint still matches
    /// the current request origin.
    pub fn is_logged_in(
        &self,
        session: &Session,
        request: &RequestContext,
    ) -> Result<bool, DriverError> {
        let Some(hash) = fingerprint(self.config, session, request)? else {
            return Ok(false);
        };
        Ok(session.hash.as_deref() == Some(hash.as_str()))
    }

    /// Whether this request submits the gateway's login form.
    ///
    /// The previous request must have been served the gateway by the same
    /// source, and the POST fields must be exactly the configured ones.
    pub fn is_login_attempt(
        &self,
        session: &Session,
        request: &RequestContext,
    ) -> Result<bool, DriverError> {
        if !request.is_post() {
            return Ok(false);
        }
        let Some(log) = &self.config.log else {
            return Ok(false);
        };
        if self.is_logged_in(session, request)? {
            return Ok(false);
        }
        let Some(last) = session.history.last() else {
            return Ok(false);
        };
        if last.resolved_path != log.gateway || last.request_source != request.source {
            return Ok(false);
        }

        let expected: BTreeSet<&str> = log.data.iter().map(String::as_str).collect();
        let submitted: BTreeSet<&str> = request.fields.keys().map(String::as_str).collect();
        Ok(expected == submitted)
    }

    /// Hand the submitted fields to the login callback and, on success,
    /// record the login in the session.
    ///
    /// A rejected login leaves the session untouched.
    pub fn register(
        &self,
        session: &mut Session,
        request: &RequestContext,
        now: i64,
    ) -> Result<bool, DriverError> {
        let Some(log) = &self.config.log else {
            return Ok(false);
        };
        let fields: BTreeMap<String, String> = request
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), sanitize(v)))
            .collect();
        let Some(user) = log.login.call_login(&fields) else {
            tracing::debug!("login rejected by '{}'", log.login.name());
            return Ok(false);
        };

        let login = Session {
            user: Some(user),
            login_time: Some(now),
            login_date: Some(format_time(now)),
            ..Session::default()
        };
        let hash = fingerprint(self.config, &login, request)?;

        session.user = login.user;
        session.login_time = login.login_time;
        session.login_date = login.login_date;
        session.hash = hash;
        tracing::info!("login accepted from {}", request.remote_addr);
        Ok(true)
    }
}
