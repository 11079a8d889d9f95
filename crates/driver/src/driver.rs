//! The routing state machine.
//!
//! A [`Driver`] is built once per configuration. Every inbound request
//! opens a [`Request`], which resolves exactly once: it rotates the
//! session id, evaluates the free or restricted branch, logs out on
//! close/expiry, appends a history entry and finally gives the load hook
//! a chance to deviate.

use crate::{
    Authenticator, Callback, Config, ConfigError, DriverError, HistoryEntry, Log, RequestContext,
    Session, SessionHandle, SessionStore, Status, Value,
    config::{EXIT, HOME},
    utils::{Clock, SystemClock, format_time},
};
use compact_str::CompactString;
use std::sync::Arc;

/// Crate version reported by [`Driver::version`].
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

static ANONYMOUS: serde_json::Value = serde_json::Value::Null;

/// Shared routing engine for one configuration.
#[derive(Clone)]
pub struct Driver {
    config: Arc<Config>,
    clock: Arc<dyn Clock>,
}

impl Driver {
    /// Create a driver over a validated configuration.
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            clock: Arc::new(SystemClock),
        }
    }

    /// Validate a raw document and create a driver.
    pub fn from_value(doc: &Value) -> Result<Self, ConfigError> {
        Config::from_value(doc).map(Self::new)
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn version() -> &'static str {
        VERSION
    }

    /// Open the request scope for one inbound request.
    ///
    /// The session is created on first touch. Nothing is routed until
    /// [`Request::resolve`] runs.
    pub fn request<'a, S: SessionStore + ?Sized>(
        &'a self,
        store: &'a S,
        session_id: Option<&str>,
        request: RequestContext,
    ) -> Request<'a, S> {
        let (session_id, handle) = store.open(session_id);
        Request {
            driver: self,
            store,
            session_id,
            handle,
            request,
            status: Status::SessionStarted,
            resolved: false,
        }
    }
}

/// Final routing decision of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Resource to serve.
    pub path: String,
    pub status: Status,
    /// Session id after rotation; the caller hands it back to the client.
    pub session_id: CompactString,
}

/// One request lifecycle.
pub struct Request<'a, S: ?Sized> {
    driver: &'a Driver,
    store: &'a S,
    session_id: CompactString,
    handle: SessionHandle,
    request: RequestContext,
    status: Status,
    resolved: bool,
}

impl<'a, S: SessionStore + ?Sized> Request<'a, S> {
    /// Status of the most recent decision, [`Status::SessionStarted`]
    /// before [`resolve`](Self::resolve).
    pub fn status(&self) -> Status {
        self.status
    }

    /// Current session id.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn context(&self) -> &RequestContext {
        &self.request
    }

    /// Copy of the session state.
    pub fn snapshot(&self) -> Session {
        self.handle.lock().clone()
    }

    /// Decide which resource to serve.
    ///
    /// May run once; a second call fails with [`DriverError::Reinvoked`].
    pub fn resolve(&mut self) -> Result<Resolution, DriverError> {
        if self.resolved {
            tracing::error!("resolve() called twice for sid={}", self.session_id);
            return Err(DriverError::Reinvoked);
        }
        self.resolved = true;

        self.session_id = self.store.rotate(&self.session_id, &self.handle);
        let driver = self.driver;
        let config: &'a Config = &driver.config;
        let now = driver.clock.now();
        let handle = Arc::clone(&self.handle);
        let mut session = handle.lock();

        let (status, path) = match &config.log {
            None => free(config, self.request.id.as_deref()),
            Some(log) => self.restricted(config, log, &mut session, now)?,
        };
        self.status = status;
        tracing::debug!(
            "resolved id={:?} -> {path} ({})",
            self.request.id,
            status.code()
        );

        if status.is_logout() {
            session.clear();
            tracing::info!("logout sid={}: {status}", self.session_id);
        }
        self.record(config, &mut session, &path, now)?;

        let deviated = match &config.log {
            Some(log) => match &log.load {
                Some(load) => self.deviate(config, log, load, &mut session, now)?,
                None => None,
            },
            None => None,
        };

        Ok(Resolution {
            path: deviated.unwrap_or(path),
            status: self.status,
            session_id: self.session_id.clone(),
        })
    }

    fn restricted(
        &self,
        config: &Config,
        log: &Log,
        session: &mut Session,
        now: i64,
    ) -> Result<(Status, String), DriverError> {
        let auth = Authenticator::new(config);
        let request = &self.request;

        if auth.is_login_attempt(session, request)? {
            return Ok(if auth.register(session, request, now)? {
                (Status::Authenticated, config.home.clone())
            } else {
                (Status::AuthFailed, log.gateway.clone())
            });
        }

        if !auth.is_logged_in(session, request)? {
            return Ok((Status::AuthRequired, log.gateway.clone()));
        }

        let id = request.id.as_deref();
        if id == Some(EXIT) {
            return Ok((Status::Closed, log.exit.clone()));
        }

        if let Some(timeout) = log.timeout
            && let Some(last) = session.history.last()
            && now.saturating_sub(last.time_seconds) > timeout as i64
        {
            tracing::debug!("session idle since {}", last.time_text);
            return Ok((Status::Expired, log.exit.clone()));
        }

        let Some(id) = id.filter(|id| *id != HOME) else {
            return Ok((Status::Permitted, config.home.clone()));
        };
        let Some(path) = config.route(id) else {
            return Ok((Status::NotFound, config.home.clone()));
        };

        if let Some(allow) = &log.allow {
            let user = session.user.as_ref().unwrap_or(&ANONYMOUS);
            if !allow.call_allow(user, id, path) {
                return Ok((Status::Denied, config.home.clone()));
            }
        }

        Ok((Status::Permitted, path.to_owned()))
    }

    /// Let the load hook override the computed route.
    fn deviate(
        &mut self,
        config: &Config,
        log: &Log,
        load: &Callback,
        session: &mut Session,
        now: i64,
    ) -> Result<Option<String>, DriverError> {
        let snapshot = session.clone();
        let Some(target) = load.call_load(&snapshot) else {
            return Ok(None);
        };

        let path = if config.is_resource(&target) {
            target
        } else if target == HOME {
            config.home.clone()
        } else if target == EXIT {
            session.clear();
            tracing::info!("logout sid={} requested by '{}'", self.session_id, load.name());
            log.exit.clone()
        } else if let Some(path) = config.route(&target) {
            path.to_owned()
        } else {
            tracing::debug!("ignoring load target {target:?}");
            return Ok(None);
        };

        self.status = Status::Deviated;
        tracing::info!("route deviated to {path} by '{}'", load.name());
        self.record(config, session, &path, now)?;
        Ok(Some(path))
    }

    /// Append the current decision to the session history.
    fn record(
        &self,
        config: &Config,
        session: &mut Session,
        path: &str,
        now: i64,
    ) -> Result<(), DriverError> {
        let is_authenticated = Authenticator::new(config).is_logged_in(session, &self.request)?;
        let requested_id = self.request.id.clone();
        session.history.append(HistoryEntry {
            sequence: 0,
            status_text: self.status.text().to_owned(),
            requested_resource: requested_id
                .as_deref()
                .and_then(|id| config.route(id))
                .map(str::to_owned),
            requested_id,
            resolved_path: path.to_owned(),
            request_source: self.request.source.clone(),
            requires_auth: config.requires_auth(),
            is_authenticated,
            status_code: self.status.code(),
            time_seconds: now,
            time_text: format_time(now),
        });
        Ok(())
    }
}

/// Routing without authentication.
fn free(config: &Config, id: Option<&str>) -> (Status, String) {
    match id {
        None | Some(HOME) | Some(EXIT) => (Status::Permitted, config.home.clone()),
        Some(id) => match config.route(id) {
            Some(path) => (Status::Permitted, path.to_owned()),
            None => (Status::NotFound, config.home.clone()),
        },
    }
}
