//! Per-session state and the stores that keep it.
//!
//! A session is created lazily on first touch and mutated by every
//! request. The store hands out one shared handle per session id; holding
//! the handle's lock serialises requests for that id without blocking
//! other sessions.

use crate::{DriverError, History};
use compact_str::CompactString;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, sync::Arc};

/// Namespace of the driver record inside a session.
pub const SESSION_KEY: &str = "__DRIVER__";

/// Driver state of one session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Identity payload returned by the login callback.
    pub user: Option<serde_json::Value>,
    /// Login time, unix seconds.
    pub login_time: Option<i64>,
    /// Login time, `YYYY-MM-DD HH:MM:SS`.
    pub login_date: Option<String>,
    /// Fingerprint computed at login.
    pub hash: Option<String>,
    pub history: History,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Logout: reset every field and drop the history.
    pub fn clear(&mut self) {
        self.user = None;
        self.login_time = None;
        self.login_date = None;
        self.hash = None;
        self.history.clear();
    }

    /// Debug export, namespaced under [`SESSION_KEY`].
    pub fn to_json(&self) -> Result<String, DriverError> {
        let mut doc = serde_json::Map::new();
        doc.insert(SESSION_KEY.to_owned(), serde_json::to_value(self)?);
        Ok(serde_json::to_string_pretty(&doc)?)
    }
}

/// Shared, lockable session record.
pub type SessionHandle = Arc<Mutex<Session>>;

/// Durable per-session state keyed by session id.
pub trait SessionStore: Send + Sync {
    /// Open the session for `id`, creating an empty one when `id` is
    /// missing or unknown. Returns the effective id and the handle.
    fn open(&self, id: Option<&str>) -> (CompactString, SessionHandle);

    /// Re-key `handle` under a fresh id. The old id stops resolving.
    fn rotate(&self, id: &str, handle: &SessionHandle) -> CompactString;

    /// Drop a session entirely.
    fn remove(&self, id: &str) -> Option<SessionHandle>;

    /// Number of live sessions.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-process session store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sessions: Mutex<BTreeMap<CompactString, SessionHandle>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a session handle by id.
    pub fn get(&self, id: &str) -> Option<SessionHandle> {
        self.sessions.lock().get(id).cloned()
    }

    /// Drop sessions whose last request is older than `max_idle_secs`.
    ///
    /// Sessions without history are kept. Returns the number removed.
    pub fn cleanup_idle(&self, max_idle_secs: u64, now: i64) -> usize {
        let cutoff = now.saturating_sub(max_idle_secs as i64);
        // Session locks are never taken while the map lock is held.
        let snapshot: Vec<_> = self
            .sessions
            .lock()
            .iter()
            .map(|(id, handle)| (id.clone(), Arc::clone(handle)))
            .collect();
        let idle: Vec<_> = snapshot
            .into_iter()
            .filter(|(_, handle)| {
                handle
                    .try_lock()
                    .and_then(|session| session.history.last().map(|last| last.time_seconds))
                    .is_some_and(|last| last < cutoff)
            })
            .collect();

        let mut sessions = self.sessions.lock();
        let mut removed = 0;
        for (id, handle) in idle {
            // Skip sessions rotated or replaced since the snapshot.
            if sessions
                .get(&id)
                .is_some_and(|current| Arc::ptr_eq(current, &handle))
            {
                sessions.remove(&id);
                removed += 1;
            }
        }
        removed
    }
}

impl SessionStore for MemoryStore {
    fn open(&self, id: Option<&str>) -> (CompactString, SessionHandle) {
        let mut sessions = self.sessions.lock();
        if let Some(id) = id
            && let Some(handle) = sessions.get(id)
        {
            return (CompactString::new(id), Arc::clone(handle));
        }

        let id = new_id();
        let handle = SessionHandle::default();
        sessions.insert(id.clone(), Arc::clone(&handle));
        tracing::debug!("session.open sid={id}");
        (id, handle)
    }

    fn rotate(&self, id: &str, handle: &SessionHandle) -> CompactString {
        let mut sessions = self.sessions.lock();
        sessions.remove(id);
        let fresh = new_id();
        sessions.insert(fresh.clone(), Arc::clone(handle));
        tracing::debug!("session.rotate sid={id} -> {fresh}");
        fresh
    }

    fn remove(&self, id: &str) -> Option<SessionHandle> {
        self.sessions.lock().remove(id)
    }

    fn len(&self) -> usize {
        self.sessions.lock().len()
    }
}

fn new_id() -> CompactString {
    CompactString::new(uuid::Uuid::new_v4().simple().to_string())
}
