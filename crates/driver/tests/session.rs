//! Session store and session record tests.

use pagedriver::{
    HistoryEntry, MemoryStore, Session, SessionStore, Status,
    session::SESSION_KEY,
};
use serde_json::json;
use std::sync::Arc;

fn entry(status: Status, secs: i64) -> HistoryEntry {
    HistoryEntry {
        sequence: 0,
        status_text: status.text().to_owned(),
        requested_id: None,
        requested_resource: None,
        resolved_path: "home.html".to_owned(),
        request_source: "/index".to_owned(),
        requires_auth: false,
        is_authenticated: false,
        status_code: status.code(),
        time_seconds: secs,
        time_text: String::new(),
    }
}

#[test]
fn open_creates_session() {
    let store = MemoryStore::new();
    assert!(store.is_empty());

    let (id, handle) = store.open(None);
    assert_eq!(id.len(), 32);
    assert_eq!(*handle.lock(), Session::default());
    assert_eq!(store.len(), 1);

    let (again, same) = store.open(Some(id.as_str()));
    assert_eq!(again, id);
    assert!(Arc::ptr_eq(&handle, &same));
}

#[test]
fn open_unknown_id() {
    let store = MemoryStore::new();
    let (id, _) = store.open(Some("does-not-exist"));
    assert_ne!(id, "does-not-exist");
    assert!(store.get("does-not-exist").is_none());
    assert!(store.get(&id).is_some());
}

#[test]
fn rotate_moves_handle() {
    let store = MemoryStore::new();
    let (id, handle) = store.open(None);
    handle.lock().history.append(entry(Status::Permitted, 10));

    let fresh = store.rotate(&id, &handle);
    assert_ne!(fresh, id);
    assert!(store.get(&id).is_none());
    let moved = store.get(&fresh).unwrap();
    assert!(Arc::ptr_eq(&moved, &handle));
    assert_eq!(moved.lock().history.len(), 1);
    assert_eq!(store.len(), 1);
}

#[test]
fn remove_session() {
    let store = MemoryStore::new();
    let (id, _) = store.open(None);
    assert!(store.remove(&id).is_some());
    assert!(store.remove(&id).is_none());
    assert!(store.is_empty());
}

#[test]
fn cleanup_idle_sessions() {
    let store = MemoryStore::new();
    let (stale, handle) = store.open(None);
    handle.lock().history.append(entry(Status::Permitted, 100));
    let (active, handle) = store.open(None);
    handle.lock().history.append(entry(Status::Permitted, 950));
    let (empty, _) = store.open(None);

    assert_eq!(store.cleanup_idle(300, 1000), 1);
    assert!(store.get(&stale).is_none());
    assert!(store.get(&active).is_some());
    assert!(store.get(&empty).is_some());
}

#[test]
fn cleanup_skips_busy_sessions() {
    let store = MemoryStore::new();
    let (id, handle) = store.open(None);
    handle.lock().history.append(entry(Status::Permitted, 0));

    let guard = handle.lock();
    assert_eq!(store.cleanup_idle(10, 1000), 0);
    drop(guard);
    assert_eq!(store.cleanup_idle(10, 1000), 1);
    assert!(store.get(&id).is_none());
}

#[test]
fn clear_resets_everything() {
    let mut session = Session {
        user: Some(json!({ "name": "User 1" })),
        login_time: Some(1),
        login_date: Some("1970-01-01 00:00:01".to_owned()),
        hash: Some("00".repeat(16)),
        ..Session::new()
    };
    session.history.append(entry(Status::Authenticated, 1));

    session.clear();
    assert_eq!(session, Session::default());
}

#[test]
fn json_export_is_namespaced() {
    let mut session = Session::new();
    session.user = Some(json!({ "name": "User 1" }));
    session.history.append(entry(Status::Permitted, 5));

    let exported: serde_json::Value = serde_json::from_str(&session.to_json().unwrap()).unwrap();
    let record = &exported[SESSION_KEY];
    assert_eq!(record["user"]["name"], "User 1");
    assert_eq!(record["history"][0]["status_code"], 4);
    assert_eq!(record["history"][0]["status_text"], "PERMITTED ACCESS");
    assert!(record["hash"].is_null());
}
