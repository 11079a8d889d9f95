//! Configuration document loading tests.

use driver::{
    Callback, Config, Driver, MemoryStore, RequestContext, Status, config::CallbackKind,
};
use pagedriver_server::{Registry, UserDirectory, document};
use std::sync::Arc;

const USERS: &str = r#"{ "user1": { "pwd": "123456", "data": { "level": ["only1"] } } }"#;

const DOCUMENT: &str = r#"{
    "CHECK": false,
    "HOME": "content/home.html",
    "ID": { "only1": "content/only1.html", "only2": "content/only2.html" },
    "LOG": {
        "GATEWAY": "content/login.html",
        "EXIT": "content/exit.html",
        "DATA": ["usr", "pwd"],
        "LOGIN": "credentials",
        "ALLOW": "levels",
        "TIME": 300
    }
}"#;

fn registry() -> Registry {
    Arc::new(UserDirectory::from_json(USERS).unwrap()).registry()
}

#[test]
fn callbacks_attached_by_name() {
    let doc = document::parse(DOCUMENT, &registry()).unwrap();
    let login = doc.pointer("LOG.LOGIN").and_then(|v| v.as_callback()).unwrap();
    assert_eq!(login.kind(), CallbackKind::Login);
    assert_eq!(login.name(), "credentials");

    let config = Config::from_value(&doc).unwrap();
    let log = config.log.unwrap();
    assert_eq!(log.allow.unwrap().name(), "levels");
    assert_eq!(log.timeout, Some(300));
}

#[test]
fn unregistered_callback_fails_validation() {
    let doc = document::parse(DOCUMENT, &Registry::default()).unwrap();
    let err = Config::from_value(&doc).unwrap_err();
    assert_eq!(err.to_string(), "Inappropriate information [CONFIG.LOG.LOGIN]");
}

#[test]
fn callback_of_wrong_kind_fails_validation() {
    let mut registry = Registry::default();
    registry.insert(Callback::allow("credentials", |_, _, _| true));
    registry.insert(Callback::allow("levels", |_, _, _| true));
    let doc = document::parse(DOCUMENT, &registry).unwrap();
    assert_eq!(Config::from_value(&doc).unwrap_err().path, "CONFIG.LOG.LOGIN");
}

#[test]
fn malformed_json() {
    let err = document::parse("{ \"HOME\": ", &registry()).unwrap_err();
    assert_eq!(err.to_string(), "Error in JSON file structure [CONFIG]");
}

#[test]
fn non_object_document() {
    let err = document::parse("[1, 2, 3]", &registry()).unwrap_err();
    assert_eq!(err.to_string(), "Inadequate configuration data [CONFIG]");
}

#[test]
fn missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = document::load(&dir.path().join("config.json"), &registry()).unwrap_err();
    assert_eq!(err.to_string(), "Error reading configuration file [CONFIG]");
}

#[test]
fn serve_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    for page in ["home", "login", "exit", "only1", "only2"] {
        std::fs::write(dir.path().join(format!("{page}.html")), page).unwrap();
    }
    let path = |page: &str| dir.path().join(page).to_str().unwrap().to_owned();
    let config = serde_json::json!({
        "HOME": path("home.html"),
        "ID": { "only1": path("only1.html"), "only2": path("only2.html") },
        "LOG": {
            "GATEWAY": path("login.html"),
            "EXIT": path("exit.html"),
            "DATA": ["usr", "pwd"],
            "LOGIN": "credentials",
            "ALLOW": "levels"
        }
    });
    let file = dir.path().join("config.json");
    std::fs::write(&file, config.to_string()).unwrap();

    let doc = document::load(&file, &registry()).unwrap();
    let driver = Driver::from_value(&doc).unwrap();
    assert!(driver.config().check);

    let store = MemoryStore::new();
    let ctx = || RequestContext::get("/").remote_addr("127.0.0.1");
    let first = driver.request(&store, None, ctx()).resolve().unwrap();
    assert_eq!(first.path, path("login.html"));

    let post = RequestContext::post("/", [("usr", "user1"), ("pwd", "123456")])
        .remote_addr("127.0.0.1");
    let login = driver
        .request(&store, Some(first.session_id.as_str()), post)
        .resolve()
        .unwrap();
    assert_eq!(login.status, Status::Authenticated);

    let allowed = driver
        .request(&store, Some(login.session_id.as_str()), ctx().id("only1"))
        .resolve()
        .unwrap();
    assert_eq!(allowed.path, path("only1.html"));

    let denied = driver
        .request(&store, Some(allowed.session_id.as_str()), ctx().id("only2"))
        .resolve()
        .unwrap();
    assert_eq!((denied.path, denied.status), (path("home.html"), Status::Denied));
}
