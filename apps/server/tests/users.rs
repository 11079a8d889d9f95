//! User directory and callback tests.

use pagedriver_server::{
    UserDirectory,
    users::{credentials, levels},
};
use serde_json::json;
use std::{collections::BTreeMap, sync::Arc};

const USERS: &str = r#"{
    "user1": { "pwd": "123456", "data": { "level": ["log", "only1"], "name": "User 1" } },
    "user2": { "pwd": "654321", "data": { "level": ["log", "only2"], "name": "User 2" } }
}"#;

fn fields(usr: &str, pwd: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("usr".to_owned(), usr.to_owned()),
        ("pwd".to_owned(), pwd.to_owned()),
    ])
}

#[test]
fn parse_directory() {
    let directory = UserDirectory::from_json(USERS).unwrap();
    assert_eq!(directory.len(), 2);
    assert!(!directory.is_empty());
    assert!(UserDirectory::from_json("[]").is_err());
}

#[test]
fn verify_credentials() {
    let directory = UserDirectory::from_json(USERS).unwrap();
    assert_eq!(
        directory.verify("user1", "123456"),
        Some(json!({ "level": ["log", "only1"], "name": "User 1" }))
    );
    assert_eq!(directory.verify("user1", "654321"), None);
    assert_eq!(directory.verify("nobody", "123456"), None);
}

#[test]
fn credentials_callback() {
    let directory = Arc::new(UserDirectory::from_json(USERS).unwrap());
    let login = credentials(directory);
    assert_eq!(login.name(), "credentials");
    assert_eq!(
        login.call_login(&fields("user2", "654321")).unwrap()["name"],
        "User 2"
    );
    assert!(login.call_login(&fields("user2", "123456")).is_none());
    assert!(login.call_login(&BTreeMap::new()).is_none());
}

#[test]
fn levels_callback() {
    let allow = levels();
    let user = json!({ "level": ["log", "only1"] });
    assert!(allow.call_allow(&user, "only1", "content/only1.html"));
    assert!(!allow.call_allow(&user, "only2", "content/only2.html"));
    assert!(!allow.call_allow(&json!({ "name": "no levels" }), "log", "log.html"));
}

#[test]
fn load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("users.json");
    std::fs::write(&path, USERS).unwrap();

    let registry = Arc::new(UserDirectory::load(&path).unwrap()).registry();
    let names: Vec<_> = registry.names().collect();
    assert_eq!(names, vec!["credentials", "levels"]);

    assert!(UserDirectory::load(&dir.path().join("missing.json")).is_err());
}
