//! Router tests: headers, cookie rotation and failure responses.

use axum::{
    Router,
    body::{Body, to_bytes},
    extract::ConnectInfo,
    http::{
        HeaderMap, Request, StatusCode,
        header::{CONTENT_TYPE, COOKIE, SET_COOKIE},
    },
};
use driver::{Callback, Driver, SessionStore, Value};
use pagedriver_server::{AppState, SESSION_COOKIE, STATUS_HEADER, router};
use serde_json::json;
use std::{net::SocketAddr, path::Path};
use tower::ServiceExt;

struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: String,
}

impl Reply {
    fn code(&self) -> &str {
        self.headers[STATUS_HEADER].to_str().unwrap()
    }

    fn sid(&self) -> String {
        let cookie = self.headers[SET_COOKIE].to_str().unwrap();
        let (pair, _) = cookie.split_once(';').unwrap();
        let (name, sid) = pair.split_once('=').unwrap();
        assert_eq!(name, SESSION_COOKIE);
        sid.to_owned()
    }
}

fn pages(dir: &Path) -> impl Fn(&str) -> String + '_ {
    for page in ["home", "login", "exit"] {
        std::fs::write(dir.join(format!("{page}.html")), page).unwrap();
    }
    move |page: &str| dir.join(page).to_str().unwrap().to_owned()
}

fn app(doc: Value) -> (Router, AppState) {
    let state = AppState::new(Driver::from_value(&doc).unwrap());
    (router(state.clone()), state)
}

async fn send(app: &Router, mut request: Request<Body>) -> Reply {
    let addr: SocketAddr = "127.0.0.1:40000".parse().unwrap();
    request.extensions_mut().insert(ConnectInfo(addr));
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    Reply {
        status,
        headers,
        body: String::from_utf8(bytes.to_vec()).unwrap(),
    }
}

fn get(uri: &str, sid: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(uri);
    if let Some(sid) = sid {
        builder = builder.header(COOKIE, format!("{SESSION_COOKIE}={sid}"));
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn login_rotates_cookie() {
    let dir = tempfile::tempdir().unwrap();
    let path = pages(dir.path());
    let mut doc = Value::from(json!({ "CHECK": false, "HOME": path("home.html") }));
    doc.set("LOG.GATEWAY", path("login.html"));
    doc.set("LOG.EXIT", path("exit.html"));
    doc.set("LOG.DATA", vec!["usr", "pwd"]);
    doc.set(
        "LOG.LOGIN",
        Callback::login("valid_creds", |fields| {
            (fields.get("usr")? == "user1" && fields.get("pwd")? == "123456")
                .then(|| json!({ "name": "User 1" }))
        }),
    );
    let (app, state) = app(doc);

    let first = send(&app, get("/", None)).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.code(), "1");
    assert_eq!(first.body, "login");
    assert_eq!(
        first.headers[CONTENT_TYPE].to_str().unwrap(),
        "text/html; charset=utf-8"
    );

    let login = Request::post("/")
        .header(COOKIE, format!("{SESSION_COOKIE}={}", first.sid()))
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("usr=user1&pwd=123456"))
        .unwrap();
    let second = send(&app, login).await;
    assert_eq!((second.code(), second.body.as_str()), ("3", "home"));
    assert_ne!(second.sid(), first.sid());
    assert!(state.sessions.get(&first.sid()).is_none());
    assert_eq!(state.sessions.len(), 1);

    let stale = send(&app, get("/", Some(&first.sid()))).await;
    assert_eq!((stale.code(), stale.body.as_str()), ("1", "login"));
}

#[tokio::test]
async fn unreadable_resource_keeps_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = pages(dir.path());
    let missing = path("missing.html");
    let doc = Value::from(json!({
        "CHECK": false,
        "HOME": path("home.html"),
        "ID": { "gone": missing.as_str() }
    }));
    let (app, state) = app(doc);

    let first = send(&app, get("/", None)).await;
    let failed = send(&app, get("/?id=gone", Some(&first.sid()))).await;
    assert_eq!(failed.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        failed.body,
        format!("Driver Error: Error reading resource [{missing}]")
    );
    assert_eq!(failed.code(), "4");
    assert_ne!(failed.sid(), first.sid());

    let after = send(&app, get("/", Some(&failed.sid()))).await;
    assert_eq!((after.status, after.body.as_str()), (StatusCode::OK, "home"));
    let handle = state.sessions.get(&after.sid()).unwrap();
    assert_eq!(handle.lock().history.len(), 3);
}
