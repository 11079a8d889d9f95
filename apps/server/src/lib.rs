//! Pagedriver server: serves the resource the driver resolves for each
//! request, with sessions kept in memory.

use anyhow::Result;
use axum::{
    Router,
    body::Bytes,
    extract::{ConnectInfo, Query, State},
    http::{
        HeaderMap, HeaderName, Method, StatusCode, Uri,
        header::{CONTENT_TYPE, COOKIE, SET_COOKIE, USER_AGENT},
    },
    response::{IntoResponse, Response},
    routing::any,
};
use driver::{Clock, Driver, MemoryStore, RequestContext, SessionStore, SystemClock};
use std::{collections::BTreeMap, net::SocketAddr, sync::Arc, time::Duration};
use tokio::signal;
pub use {
    document::{CALLBACK_SLOTS, Registry},
    users::{UserDirectory, UserRecord},
};

pub mod document;
pub mod users;

/// Cookie carrying the session id.
pub const SESSION_COOKIE: &str = "DRIVER";

/// Response header carrying the numeric routing status.
pub const STATUS_HEADER: &str = "x-driver-status";

/// Shared state for the request handler.
#[derive(Clone)]
pub struct AppState {
    pub driver: Arc<Driver>,
    pub sessions: Arc<MemoryStore>,
}

impl AppState {
    pub fn new(driver: Driver) -> Self {
        Self {
            driver: Arc::new(driver),
            sessions: Arc::new(MemoryStore::new()),
        }
    }
}

/// Build the axum router. Every path is routed through the driver.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", any(page))
        .fallback(page)
        .with_state(state)
}

/// Bind and serve until ctrl-c.
///
/// Sessions idle for longer than `idle` are swept once a minute.
pub async fn serve(state: AppState, bind: &str, idle: Duration) -> Result<()> {
    let sessions = Arc::clone(&state.sessions);
    let sweeper = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(60));
        loop {
            ticker.tick().await;
            let removed = sessions.cleanup_idle(idle.as_secs(), SystemClock.now());
            if removed > 0 {
                tracing::debug!("dropped {removed} idle sessions, {} left", sessions.len());
            }
        }
    });

    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!(
        "pagedriver {} listening on {}",
        Driver::version(),
        listener.local_addr()?
    );
    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    sweeper.abort();
    tracing::info!("pagedriver shut down");
    Ok(())
}

async fn page(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    method: Method,
    uri: Uri,
    Query(query): Query<BTreeMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let sid = session_cookie(&headers);
    let request = request_context(&method, &uri, &query, &headers, &body, addr);
    tracing::debug!("{method} {uri} from {addr}");

    let AppState { driver, sessions } = state;
    let resolved = tokio::task::spawn_blocking(move || {
        driver
            .request(sessions.as_ref(), sid.as_deref(), request)
            .resolve()
    })
    .await;
    let resolution = match resolved {
        Ok(Ok(resolution)) => resolution,
        Ok(Err(e)) => return failure(e),
        Err(e) => return failure(format!("request task failed: {e}")),
    };

    // The old id is gone once resolve() has run, so every response from
    // here on carries the rotated cookie.
    let session = [
        (
            SET_COOKIE,
            format!(
                "{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax",
                resolution.session_id
            ),
        ),
        (
            HeaderName::from_static(STATUS_HEADER),
            resolution.status.code().to_string(),
        ),
    ];
    match tokio::fs::read(&resolution.path).await {
        Ok(content) => (
            [(CONTENT_TYPE, "text/html; charset=utf-8")],
            session,
            content,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to read {}: {e}", resolution.path);
            let error = format!("Error reading resource [{}]", resolution.path);
            (session, failure(error)).into_response()
        }
    }
}

/// Build the driver's view of an HTTP request.
///
/// The request path is the request source; POST bodies are decoded as
/// urlencoded forms.
pub fn request_context(
    method: &Method,
    uri: &Uri,
    query: &BTreeMap<String, String>,
    headers: &HeaderMap,
    body: &[u8],
    addr: SocketAddr,
) -> RequestContext {
    let fields = if *method == Method::POST {
        url::form_urlencoded::parse(body).into_owned().collect()
    } else {
        BTreeMap::new()
    };
    RequestContext {
        method: method.as_str().parse().unwrap_or_default(),
        id: query.get("id").cloned(),
        fields,
        remote_addr: addr.ip().to_string(),
        user_agent: headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned),
        source: uri.path().to_owned(),
    }
}

/// Session id from the `DRIVER` cookie.
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_owned())
        .filter(|value| !value.is_empty())
}

fn failure(error: impl std::fmt::Display) -> Response {
    tracing::error!("{error}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("Driver Error: {error}"),
    )
        .into_response()
}

/// Wait for ctrl-c signal for graceful shutdown.
async fn shutdown_signal() {
    signal::ctrl_c()
        .await
        .expect("failed to install ctrl-c handler");
    tracing::info!("received shutdown signal");
}
