//! Stub notes API with call counters, plus helpers for building controllers.

#![allow(dead_code)]

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose, Engine as _};
use notes_session::{
    services::{persist::MemoryPersistStore, AuthClient},
    SessionConfig, SessionController,
};
use serde_json::json;
use std::future::IntoFuture;
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

/// Decodable but unsigned access token; `tag` keeps tokens distinct.
pub fn fake_token(username: &str, roles: &[&str], tag: &str) -> String {
    let header = general_purpose::URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = json!({
        "UserInfo": { "username": username, "roles": roles },
        "iat": 1_700_000_000,
        "exp": 4_000_000_000i64,
        "jti": tag,
    });
    let payload = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{}.{}.{}", header, payload, tag)
}

pub struct StubState {
    pub stale_token: String,
    pub fresh_token: String,
    /// Status `/auth/refresh` answers with; 0 never answers.
    pub refresh_status: AtomicU16,
    pub accept_fresh: AtomicBool,
    pub refresh_calls: AtomicUsize,
    pub resource_calls: AtomicUsize,
    pub logout_calls: AtomicUsize,
    pub seen_auth: Mutex<Vec<String>>,
}

impl StubState {
    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn resource_calls(&self) -> usize {
        self.resource_calls.load(Ordering::SeqCst)
    }

    pub fn logout_calls(&self) -> usize {
        self.logout_calls.load(Ordering::SeqCst)
    }

    pub fn seen_auth(&self) -> Vec<String> {
        self.seen_auth.lock().unwrap().clone()
    }

    pub fn set_refresh_status(&self, status: u16) {
        self.refresh_status.store(status, Ordering::SeqCst);
    }

    /// Make `/notes` refuse even the renewed token.
    pub fn reject_fresh(&self) {
        self.accept_fresh.store(false, Ordering::SeqCst);
    }
}

/// Login always hands out the stale token; only the fresh one from
/// `/auth/refresh` is accepted by `/notes`.
async fn stub_login(State(state): State<Arc<StubState>>) -> Response {
    Json(json!({ "accessToken": state.stale_token })).into_response()
}

async fn stub_refresh(State(state): State<Arc<StubState>>) -> Response {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);
    // Widen the window for racing boot calls.
    tokio::time::sleep(Duration::from_millis(50)).await;

    match state.refresh_status.load(Ordering::SeqCst) {
        200 => Json(json!({ "accessToken": state.fresh_token })).into_response(),
        0 => {
            tokio::time::sleep(Duration::from_secs(30)).await;
            StatusCode::GATEWAY_TIMEOUT.into_response()
        }
        status => {
            let status = StatusCode::from_u16(status).unwrap();
            let message = status.canonical_reason().unwrap_or("error");
            (status, Json(json!({ "message": message }))).into_response()
        }
    }
}

async fn stub_logout(State(state): State<Arc<StubState>>) -> Response {
    state.logout_calls.fetch_add(1, Ordering::SeqCst);
    StatusCode::NO_CONTENT.into_response()
}

async fn stub_notes(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    state.resource_calls.fetch_add(1, Ordering::SeqCst);

    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    state.seen_auth.lock().unwrap().push(auth.clone());

    if state.accept_fresh.load(Ordering::SeqCst) && auth == format!("Bearer {}", state.fresh_token) {
        Json(json!([{ "title": "first note" }])).into_response()
    } else {
        (StatusCode::FORBIDDEN, Json(json!({ "message": "Forbidden" }))).into_response()
    }
}

pub struct StubServer {
    pub state: Arc<StubState>,
    pub base_url: String,
}

impl StubServer {
    pub async fn spawn(refresh_ok: bool) -> Self {
        let state = Arc::new(StubState {
            stale_token: fake_token("alice", &["Employee"], "stale"),
            fresh_token: fake_token("alice", &["Employee", "Manager"], "fresh"),
            refresh_status: AtomicU16::new(if refresh_ok { 200 } else { 403 }),
            accept_fresh: AtomicBool::new(true),
            refresh_calls: AtomicUsize::new(0),
            resource_calls: AtomicUsize::new(0),
            logout_calls: AtomicUsize::new(0),
            seen_auth: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/auth", post(stub_login))
            .route("/auth/refresh", get(stub_refresh))
            .route("/auth/logout", post(stub_logout))
            .route("/notes", get(stub_notes))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind stub listener");
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(axum::serve(listener, app).into_future());

        Self {
            state,
            base_url: format!("http://127.0.0.1:{}", port),
        }
    }
}

pub fn session_config(base_url: &str) -> SessionConfig {
    let mut config = SessionConfig::new(base_url);
    config.logout_grace_ms = 50;
    config.request_timeout_secs = 2;
    config
}

pub fn controller(base_url: &str, persist: bool) -> SessionController {
    SessionController::with_persist_store(
        &session_config(base_url),
        Arc::new(MemoryPersistStore::new(persist)),
    )
    .expect("Failed to build controller")
}

pub fn controller_with_jar(
    base_url: &str,
    persist: bool,
    jar: Arc<reqwest::cookie::Jar>,
) -> SessionController {
    let config = session_config(base_url);
    let client = AuthClient::with_jar(&config, jar).expect("Failed to build client");
    SessionController::from_parts(
        client,
        Arc::new(MemoryPersistStore::new(persist)),
        config.logout_grace(),
    )
}

/// A port nothing listens on.
pub async fn dead_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}
