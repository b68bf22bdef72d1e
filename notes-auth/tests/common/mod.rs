//! Shared setup for notes-auth integration tests.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, Response},
    Router,
};
use http_body_util::BodyExt;
use notes_auth::{
    build_router,
    config::{AuthConfig, CookieConfig, CorsConfig, JwtConfig, MongoConfig, RateLimitConfig},
    models::{Role, User},
    services::InMemoryUserRepository,
    utils::{hash_password, Password},
    AppState,
};
use secrecy::Secret;
use service_core::config::Config as CoreConfig;
use std::sync::Arc;

pub const ACCESS_SECRET: &str = "test-access-secret";
pub const REFRESH_SECRET: &str = "test-refresh-secret";

pub fn test_config() -> AuthConfig {
    AuthConfig {
        common: CoreConfig {
            port: 0,
            log_level: "error".to_string(),
        },
        service_name: "notes-auth-test".to_string(),
        mongodb: MongoConfig {
            uri: "mongodb://unused".to_string(),
            database: "unused".to_string(),
        },
        jwt: JwtConfig {
            access_secret: Secret::new(ACCESS_SECRET.to_string()),
            refresh_secret: Secret::new(REFRESH_SECRET.to_string()),
            access_token_expiry_minutes: 15,
            refresh_token_expiry_days: 7,
        },
        cookie: CookieConfig { secure: true },
        cors: CorsConfig {
            allowed_origins: "http://localhost:3000".to_string(),
        },
        rate_limit: RateLimitConfig {
            login_attempts: 100,
            login_window_seconds: 60,
            trust_forwarded_for: false,
        },
    }
}

/// alice/correct (Employee, Manager) and an inactive dave/pw.
pub fn seeded_users() -> Arc<InMemoryUserRepository> {
    let repo = InMemoryUserRepository::new()
        .with_user("alice", "correct", vec![Role::Employee, Role::Manager])
        .expect("Failed to seed alice");

    let hash = hash_password(&Password::new("pw".to_string())).expect("Failed to hash");
    let mut dave = User::new("dave".to_string(), hash.into_string(), vec![Role::Employee]);
    dave.active = false;
    repo.put(dave).expect("Failed to seed dave");

    Arc::new(repo)
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub users: Arc<InMemoryUserRepository>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: AuthConfig) -> Self {
        let users = seeded_users();
        let state = AppState::new(config, users.clone());
        Self {
            router: build_router(state.clone()),
            state,
            users,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        use tower::util::ServiceExt;
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    pub async fn login(&self, username: &str, password: &str) -> Response<Body> {
        self.send(login_request(serde_json::json!({
            "username": username,
            "password": password,
        })))
        .await
    }
}

pub fn login_request(body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/auth")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
}

/// The `Set-Cookie` header for the refresh cookie, if any.
pub fn refresh_set_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("jwt="))
        .map(str::to_string)
}

/// Value part of `jwt=<value>; ...`.
pub fn cookie_value(set_cookie: &str) -> String {
    set_cookie
        .split(';')
        .next()
        .and_then(|pair| pair.strip_prefix("jwt="))
        .unwrap_or_default()
        .to_string()
}
