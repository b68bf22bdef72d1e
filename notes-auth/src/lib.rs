pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;
pub mod utils;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use service_core::middleware::{
    rate_limit::{login_rate_limit_middleware, LoginRateLimit},
    tracing::request_id_middleware,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::AuthConfig;
use crate::services::{JwtService, TokenIssuer, UserRepository};

pub use service_core::observability::init_tracing;

#[derive(Clone)]
pub struct AppState {
    pub config: AuthConfig,
    pub issuer: TokenIssuer,
    pub users: Arc<dyn UserRepository>,
    pub login_rate_limit: LoginRateLimit,
}

impl AppState {
    pub fn new(config: AuthConfig, users: Arc<dyn UserRepository>) -> Self {
        let jwt = JwtService::new(&config.jwt);
        let login_rate_limit = LoginRateLimit::new(
            config.rate_limit.login_attempts,
            config.rate_limit.login_window_seconds,
        )
        .trust_forwarded_for(config.rate_limit.trust_forwarded_for);

        Self {
            issuer: TokenIssuer::new(users.clone(), jwt),
            users,
            login_rate_limit,
            config,
        }
    }
}

fn cors_layer(config: &AuthConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors
        .origins()
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/users", get(handlers::list_users))
        .route_layer(from_fn_with_state(state.clone(), middleware::verify_jwt));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route(
            "/auth",
            post(handlers::login).layer(from_fn_with_state(
                state.login_rate_limit.clone(),
                login_rate_limit_middleware,
            )),
        )
        .route("/auth/refresh", get(handlers::refresh))
        .route("/auth/logout", post(handlers::logout))
        .merge(protected)
        .fallback(handlers::not_found)
        .layer(cors_layer(&state.config))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(service_core::middleware::tracing::REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}
