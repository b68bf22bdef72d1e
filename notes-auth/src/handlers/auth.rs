use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use service_core::error::AppError;

use crate::{
    dtos::auth::{LoginRequest, MessageResponse, TokenResponse},
    services::Revocation,
    AppState,
};

/// Name of the cookie carrying the refresh token.
pub const REFRESH_COOKIE: &str = "jwt";

/// The attribute set shared by the issuing and the clearing cookie; browsers
/// only drop a cookie when these match.
fn refresh_cookie(state: &AppState, value: String) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE, value))
        .path("/")
        .http_only(true)
        .secure(state.config.cookie.secure)
        .same_site(SameSite::None)
        .build()
}

/// POST /auth
///
/// A missing or unparsable body counts as missing fields, not a 415/422.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Option<Json<LoginRequest>>,
) -> Result<(CookieJar, Json<TokenResponse>), AppError> {
    let req = payload.map(|Json(req)| req).unwrap_or_default();
    let tokens = state
        .issuer
        .authenticate(req.username.as_deref(), req.password.as_deref())
        .await?;

    let max_age = time::Duration::seconds(state.issuer.jwt().refresh_token_expiry_seconds());
    let mut cookie = refresh_cookie(&state, tokens.refresh_token);
    cookie.set_max_age(max_age);
    let jar = jar.add(cookie);

    Ok((
        jar,
        Json(TokenResponse {
            access_token: tokens.access_token,
        }),
    ))
}

/// GET /auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<TokenResponse>, AppError> {
    let refresh_token = jar.get(REFRESH_COOKIE).map(|c| c.value().to_string());

    let access_token = state.issuer.renew(refresh_token.as_deref()).await?;

    Ok(Json(TokenResponse { access_token }))
}

/// POST /auth/logout
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> Response {
    let refresh_token = jar.get(REFRESH_COOKIE).map(|c| c.value().to_string());

    match state.issuer.revoke(refresh_token.as_deref()) {
        Revocation::NothingToClear => StatusCode::NO_CONTENT.into_response(),
        Revocation::ClearCookie => {
            let jar = jar.remove(refresh_cookie(&state, String::new()));
            tracing::info!("Refresh cookie cleared");
            (
                jar,
                Json(MessageResponse {
                    message: "Cookie cleared".to_string(),
                }),
            )
                .into_response()
        }
    }
}
