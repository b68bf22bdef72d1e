use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use service_core::error::AppError;

use crate::{services::ServiceError, AppState};

/// Caller identity taken from a verified access token.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub username: String,
    pub roles: Vec<String>,
}

/// Require `Authorization: Bearer <access token>`.
///
/// A missing or malformed header is 401; a token that fails verification is
/// 403, which is what tells clients to renew and retry.
pub async fn verify_jwt(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(ServiceError::Unauthenticated)?;

    let claims = state
        .issuer
        .jwt()
        .validate_access_token(token)
        .map_err(|e| {
            tracing::debug!(error = %e, "Access token rejected");
            ServiceError::ExpiredOrInvalidToken
        })?;

    req.extensions_mut().insert(AuthUser {
        username: claims.user_info.username,
        roles: claims.user_info.roles,
    });

    Ok(next.run(req).await)
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| {
                AppError::InternalError(anyhow::anyhow!(
                    "Auth claims missing from request extensions"
                ))
            })
    }
}
