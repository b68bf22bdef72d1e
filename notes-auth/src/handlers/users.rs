use axum::{extract::State, Json};
use service_core::error::AppError;

use crate::{middleware::AuthUser, models::UserResponse, services::ServiceError, AppState};

/// GET /users: every user, without password hashes.
pub async fn list_users(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let users = state.users.list().await?;

    if users.is_empty() {
        return Err(ServiceError::NoUsersFound.into());
    }

    tracing::debug!(requested_by = %user.username, count = users.len(), "Listing users");
    Ok(Json(users.iter().map(|u| u.sanitized()).collect()))
}
