use service_core::error::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("All fields are required")]
    MissingFields,

    /// Unknown user, inactive user or wrong password. Deliberately indistinguishable.
    #[error("Unauthorized")]
    InvalidCredentials,

    /// No refresh cookie was presented.
    #[error("Unauthorized")]
    Unauthenticated,

    /// Refresh token failed verification or its user is gone.
    #[error("Forbidden")]
    Forbidden,

    /// Access token failed signature or expiry checks.
    #[error("Forbidden")]
    ExpiredOrInvalidToken,

    #[error("Duplicate username")]
    DuplicateUsername,

    #[error("No users found")]
    NoUsersFound,

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::MissingFields | ServiceError::NoUsersFound => {
                AppError::BadRequest(anyhow::anyhow!(err.to_string()))
            }
            ServiceError::InvalidCredentials | ServiceError::Unauthenticated => {
                AppError::Unauthorized(anyhow::anyhow!(err.to_string()))
            }
            ServiceError::Forbidden | ServiceError::ExpiredOrInvalidToken => {
                AppError::Forbidden(anyhow::anyhow!(err.to_string()))
            }
            ServiceError::DuplicateUsername => AppError::Conflict(anyhow::anyhow!(err.to_string())),
            ServiceError::Database(e) => AppError::DatabaseError(anyhow::Error::new(e)),
            ServiceError::Internal(e) => AppError::InternalError(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use service_core::axum::http::StatusCode;

    #[test]
    fn maps_to_protocol_statuses() {
        let cases = [
            (ServiceError::MissingFields, StatusCode::BAD_REQUEST),
            (ServiceError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (ServiceError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (ServiceError::Forbidden, StatusCode::FORBIDDEN),
            (ServiceError::ExpiredOrInvalidToken, StatusCode::FORBIDDEN),
            (ServiceError::DuplicateUsername, StatusCode::CONFLICT),
        ];

        for (err, status) in cases {
            assert_eq!(AppError::from(err).status(), status);
        }
    }

    #[test]
    fn credential_failures_share_one_message() {
        assert_eq!(ServiceError::InvalidCredentials.to_string(), "Unauthorized");
        assert_eq!(ServiceError::Unauthenticated.to_string(), "Unauthorized");
    }
}
