use reqwest::StatusCode;
use thiserror::Error;

/// Everything a session operation can surface to the caller.
#[derive(Debug, Error)]
pub enum SessionError {
    /// 400: the login form was incomplete.
    #[error("Missing username or password")]
    MissingFields,

    /// 401: there is no session at all; the user has never logged in here.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// 403 from renewal: the refresh cookie is stale or invalid.
    #[error("Your login has expired")]
    LoginExpired,

    /// The server could not be reached or did not answer.
    #[error("No server response")]
    NoServerResponse(#[source] reqwest::Error),

    #[error("Request failed with status {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("Malformed access token: {0}")]
    Decode(String),

    #[error("Local storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

impl SessionError {
    /// True when the user needs to log in again, as opposed to a transient failure.
    pub fn requires_login(&self) -> bool {
        matches!(self, SessionError::Unauthorized(_) | SessionError::LoginExpired)
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            SessionError::MissingFields => Some(StatusCode::BAD_REQUEST),
            SessionError::Unauthorized(_) => Some(StatusCode::UNAUTHORIZED),
            SessionError::LoginExpired => Some(StatusCode::FORBIDDEN),
            SessionError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expired_and_never_logged_in_read_differently() {
        let expired = SessionError::LoginExpired.to_string();
        let never = SessionError::Unauthorized("Unauthorized".to_string()).to_string();
        assert_ne!(expired, never);
        assert!(SessionError::LoginExpired.requires_login());
    }

    #[test]
    fn server_status_is_not_a_login_problem() {
        let err = SessionError::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "boom".to_string(),
        };
        assert!(!err.requires_login());
        assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    }
}
