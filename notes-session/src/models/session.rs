use std::fmt;

use serde::Serialize;

use crate::error::SessionError;
use crate::utils::decode_access_claims;

/// Short-lived access token held in memory only.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken([REDACTED])")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub username: String,
    pub roles: Vec<String>,
    pub status: String,
    pub is_manager: bool,
    pub is_admin: bool,
}

impl Identity {
    pub fn from_token(token: &BearerToken) -> Result<Self, SessionError> {
        let claims = decode_access_claims(token.as_str())?;
        Ok(Self::from_roles(claims.user_info.username, claims.user_info.roles))
    }

    /// Admin outranks Manager, which outranks Employee.
    pub fn from_roles(username: String, roles: Vec<String>) -> Self {
        let is_manager = roles.iter().any(|r| r == "Manager");
        let is_admin = roles.iter().any(|r| r == "Admin");

        let status = if is_admin {
            "Admin"
        } else if is_manager {
            "Manager"
        } else {
            "Employee"
        };

        Self {
            username,
            roles,
            status: status.to_string(),
            is_manager,
            is_admin,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionPhase {
    NoSession,
    Renewing,
    Active,
    RenewFailed,
}

#[derive(Debug, Clone)]
pub struct SessionState {
    pub phase: SessionPhase,
    pub token: Option<BearerToken>,
    pub identity: Option<Identity>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            phase: SessionPhase::NoSession,
            token: None,
            identity: None,
        }
    }
}

/// Broadcast to anything holding session-scoped data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// The credential was dropped.
    LoggedOut,
    /// Emitted after the logout grace delay; caches should clear now.
    Reset,
}
