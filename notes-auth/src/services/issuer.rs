//! Token issuer: login, renewal and revocation of the refresh cookie.

use std::sync::Arc;

use crate::services::{JwtService, ServiceError, UserRepository};
use crate::utils::{verify_password, Password, PasswordHashString};

/// Both credentials minted by a successful login.
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub access_token: String,
    pub refresh_token: String,
}

/// Outcome of a logout request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Revocation {
    /// No refresh cookie was sent; there is nothing to clear.
    NothingToClear,
    /// The caller must be told to drop its refresh cookie.
    ClearCookie,
}

#[derive(Clone)]
pub struct TokenIssuer {
    users: Arc<dyn UserRepository>,
    jwt: JwtService,
}

impl TokenIssuer {
    pub fn new(users: Arc<dyn UserRepository>, jwt: JwtService) -> Self {
        Self { users, jwt }
    }

    pub fn jwt(&self) -> &JwtService {
        &self.jwt
    }

    pub async fn authenticate(
        &self,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<IssuedTokens, ServiceError> {
        let (username, password) = match (username, password) {
            (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => (u, p),
            _ => return Err(ServiceError::MissingFields),
        };

        let user = match self.users.find_by_username(username).await? {
            Some(user) if user.active => user,
            Some(_) => {
                tracing::info!(username = %username, "Login rejected for inactive user");
                return Err(ServiceError::InvalidCredentials);
            }
            None => {
                tracing::info!(username = %username, "Login rejected for unknown user");
                return Err(ServiceError::InvalidCredentials);
            }
        };

        // Argon2 is deliberately slow; keep it off the async workers.
        let password = Password::new(password.to_string());
        let hash = PasswordHashString::new(user.password_hash.clone());
        let matches = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| anyhow::anyhow!("Password verification task failed: {}", e))??;

        if !matches {
            tracing::info!(username = %username, "Login rejected for wrong password");
            return Err(ServiceError::InvalidCredentials);
        }

        let access_token = self
            .jwt
            .generate_access_token(&user.username, user.role_names())?;
        let refresh_token = self.jwt.generate_refresh_token(&user.username)?;

        tracing::info!(username = %user.username, "User logged in");

        Ok(IssuedTokens {
            access_token,
            refresh_token,
        })
    }

    /// Mint a new access token from the refresh cookie. The refresh token
    /// itself is left untouched and stays valid until it expires.
    pub async fn renew(&self, refresh_token: Option<&str>) -> Result<String, ServiceError> {
        let refresh_token = refresh_token
            .filter(|t| !t.is_empty())
            .ok_or(ServiceError::Unauthenticated)?;

        let claims = self.jwt.validate_refresh_token(refresh_token).map_err(|e| {
            tracing::info!(error = %e, "Refresh token rejected");
            ServiceError::Forbidden
        })?;

        let user = self
            .users
            .find_by_username(&claims.username)
            .await?
            .ok_or_else(|| {
                tracing::info!(username = %claims.username, "Refresh token names an unknown user");
                ServiceError::Forbidden
            })?;

        let access_token = self
            .jwt
            .generate_access_token(&user.username, user.role_names())?;

        tracing::debug!(username = %user.username, "Access token renewed");
        Ok(access_token)
    }

    /// Logout is stateless: the refresh token is never recorded server-side,
    /// so revoking it means instructing the client to drop the cookie.
    pub fn revoke(&self, refresh_token: Option<&str>) -> Revocation {
        match refresh_token {
            Some(_) => Revocation::ClearCookie,
            None => Revocation::NothingToClear,
        }
    }
}
