//! Services layer: credential signing, user storage and the token issuer.

mod database;
pub mod error;
mod issuer;
mod jwt;

pub use database::{InMemoryUserRepository, MongoUserRepository, UserRepository};
pub use error::ServiceError;
pub use issuer::{IssuedTokens, Revocation, TokenIssuer};
pub use jwt::{AccessTokenClaims, JwtService, RefreshTokenClaims, UserInfo};
