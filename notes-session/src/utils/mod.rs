pub mod jwt;

pub use jwt::{decode_access_claims, AccessClaims, UserInfo};
