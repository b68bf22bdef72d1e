use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;

use crate::error::SessionError;

#[derive(Debug, Clone, Deserialize)]
pub struct UserInfo {
    pub username: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccessClaims {
    #[serde(rename = "UserInfo")]
    pub user_info: UserInfo,
}

/// Read the access token payload without checking the signature.
///
/// The result only drives what the UI shows; the server verifies the token on
/// every protected call.
pub fn decode_access_claims(token: &str) -> Result<AccessClaims, SessionError> {
    let parts: Vec<&str> = token.split('.').collect();

    if parts.len() != 3 {
        return Err(SessionError::Decode("expected three segments".to_string()));
    }

    let payload = general_purpose::URL_SAFE_NO_PAD
        .decode(parts[1])
        .map_err(|e| SessionError::Decode(format!("payload is not base64url: {}", e)))?;

    serde_json::from_slice(&payload)
        .map_err(|e| SessionError::Decode(format!("unexpected claims: {}", e)))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Unsigned token with the given payload, good enough for decoding.
    pub(crate) fn token_with(username: &str, roles: &[&str]) -> String {
        let header = general_purpose::URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = serde_json::json!({
            "UserInfo": { "username": username, "roles": roles },
            "iat": 1_700_000_000,
            "exp": 4_000_000_000i64,
        });
        let payload = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());
        format!("{}.{}.signature", header, payload)
    }

    #[test]
    fn decodes_user_info() {
        let claims = decode_access_claims(&token_with("alice", &["Employee", "Admin"])).unwrap();
        assert_eq!(claims.user_info.username, "alice");
        assert_eq!(claims.user_info.roles, vec!["Employee", "Admin"]);
    }

    #[test]
    fn rejects_wrong_segment_count() {
        assert!(matches!(
            decode_access_claims("only.two"),
            Err(SessionError::Decode(_))
        ));
    }

    #[test]
    fn rejects_foreign_payload() {
        let payload = general_purpose::URL_SAFE_NO_PAD.encode(br#"{"sub":"x"}"#);
        let token = format!("h.{}.s", payload);
        assert!(decode_access_claims(&token).is_err());
    }
}
