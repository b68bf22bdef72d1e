use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

/// A protected API call described independently of the credential, so the
/// guarded wrapper can rebuild it after a renewal.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            body: None,
        }
    }

    pub fn post<T: Serialize>(path: impl Into<String>, body: &T) -> Result<Self, serde_json::Error> {
        Ok(Self {
            method: Method::POST,
            path: path.into(),
            body: Some(serde_json::to_value(body)?),
        })
    }
}
