use reqwest::{cookie::Jar, Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::models::{ApiRequest, BearerToken};

#[derive(Serialize)]
struct LoginBody<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenBody {
    access_token: String,
}

#[derive(Deserialize)]
struct MessageBody {
    message: String,
}

/// HTTP side of the session: the three auth endpoints plus raw protected calls.
///
/// The refresh cookie lives in the client's cookie jar and is never read here.
pub struct AuthClient {
    client: Client,
    base_url: String,
}

impl AuthClient {
    pub fn new(config: &SessionConfig) -> Result<Self, SessionError> {
        Self::with_jar(config, Arc::new(Jar::default()))
    }

    pub fn with_jar(config: &SessionConfig, jar: Arc<Jar>) -> Result<Self, SessionError> {
        let client = Client::builder()
            .cookie_provider(jar)
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<BearerToken, SessionError> {
        let url = self.url("/auth");
        let response = self
            .client
            .post(&url)
            .json(&LoginBody { username, password })
            .send()
            .await
            .map_err(|e| no_response(&url, e))?;

        match response.status() {
            StatusCode::OK => read_token(response).await,
            StatusCode::BAD_REQUEST => Err(SessionError::MissingFields),
            StatusCode::UNAUTHORIZED => Err(SessionError::Unauthorized(message_of(response).await)),
            _ => Err(status_error(response).await),
        }
    }

    /// Ask for a new access token using the refresh cookie.
    pub async fn refresh(&self) -> Result<BearerToken, SessionError> {
        let url = self.url("/auth/refresh");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| no_response(&url, e))?;

        match response.status() {
            StatusCode::OK => read_token(response).await,
            StatusCode::UNAUTHORIZED => Err(SessionError::Unauthorized(message_of(response).await)),
            StatusCode::FORBIDDEN => Err(SessionError::LoginExpired),
            _ => Err(status_error(response).await),
        }
    }

    /// 200 and 204 both count as success; the server clears the cookie itself.
    pub async fn logout(&self) -> Result<(), SessionError> {
        let url = self.url("/auth/logout");
        let response = self
            .client
            .post(&url)
            .send()
            .await
            .map_err(|e| no_response(&url, e))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(status_error(response).await)
        }
    }

    pub async fn execute(
        &self,
        request: &ApiRequest,
        token: Option<&BearerToken>,
    ) -> Result<Response, SessionError> {
        let url = self.url(&request.path);
        let mut builder = self.client.request(request.method.clone(), &url);

        if let Some(token) = token {
            builder = builder.bearer_auth(token.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        builder.send().await.map_err(|e| no_response(&url, e))
    }
}

fn no_response(url: &str, e: reqwest::Error) -> SessionError {
    tracing::error!(url = %url, error = %e, "No response from server");
    SessionError::NoServerResponse(e)
}

async fn read_token(response: Response) -> Result<BearerToken, SessionError> {
    let body: TokenBody = response.json().await?;
    Ok(BearerToken::new(body.access_token))
}

async fn message_of(response: Response) -> String {
    let status = response.status();
    match response.json::<MessageBody>().await {
        Ok(body) => body.message,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string(),
    }
}

/// Map a non-success response to the error the caller sees.
pub(crate) async fn status_error(response: Response) -> SessionError {
    let status = response.status();
    let message = message_of(response).await;

    if status == StatusCode::UNAUTHORIZED {
        SessionError::Unauthorized(message)
    } else {
        SessionError::Status { status, message }
    }
}
