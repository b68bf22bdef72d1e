use secrecy::Secret;
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    #[serde(default = "default_service_name")]
    pub service_name: String,
    pub mongodb: MongoConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub cookie: CookieConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    pub uri: String,
    #[serde(default = "default_database")]
    pub database: String,
}

/// Signing material and lifetimes for both credentials.
///
/// The two secrets must differ: a refresh token must never verify as an
/// access token and vice versa.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub access_secret: Secret<String>,
    pub refresh_secret: Secret<String>,
    #[serde(default = "default_access_expiry")]
    pub access_token_expiry_minutes: i64,
    #[serde(default = "default_refresh_expiry")]
    pub refresh_token_expiry_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CookieConfig {
    /// Only disable for plain-http local development.
    #[serde(default = "default_true")]
    pub secure: bool,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self { secure: true }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct CorsConfig {
    /// Comma-separated list of origins allowed to send credentials.
    #[serde(default)]
    pub allowed_origins: String,
}

impl CorsConfig {
    pub fn origins(&self) -> Vec<String> {
        self.allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_login_attempts")]
    pub login_attempts: u32,
    #[serde(default = "default_login_window")]
    pub login_window_seconds: u64,
    /// Honour `x-forwarded-for` when keying the login limiter. Enable only
    /// behind a reverse proxy that sets the header.
    #[serde(default)]
    pub trust_forwarded_for: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            login_attempts: default_login_attempts(),
            login_window_seconds: default_login_window(),
            trust_forwarded_for: false,
        }
    }
}

fn default_service_name() -> String {
    "notes-auth".to_string()
}

fn default_database() -> String {
    "notes".to_string()
}

fn default_access_expiry() -> i64 {
    15
}

fn default_refresh_expiry() -> i64 {
    7
}

fn default_true() -> bool {
    true
}

fn default_login_attempts() -> u32 {
    5
}

fn default_login_window() -> u64 {
    60
}

impl AuthConfig {
    /// Load from `configuration.*` and `APP_*` environment variables,
    /// e.g. `APP_JWT__ACCESS_SECRET`, `APP_MONGODB__URI`.
    pub fn load() -> Result<Self, AppError> {
        let config: AuthConfig = core_config::load_layered("configuration", "APP")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        use secrecy::ExposeSecret;

        let access = self.jwt.access_secret.expose_secret();
        let refresh = self.jwt.refresh_secret.expose_secret();

        if access.is_empty() || refresh.is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "jwt.access_secret and jwt.refresh_secret must be set"
            )));
        }
        if access == refresh {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "jwt.access_secret and jwt.refresh_secret must differ"
            )));
        }
        if self.jwt.access_token_expiry_minutes <= 0 || self.jwt.refresh_token_expiry_days <= 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "token lifetimes must be positive"
            )));
        }
        Ok(())
    }
}
