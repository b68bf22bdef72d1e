use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Base URL of the notes API, e.g. `http://localhost:3500`.
    pub base_url: String,
    /// Directory holding durable client preferences.
    #[serde(default = "default_persist_dir")]
    pub persist_dir: PathBuf,
    /// Delay between clearing the session on logout and the cache reset broadcast.
    #[serde(default = "default_logout_grace_ms")]
    pub logout_grace_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_persist_dir() -> PathBuf {
    PathBuf::from(".notes-session")
}

fn default_logout_grace_ms() -> u64 {
    1000
}

fn default_request_timeout_secs() -> u64 {
    10
}

impl SessionConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            persist_dir: default_persist_dir(),
            logout_grace_ms: default_logout_grace_ms(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }

    pub fn logout_grace(&self) -> Duration {
        Duration::from_millis(self.logout_grace_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Load from an optional `session.*` file overridden by `SESSION_*`
/// environment variables (e.g. `SESSION_BASE_URL`).
pub fn get_configuration() -> Result<SessionConfig, config::ConfigError> {
    dotenvy::dotenv().ok();

    let settings = config::Config::builder()
        .add_source(config::File::with_name("session").required(false))
        .add_source(
            config::Environment::with_prefix("SESSION")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize::<SessionConfig>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_one_second_grace_and_ten_second_timeout() {
        let config = SessionConfig::new("http://localhost:3500");
        assert_eq!(config.logout_grace(), Duration::from_secs(1));
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
    }
}
