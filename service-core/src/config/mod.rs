use crate::error::AppError;
use config::{Config as Cfg, File};
use serde::{Deserialize, de::DeserializeOwned};

/// Settings every service shares.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_port() -> u16 {
    3500
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        load_layered("configuration", "APP")
    }
}

/// Load a settings tree from an optional `<file_name>.{yaml,toml,json}` file,
/// overridden by `<PREFIX>_SECTION__KEY` environment variables.
///
/// `.env` is read first so local overrides behave like real environment variables.
pub fn load_layered<T: DeserializeOwned>(file_name: &str, env_prefix: &str) -> Result<T, AppError> {
    dotenvy::dotenv().ok();

    let settings = Cfg::builder()
        .add_source(File::with_name(file_name).required(false))
        .add_source(
            config::Environment::with_prefix(env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}
