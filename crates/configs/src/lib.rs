//! # configs
//!
//! Layered runtime settings: built-in defaults, then an optional
//! `config/myaccess.{toml,yaml,json}` file, then `MYACCESS__*` environment
//! variables (a `.env` file is loaded first when present).
//!
//! `MYACCESS__SERVER__PORT=9000` overrides `server.port`.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use log::debug;
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

pub const ENV_PREFIX: &str = "MYACCESS";
pub const CONFIG_FILE: &str = "config/myaccess";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub store: StoreSettings,
    pub media: MediaSettings,
    pub auth: AuthSettings,
    pub places: PlaceSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreSettings {
    pub backend: StoreBackend,
    pub database_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaSettings {
    pub root: String,
    pub url_prefix: String,
}

#[derive(Debug, Deserialize)]
pub struct AuthSettings {
    pub secret: SecretString,
}

/// How place mutations reach the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteStrategySetting {
    Atomic,
    Optimistic,
    LastWriterWins,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaceSettings {
    pub write_strategy: WriteStrategySetting,
    pub max_attempts: u32,
}

impl Settings {
    /// Defaults only. Callers layer further sources on top.
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Ok(Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("store.backend", "sqlite")?
            .set_default("store.database_url", "sqlite:myaccess.db")?
            .set_default("media.root", "./data/uploads")?
            .set_default("media.url_prefix", "/static/uploads")?
            .set_default("auth.secret", "dev-secret-change-me")?
            .set_default("places.write_strategy", "atomic")?
            .set_default("places.max_attempts", 5)?)
    }

    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!("Loaded environment from {}", path.display());
        }
        let builder = Self::defaults()?
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );
        Self::from_builder(builder)
    }

    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.places.max_attempts == 0 {
            return Err(ConfigError::Invalid("places.max_attempts must be at least 1".into()));
        }
        if self.store.backend == StoreBackend::Sqlite && self.store.database_url.trim().is_empty() {
            return Err(ConfigError::Invalid("store.database_url is required for the sqlite backend".into()));
        }
        Ok(())
    }
}
