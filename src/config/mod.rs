mod parser;

use crate::constants::{
    DEFAULT_ACCESS_TOKEN_EXPIRES, DEFAULT_CLEANUP_INTERVAL, DEFAULT_DATABASE_PATH,
    DEFAULT_DATASETS_DIR, DEFAULT_PORT, DEFAULT_RESULT_EXPIRES, DEFAULT_WORKERS,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

pub use parser::load_config;

/// Environment variable overriding `auth.secret_key`
pub const SECRET_KEY_ENV: &str = "ANYFORECAST_SECRET_KEY";
/// Environment variable overriding the SQLite result backend path
pub const DATABASE_PATH_ENV: &str = "DATABASE_PATH";

/// Main configuration structure of the service
#[derive(Debug, Deserialize, Default, Clone)]
pub struct AppConfig {
    /// HTTP listener settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Token signing and user accounts
    #[serde(default)]
    pub auth: AuthConfig,
    /// Worker pool and result storage
    #[serde(default)]
    pub broker: BrokerConfig,
    /// Dataset location and training entry points
    #[serde(default)]
    pub training: TrainingConfig,
}

impl AppConfig {
    /// Applies the environment overrides on top of the file values
    pub fn apply_env(&mut self) {
        if let Ok(secret) = std::env::var(SECRET_KEY_ENV) {
            self.auth.secret_key = secret;
        }
        if let Ok(path) = std::env::var(DATABASE_PATH_ENV) {
            if let ResultBackendConfig::Sqlite { path: current } = &mut self.broker.result_backend
            {
                *current = path;
            }
        }
    }
}

/// HTTP listener settings
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Interface to bind
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Token signing and user accounts
#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// HMAC secret used to sign access tokens
    #[serde(default)]
    pub secret_key: String,
    /// Lifetime of issued access tokens
    #[serde(
        default = "default_access_token_expires",
        deserialize_with = "duration::deserialize"
    )]
    pub access_token_expires: Duration,
    /// Accounts allowed to log in
    #[serde(default)]
    pub users: Vec<UserRecord>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            access_token_expires: DEFAULT_ACCESS_TOKEN_EXPIRES,
            users: Vec::new(),
        }
    }
}

/// Stored account
#[derive(Debug, Deserialize, Clone)]
pub struct UserRecord {
    pub username: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Hex encoded SHA-256 digest of the password
    pub hashed_password: String,
    /// Disabled accounts may log in but cannot use the API
    #[serde(default)]
    pub disabled: bool,
}

/// Worker pool and result storage
#[derive(Debug, Deserialize, Clone)]
pub struct BrokerConfig {
    /// Number of concurrent workers
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// How long finished results are kept, `null` keeps them forever
    #[serde(
        default = "default_result_expires",
        deserialize_with = "duration::deserialize_option"
    )]
    pub result_expires: Option<Duration>,
    /// Period of the expired results sweep
    #[serde(
        default = "default_cleanup_interval",
        deserialize_with = "duration::deserialize"
    )]
    pub cleanup_interval: Duration,
    /// Where submission states are stored
    #[serde(default)]
    pub result_backend: ResultBackendConfig,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            result_expires: default_result_expires(),
            cleanup_interval: default_cleanup_interval(),
            result_backend: ResultBackendConfig::default(),
        }
    }
}

/// Result backend selection
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ResultBackendConfig {
    /// Results live in the process and vanish with it
    Memory,
    /// Results are stored in a SQLite file
    Sqlite {
        #[serde(default = "default_database_path")]
        path: String,
    },
}

impl Default for ResultBackendConfig {
    fn default() -> Self {
        ResultBackendConfig::Sqlite {
            path: default_database_path(),
        }
    }
}

/// Dataset location and training entry points
#[derive(Debug, Deserialize, Clone)]
pub struct TrainingConfig {
    /// Root directory, datasets are read from `<datasets_dir>/<user>/<name>.csv`
    #[serde(default = "default_datasets_dir")]
    pub datasets_dir: PathBuf,
    /// Training entry points by trainer name
    #[serde(default)]
    pub trainers: HashMap<String, TrainerEntry>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            datasets_dir: default_datasets_dir(),
            trainers: HashMap::new(),
        }
    }
}

/// External command training one kind of forecaster
#[derive(Debug, Deserialize, Clone)]
pub struct TrainerEntry {
    /// Program and leading arguments, training options are appended
    pub command: Vec<String>,
    /// Directory the command runs in
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_access_token_expires() -> Duration {
    DEFAULT_ACCESS_TOKEN_EXPIRES
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

fn default_result_expires() -> Option<Duration> {
    Some(DEFAULT_RESULT_EXPIRES)
}

fn default_cleanup_interval() -> Duration {
    DEFAULT_CLEANUP_INTERVAL
}

fn default_database_path() -> String {
    DEFAULT_DATABASE_PATH.to_string()
}

fn default_datasets_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DATASETS_DIR)
}

/// Human readable durations such as `30m` or `1day`
mod duration {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }

    pub fn deserialize_option<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|s| humantime::parse_duration(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_overrides_secret_and_database_path() {
        std::env::set_var(SECRET_KEY_ENV, "from-env");
        std::env::set_var(DATABASE_PATH_ENV, "/tmp/override.db");

        let mut config = AppConfig::default();
        config.auth.secret_key = "from-file".to_string();
        config.apply_env();
        assert_eq!(config.auth.secret_key, "from-env");
        assert_eq!(
            config.broker.result_backend,
            ResultBackendConfig::Sqlite {
                path: "/tmp/override.db".to_string()
            }
        );

        let mut config = AppConfig::default();
        config.broker.result_backend = ResultBackendConfig::Memory;
        config.apply_env();
        assert_eq!(config.broker.result_backend, ResultBackendConfig::Memory);

        std::env::remove_var(SECRET_KEY_ENV);
        std::env::remove_var(DATABASE_PATH_ENV);

        let mut config = AppConfig::default();
        config.auth.secret_key = "from-file".to_string();
        config.apply_env();
        assert_eq!(config.auth.secret_key, "from-file");
        assert_eq!(config.broker.result_backend, ResultBackendConfig::default());
    }
}
