use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::errors::ConfigError;

const DEFAULT_DATABASE_URL: &str = "sqlite://launchgate.db";
const DEFAULT_HTTP_BIND: &str = "0.0.0.0:7389";

/// Runtime environment used by the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    fn from_str(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "staging" | "stage" => Environment::Staging,
            _ => Environment::Development,
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::Development
    }
}

/// Process-wide configuration shared by the LaunchGate binaries.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    pub database_url: String,
    pub environment: Environment,
    pub http_bind: String,
    /// When set, rules are served from this file or directory instead of the database.
    pub rules_path: Option<PathBuf>,
}

impl CoreConfig {
    /// Loads configuration from `LAUNCHGATE_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_env_with_prefix("LAUNCHGATE_")
    }

    /// Loads configuration from env vars prefixed with the provided value.
    pub fn from_env_with_prefix(prefix: &str) -> Result<Self, ConfigError> {
        let key = |suffix: &str| format!("{}{}", prefix, suffix);

        let database_url = read_string(&key("DATABASE_URL"))?
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let environment = read_string(&key("ENV"))?
            .map(|raw| Environment::from_str(&raw))
            .unwrap_or_default();

        let http_bind =
            read_string(&key("HTTP_BIND"))?.unwrap_or_else(|| DEFAULT_HTTP_BIND.to_string());

        let rules_path = read_string(&key("RULES_PATH"))?.map(PathBuf::from);

        Ok(Self {
            database_url,
            environment,
            http_bind,
            rules_path,
        })
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    /// Whether the service is running in production.
    pub fn is_production(&self) -> bool {
        matches!(self.environment, Environment::Production)
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            environment: Environment::Development,
            http_bind: DEFAULT_HTTP_BIND.to_string(),
            rules_path: None,
        }
    }
}

/// Reads a variable, treating blank values as unset.
pub fn read_string(key: &str) -> Result<Option<String>, ConfigError> {
    match env::var(key) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                Ok(None)
            } else {
                Ok(Some(trimmed.to_string()))
            }
        }
        Err(env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(ConfigError::Internal(format!("invalid value for {key}: {err}"))),
    }
}

/// Parses a variable into `T`, falling back to `default` when unset or blank.
pub fn parse_env<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                Ok(default)
            } else {
                T::from_str(trimmed)
                    .map_err(|err| ConfigError::Internal(format!("invalid value for {key}: {err}")))
            }
        }
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(ConfigError::InvalidEnvVar { key, source: err }),
    }
}

/// Splits a comma separated variable into trimmed, non-empty entries.
pub fn read_list(key: &str) -> Result<Option<Vec<String>>, ConfigError> {
    Ok(read_string(key)?.map(|value| {
        value
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(str::to_string)
            .collect()
    }))
}
