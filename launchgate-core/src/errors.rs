use thiserror::Error;

/// Result type used across the LaunchGate core crate.
pub type Result<T> = std::result::Result<T, LaunchGateError>;

/// Canonical error representation shared by the LaunchGate crates.
#[derive(Debug, Error)]
pub enum LaunchGateError {
    #[error("database error: {0}")]
    DatabaseError(String),

    #[error("migration error: {0}")]
    MigrationError(String),

    #[error("record not found: {0}")]
    NotFound(String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("general error: {0}")]
    GeneralError(String),
}

impl From<sqlx::Error> for LaunchGateError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => LaunchGateError::NotFound("row not found".into()),
            other => LaunchGateError::DatabaseError(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for LaunchGateError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        LaunchGateError::MigrationError(err.to_string())
    }
}

/// Dedicated configuration error used by the configuration loaders.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable is missing: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {key}: {source}")]
    InvalidEnvVar {
        key: &'static str,
        #[source]
        source: std::env::VarError,
    },

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ConfigError> for LaunchGateError {
    fn from(value: ConfigError) -> Self {
        LaunchGateError::ConfigError(value.to_string())
    }
}
