use thiserror::Error;

/// Result type used across the brewhouse core crate.
pub type Result<T> = std::result::Result<T, BrewhouseError>;

/// Canonical error representation shared by all crates.
#[derive(Debug, Error)]
pub enum BrewhouseError {
    #[error("deserialization error: {0}")]
    DeserializationError(String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("transport error: {0}")]
    TransportError(String),

    #[error("general error: {0}")]
    GeneralError(String),
}

impl From<serde_json::Error> for BrewhouseError {
    fn from(err: serde_json::Error) -> Self {
        BrewhouseError::DeserializationError(err.to_string())
    }
}

impl From<anyhow::Error> for BrewhouseError {
    fn from(err: anyhow::Error) -> Self {
        BrewhouseError::GeneralError(err.to_string())
    }
}

/// Dedicated configuration error used by the configuration module.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {key}: {reason}")]
    InvalidEnvVar { key: String, reason: String },
}

impl From<ConfigError> for BrewhouseError {
    fn from(value: ConfigError) -> Self {
        BrewhouseError::ConfigError(value.to_string())
    }
}
