use std::env;
use std::str::FromStr;

use url::Url;

use crate::errors::{BrewhouseError, ConfigError};

const DEFAULT_PREFIX: &str = "BREWHOUSE_";
const DEFAULT_SYNC_INTERVAL_SECS: u64 = 30;
const DEFAULT_DRIFT_THRESHOLD_SECS: u64 = 30;

/// Runtime environment used by the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
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

/// Settings shared by everything that talks to the session store.
#[derive(Debug, Clone)]
pub struct BrewhouseConfig {
    pub api_url: String,
    pub api_token: Option<String>,
    pub environment: Environment,
    pub sync_interval_secs: u64,
    pub drift_threshold_secs: u64,
}

impl BrewhouseConfig {
    /// Loads configuration from the process environment (`BREWHOUSE_*`).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_env_with_prefix(DEFAULT_PREFIX)
    }

    /// Loads configuration from env vars prefixed with the provided value (e.g. `STAGING_`).
    pub fn from_env_with_prefix(prefix: &str) -> Result<Self, ConfigError> {
        let key = |suffix: &str| format!("{}{}", prefix, suffix);

        let url_key = key("API_URL");
        let api_url = env::var(&url_key).map_err(|_| ConfigError::MissingEnvVar(url_key.clone()))?;
        Url::parse(&api_url).map_err(|err| ConfigError::InvalidEnvVar {
            key: url_key.clone(),
            reason: err.to_string(),
        })?;

        let api_token = env::var(key("API_TOKEN"))
            .ok()
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty());

        let environment = env::var(key("ENV"))
            .map(|raw| Environment::from_str(&raw))
            .unwrap_or_default();

        let sync_interval_secs =
            read_positive(&key("SYNC_INTERVAL_SECS"), DEFAULT_SYNC_INTERVAL_SECS)?;
        let drift_threshold_secs =
            read_positive(&key("DRIFT_THRESHOLD_SECS"), DEFAULT_DRIFT_THRESHOLD_SECS)?;

        Ok(Self {
            api_url,
            api_token,
            environment,
            sync_interval_secs,
            drift_threshold_secs,
        })
    }

    /// Base URL of the session store API.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Bearer token, if one is configured.
    pub fn api_token(&self) -> Option<&str> {
        self.api_token.as_deref()
    }

    /// Whether the process is running in production.
    pub fn is_production(&self) -> bool {
        matches!(self.environment, Environment::Production)
    }
}

fn read_positive(key: &str, default: u64) -> Result<u64, ConfigError> {
    match env::var(key) {
        Ok(raw) => {
            let value = u64::from_str(raw.trim()).map_err(|err| ConfigError::InvalidEnvVar {
                key: key.to_string(),
                reason: err.to_string(),
            })?;
            if value == 0 {
                return Err(ConfigError::InvalidEnvVar {
                    key: key.to_string(),
                    reason: "must be greater than zero".into(),
                });
            }
            Ok(value)
        }
        Err(_) => Ok(default),
    }
}

/// Helper that loads config and converts to the canonical brewhouse error type.
pub fn load_config() -> Result<BrewhouseConfig, BrewhouseError> {
    Ok(BrewhouseConfig::from_env()?)
}
