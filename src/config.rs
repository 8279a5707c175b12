use std::collections::HashMap;
use thiserror::Error;

/// Runtime configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    /// Age after which an unresolved idempotency record may be reclaimed by
    /// a retrying request.
    pub idempotency_stale_ms: i64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let idempotency_stale_ms = env_map
            .get("IDEMPOTENCY_STALE_MS")
            .map(|s| s.as_str())
            .unwrap_or("300000")
            .parse::<i64>()
            .map_err(|_| {
                ConfigError::InvalidValue(
                    "IDEMPOTENCY_STALE_MS".to_string(),
                    "must be a valid i64".to_string(),
                )
            })?;
        if idempotency_stale_ms <= 0 {
            return Err(ConfigError::InvalidValue(
                "IDEMPOTENCY_STALE_MS".to_string(),
                "must be positive".to_string(),
            ));
        }

        Ok(Config {
            port,
            database_path,
            idempotency_stale_ms,
        })
    }
}
