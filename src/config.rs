use std::{env, fmt::Display, net::SocketAddr, str::FromStr};

use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("invalid {key} value: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub secret_key: String,
    pub token_ttl_days: i64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let secret_key = env::var("SECRET_KEY").map_err(|_| ConfigError::Missing("SECRET_KEY"))?;
        if secret_key.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "SECRET_KEY",
                reason: "must not be empty".to_string(),
            });
        }

        Ok(Self {
            database_url: try_load("DATABASE_URL", "sqlite://studygroup.db?mode=rwc")?,
            bind_addr: try_load("BIND_ADDR", "127.0.0.1:3000")?,
            secret_key,
            token_ttl_days: try_load("TOKEN_TTL_DAYS", "180")?,
        })
    }
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse().map_err(|e: T::Err| {
        warn!("Invalid {key} value: {e}");
        ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }
    })
}
