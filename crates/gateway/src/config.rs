//! Minimal environment-based configuration. Logging transport and config
//! *loading* are named out of scope by the spec (§1 "Logging/metrics
//! transport and config loading"); this is the small amount of
//! environment wiring any binary needs regardless — bind address,
//! database URL, JWT secret — read once at startup, no live reload.

use std::env;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub database_url: String,
    pub jwt_secret: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            bind_addr: env::var("TILE_ROOM_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:9001".to_string()),
            database_url: env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?,
            jwt_secret: env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?,
        })
    }
}
