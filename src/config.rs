use std::env;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has an invalid value: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Which persistence backend the server runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Postgres,
    Memory,
}

impl FromStr for StorageKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(StorageKind::Postgres),
            "memory" | "mem" => Ok(StorageKind::Memory),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub storage: StorageKind,
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub host: String,
    pub port: u16,
    pub session_ttl_hours: i64,
    pub enable_seed: bool,
    pub bcrypt_cost: u32,
}

impl Config {
    /// Reads the configuration from the process environment. Call `dotenvy::dotenv()` first
    /// if a `.env` file should be honoured.
    pub fn from_env() -> Result<Self, ConfigError> {
        let storage = parse_or("STORAGE", StorageKind::Postgres)?;
        let database_url = env::var("DATABASE_URL").ok().filter(|url| !url.is_empty());
        if storage == StorageKind::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let jwt_secret = env::var("JWT_SECRET")
            .ok()
            .filter(|secret| !secret.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        Ok(Self {
            storage,
            database_url,
            jwt_secret,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_or("PORT", 3000)?,
            session_ttl_hours: parse_or("SESSION_TTL_HOURS", 24)?,
            enable_seed: parse_or("ENABLE_SEED", false)?,
            bcrypt_cost: parse_or("BCRYPT_COST", bcrypt::DEFAULT_COST)?,
        })
    }

    /// Settings for tests and local experiments: in-memory storage, seeding enabled and a
    /// cheap bcrypt cost.
    pub fn for_memory(jwt_secret: impl Into<String>) -> Self {
        Self {
            storage: StorageKind::Memory,
            database_url: None,
            jwt_secret: jwt_secret.into(),
            host: "127.0.0.1".to_string(),
            port: 0,
            session_ttl_hours: 24,
            enable_seed: true,
            bcrypt_cost: 4,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) if !value.is_empty() => value
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        _ => Ok(default),
    }
}
