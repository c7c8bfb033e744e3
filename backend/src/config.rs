//! Environment-sourced settings for the API process.
//!
//! | Variable             | Default      |
//! |----------------------|--------------|
//! | `PORT`               | `8080`       |
//! | `DB_HOST`            | `localhost`  |
//! | `DB_PORT`            | `5432`       |
//! | `DB_USER`            | `postgres`   |
//! | `DB_PASSWORD`        | `postgres`   |
//! | `DB_NAME`            | `todo_db`    |
//! | `DB_MAX_CONNECTIONS` | `10`         |
//! | `TODO_STORAGE`       | `postgres`   |
//!
//! Empty values are treated as unset.

use std::str::FromStr;

use sqlx::postgres::{PgConnectOptions, PgSslMode};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be a number, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },
    #[error("TODO_STORAGE must be \"postgres\" or \"memory\", got {0:?}")]
    InvalidStorage(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    Postgres,
    Memory,
}

impl FromStr for StorageMode {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "postgres" => Ok(StorageMode::Postgres),
            "memory" => Ok(StorageMode::Memory),
            _ => Err(ConfigError::InvalidStorage(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub storage: StorageMode,
    pub database: DatabaseConfig,
}

#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub max_connections: u32,
}

// Hand-written so the password never reaches the logs.
impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("name", &self.name)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Ok(Config {
            port: parse_number("PORT", get("PORT", "8080"))?,
            storage: get("TODO_STORAGE", "postgres").parse()?,
            database: DatabaseConfig {
                host: get("DB_HOST", "localhost"),
                port: parse_number("DB_PORT", get("DB_PORT", "5432"))?,
                user: get("DB_USER", "postgres"),
                password: get("DB_PASSWORD", "postgres"),
                name: get("DB_NAME", "todo_db"),
                max_connections: parse_number(
                    "DB_MAX_CONNECTIONS",
                    get("DB_MAX_CONNECTIONS", "10"),
                )?,
            },
        })
    }
}

impl DatabaseConfig {
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.name)
            .ssl_mode(PgSslMode::Disable)
    }
}

fn parse_number<T: FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidNumber { key, value })
}
