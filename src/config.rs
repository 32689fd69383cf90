//! Configuration loaded from environment variables (and `.env` via dotenvy).
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string; in-memory storage when unset
//! - `NATS_URL` - event bus; events are only logged when unset
//! - `HOST` - bind address (default: 0.0.0.0)
//! - `PORT` - listen port (default: 8083)
//! - `SESSION_SECURE_COOKIE` - mark the session cookie `Secure` (default: false)
//! - `MAX_UPLOAD_BYTES` - request body limit for item images (default: 5 MiB)
//! - `DB_MAX_CONNECTIONS` - pool size (default: 10)
//! - `LOG_FORMAT` - `json` for JSON logs, anything else for plain text

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(&'static str, String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub nats_url: Option<String>,
    pub host: IpAddr,
    pub port: u16,
    pub secure_cookies: bool,
    pub max_upload_bytes: usize,
    pub db_max_connections: u32,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            nats_url: None,
            host: IpAddr::from([0, 0, 0, 0]),
            port: 8083,
            secure_cookies: false,
            max_upload_bytes: 5 * 1024 * 1024,
            db_max_connections: 10,
            log_format: LogFormat::Text,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; `from_env` passes `std::env::var`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Ok(Self {
            database_url: get("DATABASE_URL"),
            nats_url: get("NATS_URL"),
            host: parse_or("HOST", get("HOST"), defaults.host)?,
            port: parse_or("PORT", get("PORT"), defaults.port)?,
            secure_cookies: parse_or("SESSION_SECURE_COOKIE", get("SESSION_SECURE_COOKIE"), defaults.secure_cookies)?,
            max_upload_bytes: parse_or("MAX_UPLOAD_BYTES", get("MAX_UPLOAD_BYTES"), defaults.max_upload_bytes)?,
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", get("DB_MAX_CONNECTIONS"), defaults.db_max_connections)?,
            log_format: match get("LOG_FORMAT").as_deref() {
                Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
                _ => LogFormat::Text,
            },
        })
    }

    pub fn socket_addr(&self) -> SocketAddr { SocketAddr::new(self.host, self.port) }
}

fn parse_or<T: FromStr>(key: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match value {
        Some(v) => v.parse().map_err(|e: T::Err| ConfigError::InvalidEnvVar(key, e.to_string())),
        None => Ok(default),
    }
}
