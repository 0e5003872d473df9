// Service configuration
// Read from the process environment (optionally seeded from a .env file)

use std::net::SocketAddr;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while reading configuration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Runtime configuration for the API service
///
/// # Environment
/// * `DATABASE_URL` - PostgreSQL connection string; in-memory storage when unset
/// * `DATABASE_MAX_CONNECTIONS` - pool size (default 5)
/// * `BIND_ADDR` - listen address (default `0.0.0.0:3000`)
/// * `DEFAULT_RATE_LIMIT` - requests per second granted to new users (default 100)
/// * `PASSWORD_RESET_TOKEN_EXPIRE` - reset token lifetime in seconds (default 3600)
/// * `PASSWORD_HASH_COST` - bcrypt cost (default `bcrypt::DEFAULT_COST`)
/// * `DEFAULT_PAGE_SIZE` / `MAX_PAGE_SIZE` - list pagination (default 20 / 50)
/// * `RATE_LIMIT_HEADERS` - emit `X-Rate-Limit-*` headers (default true)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub bind_addr: SocketAddr,
    pub default_rate_limit: i64,
    pub password_reset_token_expire: i64,
    pub password_hash_cost: u32,
    pub default_page_size: u32,
    pub max_page_size: u32,
    pub rate_limit_headers: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            database_max_connections: 5,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            default_rate_limit: 100,
            password_reset_token_expire: 3600,
            password_hash_cost: bcrypt::DEFAULT_COST,
            default_page_size: 20,
            max_page_size: 50,
            rate_limit_headers: true,
        }
    }
}

impl Config {
    /// Loads configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary key lookup
    ///
    /// Missing or blank keys fall back to [`Config::default`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Ok(Self {
            database_url: lookup("DATABASE_URL"),
            database_max_connections: parse_or(
                &lookup,
                "DATABASE_MAX_CONNECTIONS",
                defaults.database_max_connections,
            )?,
            bind_addr: parse_or(&lookup, "BIND_ADDR", defaults.bind_addr)?,
            default_rate_limit: parse_or(&lookup, "DEFAULT_RATE_LIMIT", defaults.default_rate_limit)?,
            password_reset_token_expire: parse_or(
                &lookup,
                "PASSWORD_RESET_TOKEN_EXPIRE",
                defaults.password_reset_token_expire,
            )?,
            password_hash_cost: parse_or(&lookup, "PASSWORD_HASH_COST", defaults.password_hash_cost)?,
            default_page_size: parse_or(&lookup, "DEFAULT_PAGE_SIZE", defaults.default_page_size)?,
            max_page_size: parse_or(&lookup, "MAX_PAGE_SIZE", defaults.max_page_size)?,
            rate_limit_headers: parse_or(&lookup, "RATE_LIMIT_HEADERS", defaults.rate_limit_headers)?,
        })
    }
}

fn parse_or<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
        None => Ok(default),
    }
}
