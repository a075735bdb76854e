//! Central module for application-wide configuration settings.
//!
//! This module handles loading the database settings, the server port and the
//! bearer-token options (lifetime, transport, store deadline, purge cadence)
//! together with the cookie names the CSRF guard inspects.

use anyhow::{Context, Result};
use chrono::Utc;
use std::env;
use std::time::Duration;

/// Fourteen days, in seconds.
pub const DEFAULT_TOKEN_LIFETIME_SECONDS: u64 = 86400 * 7 * 2;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
    pub server_port: u16,
    pub api_version: u32,
    pub bearer_tokens_enabled: bool,
    pub token_lifetime_seconds: u64,
    /// Query parameter accepted as a bearer token fallback. `None` means header only.
    pub bearer_query_key: Option<String>,
    pub store_timeout_ms: u64,
    pub token_purge_interval_seconds: u64,
    pub session_cookie: String,
    pub csrf_cookie: String,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL not set")?;

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u32>()
            .context("DB_MAX_CONNECTIONS must be a valid number")?;

        let acquire_timeout_seconds = env::var("DB_ACQUIRE_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "3".to_string())
            .parse::<u64>()
            .context("DB_ACQUIRE_TIMEOUT_SECONDS must be a valid number")?;

        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .context("SERVER_PORT must be a valid number")?;

        let api_version = env::var("API_VERSION")
            .unwrap_or_else(|_| "1".to_string())
            .parse::<u32>()
            .context("API_VERSION must be a valid number")?;

        let bearer_tokens_enabled = parse_bool(
            &env::var("BEARER_TOKENS_ENABLED").unwrap_or_else(|_| "true".to_string()),
        )
        .context("BEARER_TOKENS_ENABLED must be true or false")?;

        let token_lifetime_seconds = env::var("BEARER_TOKEN_LIFETIME_SECONDS")
            .unwrap_or_else(|_| DEFAULT_TOKEN_LIFETIME_SECONDS.to_string())
            .parse::<u64>()
            .context("BEARER_TOKEN_LIFETIME_SECONDS must be a valid number")?;
        check_token_lifetime(token_lifetime_seconds)
            .context("BEARER_TOKEN_LIFETIME_SECONDS is out of range")?;

        let bearer_query_key = match env::var("BEARER_QUERY_KEY") {
            Ok(key) if key.trim().is_empty() => None,
            Ok(key) => Some(key.trim().to_string()),
            Err(_) => Some("access_token".to_string()),
        };

        let store_timeout_ms = env::var("STORE_TIMEOUT_MS")
            .unwrap_or_else(|_| "5000".to_string())
            .parse::<u64>()
            .context("STORE_TIMEOUT_MS must be a valid number")?;

        let token_purge_interval_seconds = env::var("TOKEN_PURGE_INTERVAL_SECONDS")
            .unwrap_or_else(|_| "3600".to_string())
            .parse::<u64>()
            .context("TOKEN_PURGE_INTERVAL_SECONDS must be a valid number")?;
        if token_purge_interval_seconds == 0 {
            anyhow::bail!("TOKEN_PURGE_INTERVAL_SECONDS must be greater than zero");
        }

        let session_cookie = env::var("SESSION_COOKIE").unwrap_or_else(|_| "session".to_string());
        let csrf_cookie = env::var("CSRF_COOKIE").unwrap_or_else(|_| "csrf_token".to_string());

        Ok(Config {
            database_url,
            max_connections,
            acquire_timeout_seconds,
            server_port,
            api_version,
            bearer_tokens_enabled,
            token_lifetime_seconds,
            bearer_query_key,
            store_timeout_ms,
            token_purge_interval_seconds,
            session_cookie,
            csrf_cookie,
        })
    }

    /// Path prefix every API route lives under, e.g. `/api/v1`.
    pub fn api_prefix(&self) -> String {
        format!("/api/v{}", self.api_version)
    }

    pub fn token_lifetime(&self) -> Duration {
        Duration::from_secs(self.token_lifetime_seconds)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn token_purge_interval(&self) -> Duration {
        Duration::from_secs(self.token_purge_interval_seconds)
    }
}

/// A lifetime must be positive and produce a representable expiry timestamp.
fn check_token_lifetime(seconds: u64) -> Result<()> {
    if seconds == 0 {
        anyhow::bail!("token lifetime must be greater than zero");
    }
    chrono::Duration::from_std(Duration::from_secs(seconds))
        .ok()
        .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
        .map(|_| ())
        .with_context(|| format!("{} seconds overflows the expiry timestamp", seconds))
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("invalid boolean value '{}'", other),
    }
}

#[cfg(test)]
impl Config {
    /// Defaults matching `from_env` with no overrides, against an in-memory database.
    pub fn for_tests() -> Self {
        Config {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 1,
            acquire_timeout_seconds: 3,
            server_port: 0,
            api_version: 1,
            bearer_tokens_enabled: true,
            token_lifetime_seconds: DEFAULT_TOKEN_LIFETIME_SECONDS,
            bearer_query_key: Some("access_token".to_string()),
            store_timeout_ms: 5000,
            token_purge_interval_seconds: 3600,
            session_cookie: "session".to_string(),
            csrf_cookie: "csrf_token".to_string(),
        }
    }
}
