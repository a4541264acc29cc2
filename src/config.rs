use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use std::{env, fmt};

use chrono::TimeDelta;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_conn_max_lifetime: Duration,
    // HMAC key for every token this service signs or verifies
    pub token_secret: String,
    // Token lifetimes
    pub access_token_ttl: TimeDelta,
    pub refresh_token_ttl: TimeDelta,
    // How long past expiresAt a customer token is still accepted by verify
    pub customer_expiry_grace: TimeDelta,
    pub request_timeout: Duration,
    pub request_body_limit_bytes: usize,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print the database url or the token secret
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("app_env", &self.app_env)
            .field("db_max_connections", &self.db_max_connections)
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .field("customer_expiry_grace", &self.customer_expiry_grace)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = lookup("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 = parse_or(&lookup, "SERVER_PORT", 4000)?;

        let addr: SocketAddr = SocketAddr::from_str(&format!("{}:{}", host, port))
            .map_err(|_| ConfigError::Invalid("SERVER_HOST"))?;

        let app_env = AppEnv::parse(&lookup("APP_ENV").unwrap_or_default());

        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let db_max_connections = parse_or(&lookup, "DB_MAX_CONNECTIONS", 10)?;
        let db_conn_max_lifetime =
            Duration::from_secs(parse_or(&lookup, "DB_CONN_MAX_LIFETIME_SECONDS", 180)?);

        let token_secret = lookup("TOKEN_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("TOKEN_SECRET"))?;

        let access_token_ttl = parse_seconds(&lookup, "ACCESS_TOKEN_TTL_SECONDS", 3600, 1)?; // 1 hour
        let refresh_token_ttl =
            parse_seconds(&lookup, "REFRESH_TOKEN_TTL_SECONDS", 2_592_000, 1)?; // 30 days
        // Zero grace is a hard cutoff at expiresAt.
        let customer_expiry_grace =
            parse_seconds(&lookup, "CUSTOMER_EXPIRY_GRACE_SECONDS", 3600, 0)?;

        let request_timeout = Duration::from_secs(parse_or(&lookup, "REQUEST_TIMEOUT_SECONDS", 30)?);
        let request_body_limit_bytes = parse_or(&lookup, "REQUEST_BODY_LIMIT_BYTES", 1024 * 1024)?;

        Ok(Config {
            addr,
            app_env,
            database_url,
            db_max_connections,
            db_conn_max_lifetime,
            token_secret,
            access_token_ttl,
            refresh_token_ttl,
            customer_expiry_grace,
            request_timeout,
            request_body_limit_bytes,
        })
    }
}

// Absent -> default, present but unparsable -> Invalid.
fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

// Keeps `now + ttl` far from chrono's DateTime range limit.
const MAX_SECONDS: i64 = 100 * 365 * 24 * 3600;

fn parse_seconds(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: i64,
    min: i64,
) -> Result<TimeDelta, ConfigError> {
    let secs: i64 = parse_or(lookup, key, default)?;
    if !(min..=MAX_SECONDS).contains(&secs) {
        return Err(ConfigError::Invalid(key));
    }
    TimeDelta::try_seconds(secs).ok_or(ConfigError::Invalid(key))
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        tracing::error!(error = %e, "configuration error");
        AppError::Internal
    }
}
