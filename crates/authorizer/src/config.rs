//! Authorizer configuration.
//!
//! Configuration is loaded from environment variables at cold start. A bad
//! configuration fails the function before it serves any request.

use crate::auth::jwks::MAX_CACHE_TTL;
use std::collections::HashMap;
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Default JWKS cache TTL in seconds (10 minutes).
pub const DEFAULT_JWKS_CACHE_TTL_SECONDS: u64 = 600;

/// Default upstream JWKS fetch budget per minute.
pub const DEFAULT_JWKS_REQUESTS_PER_MINUTE: u32 = 10;

/// Package authorizer configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Package name a token must list in its `pks` claim to be authorized.
    pub package: String,

    /// URL to the JWKS endpoint for signing key resolution.
    pub jwks_uri: String,

    /// Accepted token issuers. Empty means any issuer is accepted.
    pub issuer_allow_list: Vec<String>,

    /// How long fetched JWKS documents are cached.
    pub jwks_cache_ttl: Duration,

    /// Upstream JWKS fetch budget per sliding minute.
    pub jwks_requests_per_minute: u32,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid cache TTL configuration: {0}")]
    InvalidCacheTtl(String),

    #[error("Invalid JWKS rate limit configuration: {0}")]
    InvalidRateLimit(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let package = vars
            .get("PACKAGE")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("PACKAGE".to_string()))?
            .clone();

        let jwks_uri = vars
            .get("JWKS_URI")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("JWKS_URI".to_string()))?
            .clone();

        // Comma-separated allow-list; surrounding whitespace on entries is
        // tolerated and empty entries are dropped.
        let issuer_allow_list = vars
            .get("TOKEN_ISSUER")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(ToString::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let jwks_cache_ttl = if let Some(value_str) = vars.get("JWKS_CACHE_TTL_SECONDS") {
            let value: u64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidCacheTtl(format!(
                    "JWKS_CACHE_TTL_SECONDS must be a valid integer, got '{}': {}",
                    value_str, e
                ))
            })?;
            if value == 0 {
                return Err(ConfigError::InvalidCacheTtl(
                    "JWKS_CACHE_TTL_SECONDS must be greater than zero".to_string(),
                ));
            }
            if value > MAX_CACHE_TTL.as_secs() {
                return Err(ConfigError::InvalidCacheTtl(format!(
                    "JWKS_CACHE_TTL_SECONDS must be at most {}, got {}",
                    MAX_CACHE_TTL.as_secs(),
                    value
                )));
            }
            Duration::from_secs(value)
        } else {
            Duration::from_secs(DEFAULT_JWKS_CACHE_TTL_SECONDS)
        };

        let jwks_requests_per_minute =
            if let Some(value_str) = vars.get("JWKS_REQUESTS_PER_MINUTE") {
                let value: u32 = value_str.parse().map_err(|e| {
                    ConfigError::InvalidRateLimit(format!(
                        "JWKS_REQUESTS_PER_MINUTE must be a valid integer, got '{}': {}",
                        value_str, e
                    ))
                })?;
                if value == 0 {
                    return Err(ConfigError::InvalidRateLimit(
                        "JWKS_REQUESTS_PER_MINUTE must be greater than zero".to_string(),
                    ));
                }
                value
            } else {
                DEFAULT_JWKS_REQUESTS_PER_MINUTE
            };

        Ok(Config {
            package,
            jwks_uri,
            issuer_allow_list,
            jwks_cache_ttl,
            jwks_requests_per_minute,
        })
    }
}
