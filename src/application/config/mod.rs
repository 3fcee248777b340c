pub mod azure;
pub mod database;
pub mod provisioning;
pub mod server;

use std::env;
use std::str::FromStr;

use thiserror::Error;

/// Errors raised while assembling the configuration at startup
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}

/// Key/value source the configuration is read from
pub(crate) type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

pub(crate) fn required(lookup: Lookup<'_>, key: &'static str) -> Result<String, ConfigError> {
    lookup(key)
        .filter(|value| !value.trim().is_empty())
        .ok_or(ConfigError::Missing(key))
}

pub(crate) fn optional(lookup: Lookup<'_>, key: &str, default: &str) -> String {
    lookup(key)
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

pub(crate) fn parse<T: FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { key, value })
}

/// Application configuration, built once at startup and handed to the
/// services that need it
#[derive(Debug, Clone)]
pub struct Config {
    pub server: server::ServerConfig,
    pub database: database::DatabaseConfig,
    pub azure: azure::AzureConfig,
    pub provisioning: provisioning::ProvisioningConfig,

    // Build info
    pub version: String,

    // Logging
    pub log_level: String,
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup: Lookup<'_> = &lookup;

        Ok(Self {
            server: server::ServerConfig::from_lookup(lookup)?,
            database: database::DatabaseConfig::from_lookup(lookup)?,
            azure: azure::AzureConfig::from_lookup(lookup)?,
            provisioning: provisioning::ProvisioningConfig::from_lookup(lookup)?,

            version: env!("CARGO_PKG_VERSION").to_string(),

            log_level: optional(lookup, "VM_MANAGE_LOG_LEVEL", "info"),
        })
    }
}
