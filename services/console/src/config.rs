//! services/console/src/config.rs
//!
//! Defines the console's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use bookstore_core::{NumericPolicy, SortKey};
use std::collections::HashMap;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub api_url: String,
    pub page_size: u32,
    pub default_sort: SortKey,
    pub numeric_policy: NumericPolicy,
    pub http_timeout: Duration,
    pub log_level: Level,
    pub login: Option<(String, String)>,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test builds to keep tests hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_vars(&std::env::vars().collect())
    }

    /// Builds the configuration from an explicit variable map.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let var = |name: &str| vars.get(name).map(|v| v.trim()).filter(|v| !v.is_empty());

        // --- Remote Service ---
        let api_url = var("CATALOG_API_URL")
            .unwrap_or("http://localhost:8080/api")
            .trim_end_matches('/')
            .to_string();
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue(
                "CATALOG_API_URL".to_string(),
                format!("'{api_url}' is not an http(s) URL"),
            ));
        }

        let http_timeout_secs = var("CATALOG_HTTP_TIMEOUT_SECS")
            .unwrap_or("30")
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "CATALOG_HTTP_TIMEOUT_SECS".to_string(),
                    "expected a positive number of seconds".to_string(),
                )
            })?;

        // --- Catalog View ---
        let page_size = var("CATALOG_PAGE_SIZE")
            .unwrap_or("6")
            .parse::<u32>()
            .ok()
            .filter(|size| *size > 0)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "CATALOG_PAGE_SIZE".to_string(),
                    "expected a positive integer".to_string(),
                )
            })?;

        let default_sort = var("CATALOG_DEFAULT_SORT")
            .unwrap_or("price")
            .parse::<SortKey>()
            .map_err(|e| ConfigError::InvalidValue("CATALOG_DEFAULT_SORT".to_string(), e.to_string()))?;

        let numeric_policy = match var("CATALOG_STRICT_NUMBERS").unwrap_or("false") {
            v if v.eq_ignore_ascii_case("true") || v == "1" => NumericPolicy::Strict,
            v if v.eq_ignore_ascii_case("false") || v == "0" => NumericPolicy::Lenient,
            other => {
                return Err(ConfigError::InvalidValue(
                    "CATALOG_STRICT_NUMBERS".to_string(),
                    format!("'{other}' is not true/false"),
                ))
            }
        };

        // --- Logging ---
        let log_level_str = var("RUST_LOG").unwrap_or("INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Optional Auto-login ---
        let login = match (var("CATALOG_EMAIL"), var("CATALOG_PASSWORD")) {
            (Some(email), Some(password)) => Some((email.to_string(), password.to_string())),
            (Some(_), None) => return Err(ConfigError::MissingVar("CATALOG_PASSWORD".to_string())),
            (None, Some(_)) => return Err(ConfigError::MissingVar("CATALOG_EMAIL".to_string())),
            (None, None) => None,
        };

        Ok(Self {
            api_url,
            page_size,
            default_sort,
            numeric_policy,
            http_timeout: Duration::from_secs(http_timeout_secs),
            log_level,
            login,
        })
    }
}
