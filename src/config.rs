//! Runtime configuration loaded from the environment.
//!
//! All settings are read once at process start (a `.env` file is honored via
//! `dotenvy` in the binary) and are read-only afterwards.

use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

const ENV_PREFIX: &str = "TRIAGE_";

const DEFAULT_SEED: &str = "1";
const DEFAULT_TARGET_DISPATCHES: u32 = 10_000;
const DEFAULT_MAX_ACTIVE_CALLS: u32 = 100;
const DEFAULT_RETRY_COUNT: u32 = 3;
const DEFAULT_TIMEOUT_SECS: f64 = 5.0;
const DEFAULT_HOME_COUNTY: &str = "Maramureș";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidVar { var: String, reason: String },
}

/// Settings for one engine process.
///
/// `home_county` is the single source of truth for the home-region name;
/// every county comparison in the engine goes through this value.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub api_host: String,
    pub username: String,
    pub password: String,
    pub seed: String,
    pub target_dispatches: u32,
    pub max_active_calls: u32,
    pub retry_count: u32,
    pub timeout: Duration,
    pub home_county: String,
    /// When set, discovered locations are snapshotted into a SQLite catalog.
    pub catalog_path: Option<PathBuf>,
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_host: require("API_HOST")?,
            username: require("USERNAME")?,
            password: require("PASSWORD")?,
            seed: optional("SEED").unwrap_or_else(|| DEFAULT_SEED.to_string()),
            target_dispatches: parsed("TARGET_DISPATCHES", DEFAULT_TARGET_DISPATCHES)?,
            max_active_calls: parsed("MAX_ACTIVE_CALLS", DEFAULT_MAX_ACTIVE_CALLS)?,
            retry_count: parsed("RETRY_COUNT", DEFAULT_RETRY_COUNT)?,
            timeout: Duration::from_secs_f64(parsed("TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?),
            home_county: optional("HOME_COUNTY")
                .unwrap_or_else(|| DEFAULT_HOME_COUNTY.to_string()),
            catalog_path: optional("CATALOG_PATH").map(PathBuf::from),
        })
    }
}

fn var_name(key: &str) -> String {
    format!("{ENV_PREFIX}{key}")
}

fn optional(key: &str) -> Option<String> {
    std::env::var(var_name(key))
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn require(key: &str) -> Result<String, ConfigError> {
    optional(key).ok_or_else(|| ConfigError::MissingVar(var_name(key)))
}

fn parsed<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match optional(key) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|error: T::Err| ConfigError::InvalidVar {
            var: var_name(key),
            reason: error.to_string(),
        }),
    }
}
