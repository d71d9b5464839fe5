//! Runtime configuration for the agency core.
//!
//! # Responsibility
//! - Resolve database, logging and breed catalog settings from the
//!   environment with build-mode aware defaults.
//!
//! # Invariants
//! - Resolution never panics; invalid values produce `ConfigError`.
//! - Unset or blank variables fall back to defaults.

use crate::logging::default_log_level;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_DB_PATH: &str = "SPYCAT_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "SPYCAT_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "SPYCAT_LOG_DIR";
pub const ENV_BREED_CATALOG_URL: &str = "SPYCAT_BREED_CATALOG_URL";
pub const ENV_BREED_TIMEOUT_SECS: &str = "SPYCAT_BREED_TIMEOUT_SECS";

const DEFAULT_DB_FILE_NAME: &str = "spy_cat_agency.db";
const DEFAULT_BREED_CATALOG_URL: &str = "https://api.thecatapi.com/v1/breeds";
const DEFAULT_BREED_TIMEOUT_SECS: u64 = 10;
const BREED_CONNECT_TIMEOUT_CAP: Duration = Duration::from_secs(5);
const MAX_BREED_TIMEOUT_SECS: u64 = 120;

/// Configuration error with the offending variable name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub variable: &'static str,
    pub reason: String,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid `{}`: {}", self.variable, self.reason)
    }
}

impl Error for ConfigError {}

/// Breed catalog client settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreedCatalogConfig {
    pub url: String,
    pub connect_timeout: Duration,
    /// Whole-request timeout, including body download.
    pub timeout: Duration,
}

impl Default for BreedCatalogConfig {
    fn default() -> Self {
        Self::with_timeout(
            DEFAULT_BREED_CATALOG_URL,
            Duration::from_secs(DEFAULT_BREED_TIMEOUT_SECS),
        )
    }
}

impl BreedCatalogConfig {
    fn with_timeout(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            connect_timeout: timeout.min(BREED_CONNECT_TIMEOUT_CAP),
            timeout,
        }
    }
}

/// Resolved core configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// Logging stays disabled when unset.
    pub log_dir: Option<PathBuf>,
    pub breed_catalog: BreedCatalogConfig,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: None,
            breed_catalog: BreedCatalogConfig::default(),
        }
    }
}

impl CoreConfig {
    /// Resolves configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolves configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    /// - `SPYCAT_LOG_DIR` is relative.
    /// - `SPYCAT_BREED_TIMEOUT_SECS` is not an integer in `1..=120`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        let log_dir = match read(ENV_LOG_DIR) {
            Some(value) => {
                let path = PathBuf::from(&value);
                if !path.is_absolute() {
                    return Err(ConfigError {
                        variable: ENV_LOG_DIR,
                        reason: format!("must be an absolute path, got `{value}`"),
                    });
                }
                Some(path)
            }
            None => None,
        };

        let timeout = match read(ENV_BREED_TIMEOUT_SECS) {
            Some(value) => Duration::from_secs(parse_timeout_secs(&value)?),
            None => defaults.breed_catalog.timeout,
        };

        Ok(Self {
            db_path: read(ENV_DB_PATH)
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            log_level: read(ENV_LOG_LEVEL).unwrap_or(defaults.log_level),
            log_dir,
            breed_catalog: BreedCatalogConfig::with_timeout(
                read(ENV_BREED_CATALOG_URL).unwrap_or(defaults.breed_catalog.url),
                timeout,
            ),
        })
    }
}

fn parse_timeout_secs(value: &str) -> Result<u64, ConfigError> {
    let invalid = || ConfigError {
        variable: ENV_BREED_TIMEOUT_SECS,
        reason: format!("expected whole seconds in 1..={MAX_BREED_TIMEOUT_SECS}, got `{value}`"),
    };
    let secs = value.parse::<u64>().map_err(|_| invalid())?;
    if secs == 0 || secs > MAX_BREED_TIMEOUT_SECS {
        return Err(invalid());
    }
    Ok(secs)
}
