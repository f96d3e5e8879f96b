//! Runtime configuration for the orchestration services.
//!
//! Values come from the process environment. Every setting has a default
//! except the database URL, which only the `PostgreSQL` adapters need.

use crate::processing::services::{DEFAULT_STALENESS_THRESHOLD, DEFAULT_TIMEZONE};
use std::time::Duration;
use thiserror::Error;


/// Environment key for the staleness threshold, in `humantime` syntax.
pub const ENV_STALENESS_THRESHOLD: &str = "CURATOR_STALENESS_THRESHOLD";
/// Environment key for the fallback digest timezone.
pub const ENV_DEFAULT_TIMEZONE: &str = "CURATOR_DEFAULT_TIMEZONE";
/// Environment key for the `PostgreSQL` connection URL.
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";

/// Errors raised while loading configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A duration value could not be parsed.
    #[error("{key} is not a valid duration ({value}): {reason}")]
    InvalidDuration {
        /// Environment key.
        key: &'static str,
        /// Raw value.
        value: String,
        /// Parser message.
        reason: String,
    },
    /// A duration value was zero.
    #[error("{key} must be greater than zero")]
    ZeroDuration {
        /// Environment key.
        key: &'static str,
    },
    /// A required value was blank.
    #[error("{key} must not be blank")]
    Blank {
        /// Environment key.
        key: &'static str,
    },
    /// A required value was absent.
    #[error("{key} is not set")]
    Missing {
        /// Environment key.
        key: &'static str,
    },
}

/// Settings shared by admission, triggering and the poll entrypoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestrationConfig {
    /// Age after which an active task is reclaimed on the next admission.
    pub staleness_threshold: Duration,
    /// Timezone used when a user has none configured.
    pub default_timezone: String,
    /// `PostgreSQL` connection URL, when persistence is database-backed.
    pub database_url: Option<String>,
}

impl Default for OrchestrationConfig {
    fn default() -> Self {
        Self {
            staleness_threshold: DEFAULT_STALENESS_THRESHOLD,
            default_timezone: DEFAULT_TIMEZONE.to_owned(),
            database_url: None,
        }
    }
}

impl OrchestrationConfig {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a provided value is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Loads configuration through a custom key lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a provided value is invalid.
    pub fn from_env_with<F>(get_env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let staleness_threshold = match get_env(ENV_STALENESS_THRESHOLD) {
            Some(raw) => parse_duration(ENV_STALENESS_THRESHOLD, &raw)?,
            None => defaults.staleness_threshold,
        };
        let default_timezone = match get_env(ENV_DEFAULT_TIMEZONE) {
            Some(raw) => non_blank(ENV_DEFAULT_TIMEZONE, &raw)?,
            None => defaults.default_timezone,
        };
        let database_url = get_env(ENV_DATABASE_URL)
            .map(|raw| non_blank(ENV_DATABASE_URL, &raw))
            .transpose()?;

        Ok(Self {
            staleness_threshold,
            default_timezone,
            database_url,
        })
    }

    /// Returns the database URL or an error naming the missing key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when no URL was configured.
    pub fn require_database_url(&self) -> Result<&str, ConfigError> {
        self.database_url.as_deref().ok_or(ConfigError::Missing {
            key: ENV_DATABASE_URL,
        })
    }
}

fn parse_duration(key: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    let parsed =
        humantime::parse_duration(raw.trim()).map_err(|err| ConfigError::InvalidDuration {
            key,
            value: raw.to_owned(),
            reason: err.to_string(),
        })?;
    if parsed.is_zero() {
        return Err(ConfigError::ZeroDuration { key });
    }
    Ok(parsed)
}

fn non_blank(key: &'static str, raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Blank { key });
    }
    Ok(trimmed.to_owned())
}
