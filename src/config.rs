//! Verifier configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::auth::{DEFAULT_MAX_AGE, TimestampPolicy};
use crate::error::ConfigError;

/// Environment variable overriding the freshness window, in seconds.
pub const MAX_AGE_ENV_VAR: &str = "SIGNED_AUTH_MAX_AGE_SECS";

/// Tunable parameters of [`AuthVerifier`](crate::AuthVerifier).
///
/// Deserializes from any serde format, e.g. `{"max_age_secs": 300}`.
/// The window must be a positive whole number of minutes; see
/// [`validate`](Self::validate).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// Maximum age of a signature timestamp, in seconds.
    pub max_age_secs: u64,
}

impl VerifierConfig {
    /// Freshness window as a duration.
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_secs)
    }

    /// The timestamp policy this configuration describes.
    pub fn policy(&self) -> TimestampPolicy {
        TimestampPolicy::new(self.max_age())
    }

    /// Check that the window is a positive whole number of minutes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming `max_age_secs` otherwise.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_as("max_age_secs")
    }

    fn validate_as(&self, var: &str) -> Result<(), ConfigError> {
        if self.max_age_secs == 0 || self.max_age_secs % 60 != 0 {
            return Err(ConfigError::InvalidValue {
                var: var.to_string(),
                value: self.max_age_secs.to_string(),
            });
        }
        Ok(())
    }

    /// Read configuration from the environment.
    ///
    /// Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if a variable is set but cannot
    /// be parsed, or if the window fails [`validate`](Self::validate).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_var(MAX_AGE_ENV_VAR)
    }

    /// Read configuration from a custom environment variable name.
    ///
    /// # Errors
    ///
    /// See [`from_env`](Self::from_env).
    pub fn from_env_var(max_age_var: &str) -> Result<Self, ConfigError> {
        match std::env::var(max_age_var) {
            Ok(raw) => Self::from_max_age_str(max_age_var, &raw),
            Err(_) => Ok(Self::default()),
        }
    }

    /// Try to read configuration from the environment.
    ///
    /// Returns `None` if the variable is unset or invalid.
    pub fn try_from_env() -> Option<Self> {
        let raw = std::env::var(MAX_AGE_ENV_VAR).ok()?;
        Self::from_max_age_str(MAX_AGE_ENV_VAR, &raw).ok()
    }

    fn from_max_age_str(var: &str, raw: &str) -> Result<Self, ConfigError> {
        let max_age_secs: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            var: var.to_string(),
            value: raw.to_string(),
        })?;
        let config = Self { max_age_secs };
        config.validate_as(var)?;
        Ok(config)
    }
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            max_age_secs: DEFAULT_MAX_AGE.as_secs(),
        }
    }
}
