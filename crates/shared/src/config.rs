//! Workflow configuration
//!
//! Loaded from JSON with environment overrides:
//! - `HMS_STORE_TIMEOUT_MS`
//! - `HMS_REGISTRATION_MAX_ATTEMPTS`
//! - `HMS_LOG`

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{HmsError, HmsResult};
use crate::validation::{ValidationErrorCode, ValidationResult};

pub const ENV_STORE_TIMEOUT_MS: &str = "HMS_STORE_TIMEOUT_MS";
pub const ENV_REGISTRATION_MAX_ATTEMPTS: &str = "HMS_REGISTRATION_MAX_ATTEMPTS";
pub const ENV_LOG: &str = "HMS_LOG";

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct HmsConfig {
    pub store: StoreSettings,
    pub registration: RegistrationSettings,
    pub logging: LoggingSettings,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct StoreSettings {
    /// Upper bound for every store call, in milliseconds
    pub timeout_ms: u64,
}

impl StoreSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self { timeout_ms: 10_000 }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RegistrationSettings {
    /// Leading segment of issued patient numbers
    pub prefix: String,
    /// Patient-number draws before registration gives up on collisions
    pub max_attempts: u32,
}

impl Default for RegistrationSettings {
    fn default() -> Self {
        Self {
            prefix: "HMS".to_string(),
            max_attempts: 5,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSettings {
    /// `tracing_subscriber::EnvFilter` directive
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl HmsConfig {
    pub fn from_json_str(json: &str) -> HmsResult<Self> {
        let config: HmsConfig = serde_json::from_str(json)
            .map_err(|e| HmsError::validation(format!("invalid configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> HmsResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            HmsError::validation(format!("cannot read configuration {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }

    /// Defaults with environment overrides applied
    pub fn from_env() -> HmsResult<Self> {
        let mut config = Self::default();
        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup, then re-validate
    pub fn apply_overrides<F>(&mut self, lookup: F) -> HmsResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_STORE_TIMEOUT_MS) {
            self.store.timeout_ms = raw.trim().parse().map_err(|_| {
                HmsError::validation(format!("{} must be a number, got {:?}", ENV_STORE_TIMEOUT_MS, raw))
            })?;
        }
        if let Some(raw) = lookup(ENV_REGISTRATION_MAX_ATTEMPTS) {
            self.registration.max_attempts = raw.trim().parse().map_err(|_| {
                HmsError::validation(format!(
                    "{} must be a number, got {:?}",
                    ENV_REGISTRATION_MAX_ATTEMPTS, raw
                ))
            })?;
        }
        if let Some(filter) = lookup(ENV_LOG) {
            self.logging.filter = filter;
        }
        self.validate()
    }

    pub fn validate(&self) -> HmsResult<()> {
        let mut result = ValidationResult::new();

        if self.store.timeout_ms == 0 {
            result.add_error("store.timeout_ms", "Timeout must be greater than 0", ValidationErrorCode::OutOfRange);
        }
        if self.registration.max_attempts == 0 {
            result.add_error(
                "registration.max_attempts",
                "At least one attempt is required",
                ValidationErrorCode::OutOfRange,
            );
        }
        let prefix = &self.registration.prefix;
        if prefix.is_empty() {
            result.add_error("registration.prefix", "Prefix is required", ValidationErrorCode::Required);
        } else if !prefix.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()) {
            result.add_error(
                "registration.prefix",
                "Prefix can only contain uppercase letters and digits",
                ValidationErrorCode::InvalidCharacters,
            );
        }

        result.into_result()
    }
}
