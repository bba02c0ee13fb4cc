//! Configuration for PIN authentication
//!
//! Hashing parameters are fixed in [`crate::pin`] and are not configurable.

use serde::{Deserialize, Serialize};

/// Security configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Rate limiter configuration
    pub rate_limiter: RateLimiterConfig,

    /// Values used when the settings record is first created
    pub defaults: SettingsDefaults,
}

/// Rate limiter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimiterConfig {
    /// Consecutive failures that trigger a lockout
    pub max_failed_attempts: u32,

    /// Lockout length in minutes
    pub lockout_minutes: i64,

    /// Advisory delay unit, doubled per failed attempt
    pub base_delay_ms: u64,

    /// Advisory delay cap
    pub max_delay_ms: u64,

    /// Lock length for "lock now" when no lock timeout is set
    pub indefinite_lock_days: i64,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_failed_attempts: 5,
            lockout_minutes: 15,
            base_delay_ms: 1000,
            max_delay_ms: 16_000,
            indefinite_lock_days: 365,
        }
    }
}

/// Defaults for a new settings record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsDefaults {
    /// ISO 4217 currency code
    pub currency: String,

    /// BCP 47 locale
    pub locale: String,

    /// Auto-lock timeout in minutes (0 = lock until PIN entry)
    pub lock_timeout_minutes: u32,
}

impl Default for SettingsDefaults {
    fn default() -> Self {
        Self {
            currency: "USD".to_string(),
            locale: "en-US".to_string(),
            lock_timeout_minutes: 5,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(value) = std::env::var("HOUSEHOLD_MAX_FAILED_ATTEMPTS") {
            config.rate_limiter.max_failed_attempts = value.parse().map_err(|e| {
                crate::Error::Config(format!("HOUSEHOLD_MAX_FAILED_ATTEMPTS: {}", e))
            })?;
        }

        if let Ok(value) = std::env::var("HOUSEHOLD_LOCKOUT_MINUTES") {
            config.rate_limiter.lockout_minutes = value.parse().map_err(|e| {
                crate::Error::Config(format!("HOUSEHOLD_LOCKOUT_MINUTES: {}", e))
            })?;
        }

        if let Ok(value) = std::env::var("HOUSEHOLD_LOCK_TIMEOUT_MINUTES") {
            config.defaults.lock_timeout_minutes = value.parse().map_err(|e| {
                crate::Error::Config(format!("HOUSEHOLD_LOCK_TIMEOUT_MINUTES: {}", e))
            })?;
        }

        if let Ok(currency) = std::env::var("HOUSEHOLD_CURRENCY") {
            config.defaults.currency = currency;
        }

        if let Ok(locale) = std::env::var("HOUSEHOLD_LOCALE") {
            config.defaults.locale = locale;
        }

        Ok(config)
    }
}
