//! Configuration for expense splitting and settlement

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Settlement configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Netting configuration
    pub netting: NettingConfig,

    /// Member roster configuration
    pub roster: RosterConfig,
}

/// Netting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NettingConfig {
    /// Reject net balances whose sum is further than `conservation_tolerance`
    /// from zero. When disabled, the engine stops once either side is
    /// exhausted and drops the residual.
    pub enforce_conservation: bool,

    /// Allowed absolute residual of the net balance sum
    pub conservation_tolerance: Decimal,
}

impl Default for NettingConfig {
    fn default() -> Self {
        Self {
            enforce_conservation: true,
            conservation_tolerance: Decimal::new(1, 2), // 0.01
        }
    }
}

/// Member roster configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterConfig {
    /// Maximum active members per household
    pub max_active_members: usize,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            max_active_members: 12,
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

        if let Ok(value) = std::env::var("HOUSEHOLD_ENFORCE_CONSERVATION") {
            config.netting.enforce_conservation = value.parse().map_err(|e| {
                crate::Error::Config(format!("HOUSEHOLD_ENFORCE_CONSERVATION: {}", e))
            })?;
        }

        if let Ok(value) = std::env::var("HOUSEHOLD_CONSERVATION_TOLERANCE") {
            config.netting.conservation_tolerance = value.parse().map_err(|e| {
                crate::Error::Config(format!("HOUSEHOLD_CONSERVATION_TOLERANCE: {}", e))
            })?;
        }

        if let Ok(value) = std::env::var("HOUSEHOLD_MAX_ACTIVE_MEMBERS") {
            config.roster.max_active_members = value.parse().map_err(|e| {
                crate::Error::Config(format!("HOUSEHOLD_MAX_ACTIVE_MEMBERS: {}", e))
            })?;
        }

        Ok(config)
    }
}
