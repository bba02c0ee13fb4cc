use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_path: PathBuf,
    pub log_json: bool,
    pub settlement: settlement::Config,
    pub security: security::Config,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("household.json"),
            log_json: false,
            settlement: settlement::Config::default(),
            security: security::Config::default(),
        }
    }
}

impl Config {
    /// `HOUSEHOLD_CONFIG` file if set, otherwise defaults with env overrides
    pub fn load() -> anyhow::Result<Self> {
        let mut config = match env::var("HOUSEHOLD_CONFIG") {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::from_env()?,
        };

        if let Ok(path) = env::var("HOUSEHOLD_DATA_PATH") {
            config.data_path = PathBuf::from(path);
        }

        if let Ok(value) = env::var("HOUSEHOLD_LOG_JSON") {
            config.log_json = matches!(value.as_str(), "1" | "true" | "yes");
        }

        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config {:?}: {}", path.as_ref(), e))
    }

    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Config {
            settlement: settlement::Config::from_env()?,
            security: security::Config::from_env()?,
            ..Config::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_file_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("household.toml");
        std::fs::write(
            &path,
            r#"
            data_path = "/var/lib/household/data.json"

            [settlement.netting]
            enforce_conservation = false

            [security.rate_limiter]
            lockout_minutes = 30
            "#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.data_path, PathBuf::from("/var/lib/household/data.json"));
        assert!(!config.log_json);
        assert!(!config.settlement.netting.enforce_conservation);
        assert_eq!(config.security.rate_limiter.lockout_minutes, 30);
        assert_eq!(config.security.rate_limiter.max_failed_attempts, 5);
    }

    #[test]
    fn test_bad_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("household.toml");
        std::fs::write(&path, "data_path = [").unwrap();

        assert!(Config::from_file(&path).is_err());
    }
}
