use crate::db::DaoOptions;
use crate::error::{PriorityError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Name of the optional config file inside a data directory.
pub const CONFIG_FILE: &str = "prioritytime.yaml";

/// Settings read from `prioritytime.yaml`. Every field has a default, so the
/// file itself is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Database file, relative to the data directory.
    pub database: String,
    pub busy_timeout_ms: u64,
    pub wal: bool,
    /// How often `watch` looks for commits from other processes.
    pub poll_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database: "prioritytime.db".to_string(),
            busy_timeout_ms: 5000,
            wal: true,
            poll_interval_ms: 200,
        }
    }
}

impl Config {
    /// Load `prioritytime.yaml` from `data_dir`, falling back to defaults
    /// when it does not exist.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(CONFIG_FILE);
        if !path.exists() {
            log::debug!("No {CONFIG_FILE} in {}, using defaults", data_dir.display());
            return Ok(Config::default());
        }
        let content = std::fs::read_to_string(&path)?;
        parse_config_str(&content)
    }

    pub fn dao_options(&self) -> DaoOptions {
        DaoOptions {
            busy_timeout: Duration::from_millis(self.busy_timeout_ms),
            wal: self.wal,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    fn validate(&self) -> Result<()> {
        if self.database.trim().is_empty() {
            return Err(PriorityError::Config("database must not be empty".into()));
        }
        if self.poll_interval_ms == 0 {
            return Err(PriorityError::Config(
                "poll_interval_ms must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

/// Parse a config YAML string.
pub fn parse_config_str(content: &str) -> Result<Config> {
    // An empty file deserializes to unit, not to a mapping.
    if content.trim().is_empty() {
        return Ok(Config::default());
    }
    let config: Config = serde_yaml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(Config::load(tmp.path()).unwrap(), Config::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let config = parse_config_str("database: tasks.db\nwal: false\n").unwrap();
        assert_eq!(config.database, "tasks.db");
        assert!(!config.wal);
        assert_eq!(config.busy_timeout_ms, 5000);
        assert_eq!(config.poll_interval(), Duration::from_millis(200));
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        assert_eq!(parse_config_str("\n").unwrap(), Config::default());
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let err = parse_config_str("databse: typo.db\n").unwrap_err();
        assert!(matches!(err, PriorityError::Yaml(_)));
    }

    #[test]
    fn test_zero_poll_interval_is_rejected() {
        let err = parse_config_str("poll_interval_ms: 0\n").unwrap_err();
        assert!(matches!(err, PriorityError::Config(_)));
    }

    #[test]
    fn test_load_reads_file() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(CONFIG_FILE), "busy_timeout_ms: 50\n").unwrap();

        let config = Config::load(tmp.path()).unwrap();
        assert_eq!(config.dao_options().busy_timeout, Duration::from_millis(50));
    }
}
