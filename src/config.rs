//! Configuration management for the messaging host.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Chrome rejects native-messaging frames above 1MB in either direction.
pub const BROWSER_FRAME_LIMIT: usize = 1_048_576;

/// Configuration for the messaging host.
///
/// Every field has a default that reproduces the bare, zero-configuration
/// behavior; a config file is never required.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// Maximum message size in bytes (Chrome limit is 1MB)
    pub max_message_size: usize,

    /// Log level for the host (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            max_message_size: BROWSER_FRAME_LIMIT,
            log_level: "info".to_string(),
        }
    }
}

impl HostConfig {
    /// Load configuration from a file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file (JSON or TOML)
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        let config = if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml::from_str(&content)?
        } else {
            // Default to JSON
            serde_json::from_str(&content)?
        };

        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_message_size == 0 {
            return Err(anyhow::anyhow!("max_message_size must be greater than 0"));
        }

        if self.max_message_size > BROWSER_FRAME_LIMIT {
            return Err(anyhow::anyhow!(
                "max_message_size cannot exceed the browser's 1MB frame limit"
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HostConfig::default();
        assert_eq!(config.max_message_size, 1_048_576);
        assert_eq!(config.log_level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = HostConfig::default();

        config.max_message_size = 0;
        assert!(config.validate().is_err());

        config.max_message_size = 2_000_000; // > 1MB
        assert!(config.validate().is_err());

        config.max_message_size = 4096;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_file_operations() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;

        let json_path = dir.path().join("host.json");
        std::fs::write(
            &json_path,
            r#"{"max_message_size": 65536, "log_level": "debug"}"#,
        )?;
        let loaded = HostConfig::from_file(&json_path)?;
        assert_eq!(loaded.max_message_size, 65_536);
        assert_eq!(loaded.log_level, "debug");

        let toml_path = dir.path().join("host.toml");
        std::fs::write(&toml_path, "max_message_size = 1024\nlog_level = \"warn\"\n")?;
        let loaded = HostConfig::from_file(&toml_path)?;
        assert_eq!(loaded.max_message_size, 1024);
        assert_eq!(loaded.log_level, "warn");

        Ok(())
    }
}
