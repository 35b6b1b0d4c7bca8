//! Configuration management for checkin-token.

pub mod paths;
pub mod settings;

pub use paths::config_file;
pub use settings::{CheckinConfig, HttpSettings, ProviderSettings};

use std::path::Path;

use crate::error::Result;

/// Load configuration from `path`, or from the default config file when `None`.
pub fn load_config(path: Option<&Path>) -> Result<CheckinConfig> {
    match path {
        Some(path) => load_config_from(path),
        None => load_config_from(&config_file()?),
    }
}

/// Load configuration from a specific path.
///
/// If the file doesn't exist, returns default configuration.
pub fn load_config_from(path: &Path) -> Result<CheckinConfig> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "No config file, using defaults");
        return Ok(CheckinConfig::default().with_env_overrides());
    }

    let contents = std::fs::read_to_string(path)?;
    let config: CheckinConfig = toml::from_str(&contents)?;

    Ok(config.with_env_overrides())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CheckinError;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = load_config(Some(&temp_dir.path().join("absent.toml"))).unwrap();

        assert_eq!(config.polling.timeout_secs, 900);
        assert_eq!(config.http.timeout_secs, 30);
    }

    #[test]
    fn reads_partial_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[client]
audience = "interlink"

[polling]
timeout_secs = 300
"#,
        )
        .unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.client.audience.as_deref(), Some("interlink"));
        assert_eq!(config.polling.timeout_secs, 300);
        assert_eq!(config.http.timeout_secs, 30);
    }

    #[test]
    fn malformed_file_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[client\nclient_id = ").unwrap();

        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, CheckinError::ConfigRead(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }
}
