//! Platform-specific path utilities for checkin-token.

use std::path::PathBuf;

use crate::error::{CheckinError, Result};

/// Get the configuration directory for checkin-token.
///
/// - Linux: `~/.config/checkin-token`
/// - macOS: `~/Library/Application Support/checkin-token`
/// - Windows: `%APPDATA%\checkin-token`
pub fn config_dir() -> Result<PathBuf> {
    let base = dirs::config_dir()
        .ok_or_else(|| CheckinError::Config("Cannot determine config directory".to_string()))?;
    Ok(base.join("checkin-token"))
}

/// Get the main configuration file path.
pub fn config_file() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}
