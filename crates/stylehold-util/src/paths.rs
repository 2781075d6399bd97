//! Default paths for stylehold components
//!
//! Paths are user-writable by default (no root required):
//! - Config: `$XDG_CONFIG_HOME/stylehold/config.toml` or `~/.config/stylehold/config.toml`
//! - Data: `$XDG_DATA_HOME/stylehold` or `~/.local/share/stylehold`

use std::path::PathBuf;

/// Environment variable for overriding the data directory
pub const STYLEHOLD_DATA_DIR_ENV: &str = "STYLEHOLD_DATA_DIR";

/// Environment variable for overriding the config file path
pub const STYLEHOLD_CONFIG_ENV: &str = "STYLEHOLD_CONFIG";

/// Database filename within the data directory
pub const DB_FILENAME: &str = "stylehold.db";

/// Application subdirectory name
const APP_DIR: &str = "stylehold";

/// Get the default configuration file path.
///
/// Order of precedence:
/// 1. `$XDG_CONFIG_HOME/stylehold/config.toml` (if XDG_CONFIG_HOME is set)
/// 2. `~/.config/stylehold/config.toml` (fallback)
pub fn default_config_path() -> PathBuf {
    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home).join(APP_DIR).join("config.toml");
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join("config.toml");
    }

    PathBuf::from("/etc").join(APP_DIR).join("config.toml")
}

/// Get the default data directory.
///
/// Order of precedence:
/// 1. `$XDG_DATA_HOME/stylehold` (if XDG_DATA_HOME is set)
/// 2. `~/.local/share/stylehold` (fallback)
///
/// `$STYLEHOLD_DATA_DIR` is read by the CLI and wins over both this and
/// `service.data_dir` from the config file.
pub fn default_data_dir() -> PathBuf {
    if let Ok(data_home) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(data_home).join(APP_DIR);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(APP_DIR);
    }

    // Last resort
    PathBuf::from("/tmp").join(APP_DIR).join("data")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_is_toml_under_app_dir() {
        let path = default_config_path();
        assert!(path.to_string_lossy().contains("stylehold"));
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("toml"));
    }

    #[test]
    fn data_dir_contains_stylehold() {
        let path = default_data_dir();
        assert!(path.to_string_lossy().contains("stylehold"));
    }
}
