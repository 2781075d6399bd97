//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Service-level settings
    #[serde(default)]
    pub service: RawServiceConfig,

    /// Default hold expiry settings
    #[serde(default)]
    pub expiry: RawExpiryConfig,

    /// Per-stylist overrides
    #[serde(default)]
    pub stylists: Vec<RawStylist>,
}

/// Service-level settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawServiceConfig {
    /// Data directory for the hold store
    pub data_dir: Option<PathBuf>,

    /// How often the sweeper looks for lapsed holds
    pub sweep_interval_seconds: Option<u64>,
}

/// Hold expiry settings.
///
/// Minutes are signed here so that negative values reach validation
/// instead of failing as an opaque TOML type error.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawExpiryConfig {
    /// Lead time before the appointment by which a hold must have lapsed
    pub buffer_minutes: Option<i64>,

    /// Longest a hold may live, measured from when it was placed
    pub default_window_minutes: Option<i64>,
}

/// Per-stylist override of the expiry settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawStylist {
    /// Stylist ID as used in hold requests
    pub id: String,

    /// Display name
    pub label: Option<String>,

    pub buffer_minutes: Option<i64>,

    pub default_window_minutes: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
            config_version = 1

            [service]
            data_dir = "/var/lib/stylehold"
            sweep_interval_seconds = 30

            [expiry]
            buffer_minutes = 45
            default_window_minutes = 90

            [[stylists]]
            id = "ana"
            label = "Ana"
            buffer_minutes = 60
        "#;

        let config: RawConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.service.sweep_interval_seconds, Some(30));
        assert_eq!(config.expiry.buffer_minutes, Some(45));
        assert_eq!(config.stylists.len(), 1);
        assert_eq!(config.stylists[0].buffer_minutes, Some(60));
        assert_eq!(config.stylists[0].default_window_minutes, None);
    }

    #[test]
    fn sections_are_optional() {
        let config: RawConfig = toml::from_str("config_version = 1").unwrap();
        assert!(config.stylists.is_empty());
        assert!(config.expiry.buffer_minutes.is_none());
        assert!(config.service.data_dir.is_none());
    }

    #[test]
    fn negative_minutes_survive_parsing() {
        let toml_str = r#"
            config_version = 1

            [expiry]
            buffer_minutes = -5
        "#;

        let config: RawConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.expiry.buffer_minutes, Some(-5));
    }
}
