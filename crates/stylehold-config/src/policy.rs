//! Validated policy structures

use crate::schema::{RawConfig, RawServiceConfig, RawStylist};
use std::path::PathBuf;
use std::time::Duration;
use stylehold_util::{HoldError, StylistId, default_data_dir};

/// Default lead time before the appointment, in minutes
pub const DEFAULT_BUFFER_MINUTES: u32 = 30;

/// Default longest hold lifetime, in minutes
pub const DEFAULT_WINDOW_MINUTES: u32 = 120;

/// Default sweep cadence
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// The two deadlines a hold's expiry is bounded by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryPolicy {
    /// A hold must have lapsed this long before the appointment starts
    pub buffer_minutes: u32,

    /// A hold never lives longer than this after it was placed
    pub default_window_minutes: u32,
}

impl ExpiryPolicy {
    pub const fn new(buffer_minutes: u32, default_window_minutes: u32) -> Self {
        Self {
            buffer_minutes,
            default_window_minutes,
        }
    }

    /// Build from caller-supplied signed values, rejecting negatives
    pub fn from_signed(buffer_minutes: i64, default_window_minutes: i64) -> Result<Self, HoldError> {
        Ok(Self {
            buffer_minutes: minutes_from_signed("buffer_minutes", buffer_minutes)?,
            default_window_minutes: minutes_from_signed(
                "default_window_minutes",
                default_window_minutes,
            )?,
        })
    }

    /// Apply optional overrides on top of `self`
    fn overridden(self, buffer_minutes: Option<i64>, default_window_minutes: Option<i64>) -> Self {
        Self {
            buffer_minutes: to_minutes(buffer_minutes).unwrap_or(self.buffer_minutes),
            default_window_minutes: to_minutes(default_window_minutes)
                .unwrap_or(self.default_window_minutes),
        }
    }
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_MINUTES, DEFAULT_WINDOW_MINUTES)
    }
}

fn minutes_from_signed(field: &str, value: i64) -> Result<u32, HoldError> {
    if value < 0 {
        return Err(HoldError::config(format!(
            "{} must not be negative, got {}",
            field, value
        )));
    }
    u32::try_from(value)
        .map_err(|_| HoldError::config(format!("{} is too large, got {}", field, value)))
}

// Only called on validated configs; out-of-range values fall back to the default.
fn to_minutes(value: Option<i64>) -> Option<u32> {
    value.and_then(|v| u32::try_from(v).ok())
}

/// Validated policy ready for use by the hold manager
#[derive(Debug, Clone, Default)]
pub struct Policy {
    /// Service configuration
    pub service: ServiceConfig,

    /// Expiry settings for stylists without an override
    pub expiry: ExpiryPolicy,

    /// Stylists with their effective expiry settings
    pub stylists: Vec<StylistPolicy>,
}

impl Policy {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        let expiry = ExpiryPolicy::default().overridden(
            raw.expiry.buffer_minutes,
            raw.expiry.default_window_minutes,
        );

        let stylists = raw
            .stylists
            .into_iter()
            .map(|s| StylistPolicy::from_raw(s, expiry))
            .collect();

        Self {
            service: ServiceConfig::from_raw(raw.service),
            expiry,
            stylists,
        }
    }

    /// Get stylist override by ID
    pub fn get_stylist(&self, id: &StylistId) -> Option<&StylistPolicy> {
        self.stylists.iter().find(|s| &s.id == id)
    }

    /// Effective expiry settings for a stylist
    pub fn expiry_for(&self, id: &StylistId) -> ExpiryPolicy {
        self.get_stylist(id).map(|s| s.expiry).unwrap_or(self.expiry)
    }
}

/// Service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub data_dir: PathBuf,
    pub sweep_interval: Duration,
}

impl ServiceConfig {
    fn from_raw(raw: RawServiceConfig) -> Self {
        Self {
            data_dir: raw.data_dir.unwrap_or_else(default_data_dir),
            sweep_interval: raw
                .sweep_interval_seconds
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_SWEEP_INTERVAL),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

/// Validated stylist definition
#[derive(Debug, Clone)]
pub struct StylistPolicy {
    pub id: StylistId,
    pub label: Option<String>,
    pub expiry: ExpiryPolicy,
}

impl StylistPolicy {
    fn from_raw(raw: RawStylist, defaults: ExpiryPolicy) -> Self {
        Self {
            id: StylistId::new(raw.id),
            label: raw.label,
            expiry: defaults.overridden(raw.buffer_minutes, raw.default_window_minutes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_config;

    #[test]
    fn default_policy_is_thirty_and_one_twenty() {
        let policy = ExpiryPolicy::default();
        assert_eq!(policy.buffer_minutes, 30);
        assert_eq!(policy.default_window_minutes, 120);
    }

    #[test]
    fn from_signed_rejects_negative() {
        assert_eq!(
            ExpiryPolicy::from_signed(15, 60).unwrap(),
            ExpiryPolicy::new(15, 60)
        );
        assert!(matches!(
            ExpiryPolicy::from_signed(-1, 60),
            Err(HoldError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            ExpiryPolicy::from_signed(30, -120),
            Err(HoldError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn stylist_overrides_inherit_unset_fields() {
        let policy = parse_config(
            r#"
            config_version = 1

            [expiry]
            buffer_minutes = 20
            default_window_minutes = 90

            [[stylists]]
            id = "ana"
            buffer_minutes = 60

            [[stylists]]
            id = "bea"
            default_window_minutes = 15
            "#,
        )
        .unwrap();

        assert_eq!(policy.expiry, ExpiryPolicy::new(20, 90));
        assert_eq!(policy.expiry_for(&StylistId::new("ana")), ExpiryPolicy::new(60, 90));
        assert_eq!(policy.expiry_for(&StylistId::new("bea")), ExpiryPolicy::new(20, 15));
        assert_eq!(policy.expiry_for(&StylistId::new("cleo")), ExpiryPolicy::new(20, 90));
    }

    #[test]
    fn service_defaults_apply() {
        let policy = parse_config("config_version = 1").unwrap();
        assert_eq!(policy.service.sweep_interval, DEFAULT_SWEEP_INTERVAL);
        assert!(policy.service.data_dir.to_string_lossy().contains("stylehold"));
    }
}
