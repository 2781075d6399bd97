//! Configuration validation

use crate::schema::{RawConfig, RawStylist};
use std::collections::HashSet;
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{scope}: {field} must not be negative (got {value})")]
    NegativeMinutes {
        scope: String,
        field: &'static str,
        value: i64,
    },

    #[error("{scope}: {field} is too large (got {value})")]
    MinutesOutOfRange {
        scope: String,
        field: &'static str,
        value: i64,
    },

    #[error("Stylist '{stylist_id}': {message}")]
    StylistError { stylist_id: String, message: String },

    #[error("Duplicate stylist ID: {0}")]
    DuplicateStylistId(String),

    #[error("sweep_interval_seconds must be at least 1")]
    ZeroSweepInterval,
}

/// Validate a raw configuration, collecting every problem found
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if config.service.sweep_interval_seconds == Some(0) {
        errors.push(ValidationError::ZeroSweepInterval);
    }

    errors.extend(check_minutes(
        "expiry",
        "buffer_minutes",
        config.expiry.buffer_minutes,
    ));
    errors.extend(check_minutes(
        "expiry",
        "default_window_minutes",
        config.expiry.default_window_minutes,
    ));

    let mut seen_ids = HashSet::new();
    for stylist in &config.stylists {
        if !seen_ids.insert(&stylist.id) {
            errors.push(ValidationError::DuplicateStylistId(stylist.id.clone()));
        }
    }

    for stylist in &config.stylists {
        errors.extend(validate_stylist(stylist));
    }

    errors
}

fn validate_stylist(stylist: &RawStylist) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if stylist.id.trim().is_empty() {
        errors.push(ValidationError::StylistError {
            stylist_id: stylist.id.clone(),
            message: "id cannot be empty".into(),
        });
    }

    let scope = format!("stylist '{}'", stylist.id);
    errors.extend(check_minutes(&scope, "buffer_minutes", stylist.buffer_minutes));
    errors.extend(check_minutes(
        &scope,
        "default_window_minutes",
        stylist.default_window_minutes,
    ));

    errors
}

fn check_minutes(scope: &str, field: &'static str, value: Option<i64>) -> Option<ValidationError> {
    let value = value?;
    if value < 0 {
        Some(ValidationError::NegativeMinutes {
            scope: scope.to_string(),
            field,
            value,
        })
    } else if u32::try_from(value).is_err() {
        Some(ValidationError::MinutesOutOfRange {
            scope: scope.to_string(),
            field,
            value,
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{RawExpiryConfig, RawServiceConfig};

    fn stylist(id: &str, buffer: Option<i64>) -> RawStylist {
        RawStylist {
            id: id.into(),
            label: None,
            buffer_minutes: buffer,
            default_window_minutes: None,
        }
    }

    fn config_with(expiry: RawExpiryConfig, stylists: Vec<RawStylist>) -> RawConfig {
        RawConfig {
            config_version: 1,
            service: RawServiceConfig::default(),
            expiry,
            stylists,
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = config_with(RawExpiryConfig::default(), vec![]);
        assert!(validate_config(&config).is_empty());
    }

    #[test]
    fn test_negative_minutes_rejected() {
        let config = config_with(
            RawExpiryConfig {
                buffer_minutes: Some(-1),
                default_window_minutes: Some(-30),
            },
            vec![],
        );

        let errors = validate_config(&config);
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| matches!(e, ValidationError::NegativeMinutes { .. })));
    }

    #[test]
    fn test_zero_minutes_accepted() {
        let config = config_with(
            RawExpiryConfig {
                buffer_minutes: Some(0),
                default_window_minutes: Some(0),
            },
            vec![],
        );
        assert!(validate_config(&config).is_empty());
    }

    #[test]
    fn test_oversized_minutes_rejected() {
        let config = config_with(
            RawExpiryConfig {
                buffer_minutes: Some(i64::from(u32::MAX) + 1),
                default_window_minutes: None,
            },
            vec![],
        );

        let errors = validate_config(&config);
        assert!(matches!(
            errors.as_slice(),
            [ValidationError::MinutesOutOfRange { field: "buffer_minutes", .. }]
        ));
    }

    #[test]
    fn test_duplicate_stylist_detection() {
        let config = config_with(
            RawExpiryConfig::default(),
            vec![stylist("ana", None), stylist("ana", Some(10))],
        );

        let errors = validate_config(&config);
        assert!(errors.iter().any(|e| matches!(e, ValidationError::DuplicateStylistId(_))));
    }

    #[test]
    fn test_stylist_override_checked() {
        let config = config_with(
            RawExpiryConfig::default(),
            vec![stylist("", Some(-10))],
        );

        let errors = validate_config(&config);
        assert!(errors.iter().any(|e| matches!(e, ValidationError::StylistError { .. })));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::NegativeMinutes { .. })));
    }

    #[test]
    fn test_zero_sweep_interval_rejected() {
        let mut config = config_with(RawExpiryConfig::default(), vec![]);
        config.service.sweep_interval_seconds = Some(0);

        assert_eq!(validate_config(&config), vec![ValidationError::ZeroSweepInterval]);
    }
}
