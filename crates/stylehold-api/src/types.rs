//! Shared types for the stylehold API

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use stylehold_util::{ClientId, HoldId, StylistId, Timestamp, WallClock};
use thiserror::Error;

/// Lifecycle state of a hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoldStatus {
    /// Awaiting client confirmation/payment; blocks the slot until `expires_at`
    Pending,
    /// Booking went through; the slot stays taken
    Confirmed,
    /// Client gave the slot back before expiry
    Released,
    /// Expiry passed while still pending
    Expired,
}

impl HoldStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HoldStatus::Pending => "pending",
            HoldStatus::Confirmed => "confirmed",
            HoldStatus::Released => "released",
            HoldStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for HoldStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown hold status: {0}")]
pub struct UnknownHoldStatus(pub String);

impl FromStr for HoldStatus {
    type Err = UnknownHoldStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(HoldStatus::Pending),
            "confirmed" => Ok(HoldStatus::Confirmed),
            "released" => Ok(HoldStatus::Released),
            "expired" => Ok(HoldStatus::Expired),
            other => Err(UnknownHoldStatus(other.to_string())),
        }
    }
}

/// A hold on one stylist's appointment slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldRecord {
    pub id: HoldId,
    pub stylist_id: StylistId,
    pub client_id: ClientId,
    pub booking_date: NaiveDate,
    pub booking_time: WallClock,
    /// Appointment start, resolved from date + time in the business timezone
    pub appointment_at: Timestamp,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    pub status: HoldStatus,
}

impl HoldRecord {
    /// Pending and past its deadline, waiting for a sweep
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        self.status == HoldStatus::Pending && self.expires_at <= now
    }

    /// Whether this hold still blocks its slot at `now`
    pub fn is_live_at(&self, now: Timestamp) -> bool {
        match self.status {
            HoldStatus::Pending => now < self.expires_at,
            HoldStatus::Confirmed => true,
            HoldStatus::Released | HoldStatus::Expired => false,
        }
    }

    /// Time left before a pending hold lapses
    pub fn time_remaining(&self, now: Timestamp) -> Duration {
        self.expires_at.saturating_duration_since(now)
    }
}

/// A request to hold a slot, as submitted by the booking form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldRequest {
    pub stylist_id: StylistId,
    pub client_id: ClientId,
    /// `YYYY-MM-DD`
    pub booking_date: String,
    /// `HH:mm`, 24-hour
    pub booking_time: String,
}

/// Selection criteria for listing holds
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldFilter {
    pub status: Option<HoldStatus>,
    pub stylist_id: Option<StylistId>,
}

impl HoldFilter {
    pub fn with_status(status: HoldStatus) -> Self {
        Self {
            status: Some(status),
            stylist_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_hold(status: HoldStatus, expires_at: i64) -> HoldRecord {
        HoldRecord {
            id: HoldId::new(),
            stylist_id: StylistId::new("ana"),
            client_id: ClientId::new("client-1"),
            booking_date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            booking_time: WallClock::new(14, 30).unwrap(),
            appointment_at: Timestamp::from_millis(10_000_000),
            created_at: Timestamp::from_millis(0),
            expires_at: Timestamp::from_millis(expires_at),
            status,
        }
    }

    #[test]
    fn pending_hold_expires_at_deadline() {
        let hold = make_hold(HoldStatus::Pending, 1_000);
        assert!(!hold.is_expired_at(Timestamp::from_millis(999)));
        assert!(hold.is_expired_at(Timestamp::from_millis(1_000)));
        assert!(hold.is_live_at(Timestamp::from_millis(999)));
        assert!(!hold.is_live_at(Timestamp::from_millis(1_000)));
    }

    #[test]
    fn confirmed_hold_never_expires() {
        let hold = make_hold(HoldStatus::Confirmed, 1_000);
        assert!(!hold.is_expired_at(Timestamp::from_millis(5_000)));
        assert!(hold.is_live_at(Timestamp::from_millis(5_000)));
    }

    #[test]
    fn terminal_holds_do_not_block() {
        for status in [HoldStatus::Released, HoldStatus::Expired] {
            let hold = make_hold(status, 1_000);
            assert!(!hold.is_live_at(Timestamp::from_millis(0)));
            assert!(!hold.is_expired_at(Timestamp::from_millis(5_000)));
        }
    }

    #[test]
    fn status_string_forms_agree() {
        for status in [
            HoldStatus::Pending,
            HoldStatus::Confirmed,
            HoldStatus::Released,
            HoldStatus::Expired,
        ] {
            assert_eq!(status.as_str().parse::<HoldStatus>().unwrap(), status);
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
        assert!("cancelled".parse::<HoldStatus>().is_err());
    }

    #[test]
    fn time_remaining_saturates() {
        let hold = make_hold(HoldStatus::Pending, 60_000);
        assert_eq!(
            hold.time_remaining(Timestamp::from_millis(0)),
            Duration::from_secs(60)
        );
        assert_eq!(
            hold.time_remaining(Timestamp::from_millis(90_000)),
            Duration::ZERO
        );
    }
}
