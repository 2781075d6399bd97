//! Error types for stylehold

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

use crate::{HoldId, StylistId, Timestamp, WallClock};

/// Why a booking date/time pair could not be turned into an appointment instant
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidBookingTime {
    #[error("Malformed booking date '{0}': expected YYYY-MM-DD")]
    MalformedDate(String),

    #[error("Malformed booking time '{0}': expected HH:mm")]
    MalformedTime(String),

    #[error("Month {0} out of range (1-12)")]
    MonthOutOfRange(u32),

    #[error("Day {day} out of range for {year}-{month:02}")]
    DayOutOfRange { year: i32, month: u32, day: u32 },

    #[error("Hour {0} out of range (0-23)")]
    HourOutOfRange(u32),

    #[error("Minute {0} out of range (0-59)")]
    MinuteOutOfRange(u32),

    #[error("Local time {0} does not exist in this timezone")]
    NonexistentLocalTime(NaiveDateTime),
}

/// Core error type for stylehold operations
#[derive(Debug, Error)]
pub enum HoldError {
    #[error("Invalid booking time: {0}")]
    InvalidBookingTime(#[from] InvalidBookingTime),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Hold not found: {0}")]
    HoldNotFound(HoldId),

    #[error("Hold expired: {0}")]
    HoldExpired(HoldId),

    #[error("Hold {id} is {status}, not pending")]
    HoldNotPending { id: HoldId, status: String },

    #[error("Slot {date} {time} for stylist '{stylist_id}' is already held")]
    SlotUnavailable {
        stylist_id: StylistId,
        date: NaiveDate,
        time: WallClock,
    },

    #[error("Hold for appointment at {appointment_at} would expire immediately (at {expires_at})")]
    HoldWouldExpireImmediately {
        appointment_at: Timestamp,
        expires_at: Timestamp,
    },

    #[error("Store error: {0}")]
    StoreError(String),
}

impl HoldError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::StoreError(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, HoldError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booking_time_error_converts() {
        let err: HoldError = InvalidBookingTime::MonthOutOfRange(13).into();
        assert!(matches!(
            err,
            HoldError::InvalidBookingTime(InvalidBookingTime::MonthOutOfRange(13))
        ));
        assert_eq!(
            err.to_string(),
            "Invalid booking time: Month 13 out of range (1-12)"
        );
    }

    #[test]
    fn day_out_of_range_message() {
        let err = InvalidBookingTime::DayOutOfRange {
            year: 2025,
            month: 2,
            day: 30,
        };
        assert_eq!(err.to_string(), "Day 30 out of range for 2025-02");
    }
}
