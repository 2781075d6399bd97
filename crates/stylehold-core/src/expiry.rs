//! Hold expiry calculation
//!
//! A pending hold must satisfy two deadlines at once:
//! - it lapses at least `buffer_minutes` before the appointment starts, so
//!   the slot can be re-offered;
//! - it never lives longer than `default_window_minutes` after it was placed,
//!   so far-future appointments are not blocked for days.
//!
//! The expiry is the earlier of the two. Everything here is pure: "now" is an
//! argument or comes from an injected [`Clock`].

use chrono::{Local, TimeZone};
use stylehold_config::ExpiryPolicy;
use stylehold_util::{Clock, Result, Timestamp};
use tracing::debug;

use crate::BookingSlot;

/// Which of the two deadlines decided the expiry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryBound {
    /// Appointment start minus the buffer
    Buffer,
    /// Now plus the default window
    Window,
}

impl ExpiryBound {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpiryBound::Buffer => "buffer",
            ExpiryBound::Window => "window",
        }
    }
}

/// A resolved hold expiry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expiry {
    pub expires_at: Timestamp,
    pub bound: ExpiryBound,
}

/// Resolve the expiry for an appointment at `appointment_at`, held at `now`.
///
/// Ties go to the buffer bound; the instant is the same either way.
pub fn resolve_expiry(appointment_at: Timestamp, now: Timestamp, policy: &ExpiryPolicy) -> Expiry {
    let buffer_bound = appointment_at.saturating_sub_minutes(policy.buffer_minutes);
    let window_bound = now.saturating_add_minutes(policy.default_window_minutes);

    if buffer_bound <= window_bound {
        Expiry {
            expires_at: buffer_bound,
            bound: ExpiryBound::Buffer,
        }
    } else {
        Expiry {
            expires_at: window_bound,
            bound: ExpiryBound::Window,
        }
    }
}

/// `min(appointment_at - buffer, now + window)`
pub fn expiry_deadline(appointment_at: Timestamp, now: Timestamp, policy: &ExpiryPolicy) -> Timestamp {
    resolve_expiry(appointment_at, now, policy).expires_at
}

/// Compute the expiry for a `YYYY-MM-DD` / `HH:mm` booking in `tz`, as of `now`.
pub fn compute_booking_expiry_in<Tz: TimeZone>(
    booking_date: &str,
    booking_time: &str,
    policy: &ExpiryPolicy,
    now: Timestamp,
    tz: &Tz,
) -> Result<Timestamp> {
    let slot = BookingSlot::parse(booking_date, booking_time)?;
    let appointment_at = slot.appointment_in(tz)?;
    let expiry = resolve_expiry(appointment_at, now, policy);

    debug!(
        slot = %slot,
        appointment_at = %appointment_at,
        now = %now,
        expires_at = %expiry.expires_at,
        bound = expiry.bound.as_str(),
        "Booking expiry computed"
    );

    Ok(expiry.expires_at)
}

/// Compute the expiry for a booking in local time with an explicit policy
pub fn compute_booking_expiry_with(
    booking_date: &str,
    booking_time: &str,
    policy: &ExpiryPolicy,
    clock: &dyn Clock,
) -> Result<Timestamp> {
    compute_booking_expiry_in(booking_date, booking_time, policy, clock.now(), &Local)
}

/// Compute the expiry for a booking in local time with the default
/// 30 minute buffer and 120 minute window
pub fn compute_booking_expiry(
    booking_date: &str,
    booking_time: &str,
    clock: &dyn Clock,
) -> Result<Timestamp> {
    compute_booking_expiry_with(booking_date, booking_time, &ExpiryPolicy::default(), clock)
}
