//! Time utilities for stylehold
//!
//! Provides the millisecond [`Timestamp`] every hold deadline is expressed in,
//! the injectable [`Clock`] capability, and parsing for the booking date and
//! wall-clock strings clients submit.
//!
//! # Mock Time for Development
//!
//! In debug builds, the `STYLEHOLD_MOCK_TIME` environment variable can be set
//! to override the time reported by [`SystemClock`]. This is useful for
//! exercising hold expiry against a fixed calendar.
//!
//! Format: `YYYY-MM-DD HH:MM:SS` (e.g., `2025-12-25 14:30:00`), local time.
//!
//! Example:
//! ```bash
//! STYLEHOLD_MOCK_TIME="2025-12-25 14:30:00" stylehold sweep
//! ```

use chrono::{
    DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeZone, Utc,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use crate::InvalidBookingTime;

/// Environment variable name for mock time (debug builds only)
pub const MOCK_TIME_ENV_VAR: &str = "STYLEHOLD_MOCK_TIME";

const MILLIS_PER_MINUTE: i64 = 60_000;

/// Cached mock time offset from the real time when the process started.
/// This allows mock time to advance naturally.
static MOCK_TIME_OFFSET: OnceLock<Option<chrono::Duration>> = OnceLock::new();

/// Format accepted by `STYLEHOLD_MOCK_TIME`
const MOCK_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a mock time value as a local date-time
#[cfg_attr(not(debug_assertions), allow(dead_code))]
fn parse_mock_time(mock_time: &str) -> Option<DateTime<Local>> {
    let Ok(naive_dt) = NaiveDateTime::parse_from_str(mock_time, MOCK_TIME_FORMAT) else {
        tracing::warn!(
            mock_time,
            expected_format = MOCK_TIME_FORMAT,
            "Invalid mock time format"
        );
        return None;
    };

    let mock_dt = Local.from_local_datetime(&naive_dt).single();
    if mock_dt.is_none() {
        tracing::warn!(mock_time, "Failed to convert mock time to local timezone");
    }
    mock_dt
}

/// Offset that moves `real_now` onto `mock_time`
#[cfg_attr(not(debug_assertions), allow(dead_code))]
fn mock_time_offset(mock_time: &str, real_now: DateTime<Local>) -> Option<chrono::Duration> {
    let mock_dt = parse_mock_time(mock_time)?;
    Some(mock_dt.signed_duration_since(real_now))
}

/// Initialize the mock time offset based on the environment variable.
/// Returns the offset between mock time and real time at process start.
#[allow(clippy::disallowed_methods)] // This is the internal implementation that wraps Local::now()
fn get_mock_time_offset() -> Option<chrono::Duration> {
    *MOCK_TIME_OFFSET.get_or_init(|| {
        #[cfg(debug_assertions)]
        {
            let mock_time = std::env::var(MOCK_TIME_ENV_VAR).ok()?;
            let offset = mock_time_offset(&mock_time, chrono::Local::now())?;
            tracing::info!(
                mock_time = %mock_time,
                offset_secs = offset.num_seconds(),
                "Mock time enabled"
            );
            Some(offset)
        }
        #[cfg(not(debug_assertions))]
        {
            None
        }
    })
}

/// Returns whether mock time is currently active.
pub fn is_mock_time_active() -> bool {
    get_mock_time_offset().is_some()
}

/// Get the current local time, respecting mock time settings in debug builds.
#[allow(clippy::disallowed_methods)] // This is the wrapper that provides mock time support
pub fn now() -> DateTime<Local> {
    let real_now = chrono::Local::now();

    if let Some(offset) = get_mock_time_offset() {
        real_now + offset
    } else {
        real_now
    }
}

/// An absolute point in time with millisecond resolution (Unix epoch based).
///
/// Holds, appointments and "now" are all compared as `Timestamp`s; conversion
/// to zoned `chrono` types only happens at display and parsing boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    pub const fn as_millis(self) -> i64 {
        self.0
    }

    pub fn from_datetime<Tz: TimeZone>(dt: &DateTime<Tz>) -> Self {
        Self(dt.timestamp_millis())
    }

    /// `None` when the value is outside the range chrono can represent
    pub fn to_utc(self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.0)
    }

    pub fn to_local(self) -> Option<DateTime<Local>> {
        self.to_utc().map(|dt| dt.with_timezone(&Local))
    }

    pub fn saturating_add_minutes(self, minutes: u32) -> Self {
        Self(self.0.saturating_add(i64::from(minutes) * MILLIS_PER_MINUTE))
    }

    pub fn saturating_sub_minutes(self, minutes: u32) -> Self {
        Self(self.0.saturating_sub(i64::from(minutes) * MILLIS_PER_MINUTE))
    }

    pub fn saturating_add(self, d: Duration) -> Self {
        let millis = i64::try_from(d.as_millis()).unwrap_or(i64::MAX);
        Self(self.0.saturating_add(millis))
    }

    /// Returns duration until `self`, or zero if `self` is not after `from`
    pub fn saturating_duration_since(self, from: Timestamp) -> Duration {
        let delta = self.0.saturating_sub(from.0);
        Duration::from_millis(u64::try_from(delta).unwrap_or(0))
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Timestamp {
    fn from(dt: DateTime<Tz>) -> Self {
        Self::from_datetime(&dt)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_utc() {
            Some(dt) => write!(f, "{}", dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
            None => write!(f, "{}ms", self.0),
        }
    }
}

/// Source of the current instant.
///
/// Everything that needs "now" takes a `Clock` so tests can pin time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall clock, honoring `STYLEHOLD_MOCK_TIME` in debug builds
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_datetime(&now())
    }
}

/// A clock that only moves when told to
#[derive(Debug)]
pub struct FixedClock {
    millis: AtomicI64,
}

impl FixedClock {
    pub fn new(at: Timestamp) -> Self {
        Self {
            millis: AtomicI64::new(at.as_millis()),
        }
    }

    pub fn at<Tz: TimeZone>(dt: &DateTime<Tz>) -> Self {
        Self::new(Timestamp::from_datetime(dt))
    }

    pub fn set(&self, at: Timestamp) {
        self.millis.store(at.as_millis(), Ordering::SeqCst);
    }

    pub fn advance(&self, d: Duration) {
        let next = self.now().saturating_add(d);
        self.set(next);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_millis(self.millis.load(Ordering::SeqCst))
    }
}

/// Wall-clock time of day (24-hour, minute resolution)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WallClock {
    hour: u8,
    minute: u8,
}

impl WallClock {
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self { hour, minute })
        } else {
            None
        }
    }

    /// Parse an `HH:mm` string, reporting which field is wrong
    pub fn parse(s: &str) -> Result<Self, InvalidBookingTime> {
        let malformed = || InvalidBookingTime::MalformedTime(s.to_string());

        let (hour, minute) = s.split_once(':').ok_or_else(malformed)?;
        let hour = parse_digits(hour, 2).ok_or_else(malformed)?;
        let minute = parse_digits(minute, 2).ok_or_else(malformed)?;

        if hour >= 24 {
            return Err(InvalidBookingTime::HourOutOfRange(hour));
        }
        if minute >= 60 {
            return Err(InvalidBookingTime::MinuteOutOfRange(minute));
        }

        Ok(Self {
            hour: hour as u8,
            minute: minute as u8,
        })
    }

    pub fn to_naive_time(self) -> NaiveTime {
        NaiveTime::from_hms_opt(u32::from(self.hour), u32::from(self.minute), 0)
            .unwrap_or(NaiveTime::MIN)
    }

    fn seconds_from_midnight(&self) -> u32 {
        u32::from(self.hour) * 3600 + u32::from(self.minute) * 60
    }
}

impl PartialOrd for WallClock {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for WallClock {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.seconds_from_midnight()
            .cmp(&other.seconds_from_midnight())
    }
}

impl fmt::Display for WallClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for WallClock {
    type Err = InvalidBookingTime;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for WallClock {
    type Error = InvalidBookingTime;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<WallClock> for String {
    fn from(w: WallClock) -> Self {
        w.to_string()
    }
}

/// Parse a `YYYY-MM-DD` booking date.
///
/// Month is 1-based as written; the calendar decides whether the day exists.
pub fn parse_booking_date(s: &str) -> Result<NaiveDate, InvalidBookingTime> {
    let malformed = || InvalidBookingTime::MalformedDate(s.to_string());

    let mut parts = s.split('-');
    let (Some(year), Some(month), Some(day), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(malformed());
    };

    if year.len() != 4 {
        return Err(malformed());
    }
    let year = parse_digits(year, 4).ok_or_else(malformed)? as i32;
    let month = parse_digits(month, 2).ok_or_else(malformed)?;
    let day = parse_digits(day, 2).ok_or_else(malformed)?;

    if !(1..=12).contains(&month) {
        return Err(InvalidBookingTime::MonthOutOfRange(month));
    }

    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or(InvalidBookingTime::DayOutOfRange { year, month, day })
}

/// Parse 1 to `max_digits` ASCII digits. Signs and whitespace are rejected.
fn parse_digits(s: &str, max_digits: usize) -> Option<u32> {
    if s.is_empty() || s.len() > max_digits || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Format a DateTime for display with full date and time.
pub fn format_datetime_full<Tz: TimeZone>(dt: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Helper to format durations in human-readable form
pub fn format_duration(d: Duration) -> String {
    let total_secs = d.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}
