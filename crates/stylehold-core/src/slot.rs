//! Booking slots: the local date and wall-clock time a client asked for

use chrono::{NaiveDate, NaiveDateTime, TimeZone};
use std::fmt;
use stylehold_util::{InvalidBookingTime, Timestamp, WallClock, parse_booking_date};

/// A requested appointment start in business-local time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BookingSlot {
    date: NaiveDate,
    time: WallClock,
}

impl BookingSlot {
    /// Parse a `YYYY-MM-DD` date and an `HH:mm` time.
    ///
    /// Every field is range-checked; nothing rolls over into the next
    /// month or day.
    pub fn parse(booking_date: &str, booking_time: &str) -> Result<Self, InvalidBookingTime> {
        Ok(Self {
            date: parse_booking_date(booking_date)?,
            time: WallClock::parse(booking_time)?,
        })
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn time(&self) -> WallClock {
        self.time
    }

    pub fn naive(&self) -> NaiveDateTime {
        self.date.and_time(self.time.to_naive_time())
    }

    /// Resolve the slot to an instant in `tz`.
    ///
    /// A wall-clock time that occurs twice (clocks going back) resolves to
    /// the first occurrence. One skipped by clocks going forward is an error.
    pub fn appointment_in<Tz: TimeZone>(&self, tz: &Tz) -> Result<Timestamp, InvalidBookingTime> {
        let naive = self.naive();
        tz.from_local_datetime(&naive)
            .earliest()
            .map(|dt| Timestamp::from_datetime(&dt))
            .ok_or(InvalidBookingTime::NonexistentLocalTime(naive))
    }
}

impl fmt::Display for BookingSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.date.format("%Y-%m-%d"), self.time)
    }
}
