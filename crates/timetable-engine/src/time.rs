//! Minute-precision clock arithmetic on `HH:MM` wall-clock times.
//!
//! Every comparison in the engine happens on minutes since midnight. Ranges are
//! half-open (`[start, end)`), so back-to-back sessions that share a boundary
//! never overlap.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TimetableError};

const MINUTES_PER_DAY: u16 = 24 * 60;

/// A wall-clock time of day, stored as minutes since midnight (`0..1440`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime(u16);

impl ClockTime {
    pub const MIDNIGHT: ClockTime = ClockTime(0);

    /// Build a time from hours and minutes. Returns `None` outside `00:00..=23:59`.
    pub fn from_hm(hours: u32, minutes: u32) -> Option<Self> {
        let total = hours.checked_mul(60)?.checked_add(minutes)?;
        if minutes < 60 && total < u32::from(MINUTES_PER_DAY) {
            Some(ClockTime(total as u16))
        } else {
            None
        }
    }

    /// Parse `HH:MM` (a single-digit hour is accepted, e.g. `9:30`).
    ///
    /// # Errors
    /// Returns `TimetableError::InvalidTime` for anything else.
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || TimetableError::InvalidTime(s.to_string());
        let (h, m) = s.trim().split_once(':').ok_or_else(invalid)?;
        if h.is_empty() || h.len() > 2 || m.len() != 2 {
            return Err(invalid());
        }
        let hours: u32 = h.parse().map_err(|_| invalid())?;
        let minutes: u32 = m.parse().map_err(|_| invalid())?;
        ClockTime::from_hm(hours, minutes).ok_or_else(invalid)
    }

    pub fn minutes(self) -> u16 {
        self.0
    }

    pub fn hour(self) -> u16 {
        self.0 / 60
    }

    pub fn minute(self) -> u16 {
        self.0 % 60
    }

    /// Truncate a datetime's time of day to the minute.
    pub fn of(datetime: &NaiveDateTime) -> Self {
        ClockTime::from(datetime.time())
    }
}

impl From<NaiveTime> for ClockTime {
    fn from(time: NaiveTime) -> Self {
        ClockTime((time.hour() * 60 + time.minute()) as u16)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for ClockTime {
    type Err = TimetableError;

    fn from_str(s: &str) -> Result<Self> {
        ClockTime::parse(s)
    }
}

impl TryFrom<String> for ClockTime {
    type Error = TimetableError;

    fn try_from(s: String) -> Result<Self> {
        ClockTime::parse(&s)
    }
}

impl From<ClockTime> for String {
    fn from(t: ClockTime) -> Self {
        t.to_string()
    }
}

/// A half-open time-of-day interval `[start, end)` with `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeRange {
    pub start: ClockTime,
    pub end: ClockTime,
}

impl TimeRange {
    /// # Errors
    /// Returns `TimetableError::InvertedRange` unless `start < end`.
    pub fn new(start: ClockTime, end: ClockTime) -> Result<Self> {
        if start < end {
            Ok(TimeRange { start, end })
        } else {
            Err(TimetableError::InvertedRange {
                start: start.to_string(),
                end: end.to_string(),
            })
        }
    }

    /// Parse a pair of `HH:MM` strings.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        TimeRange::new(ClockTime::parse(start)?, ClockTime::parse(end)?)
    }

    /// Two ranges overlap iff `a.start < b.end && a.end > b.start`.
    ///
    /// Ranges that only touch at a boundary do not overlap.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && self.end > other.start
    }

    /// Minutes shared by both ranges, `0` when they do not overlap.
    pub fn overlap_minutes(&self, other: &TimeRange) -> u16 {
        if !self.overlaps(other) {
            return 0;
        }
        self.end.min(other.end).minutes() - self.start.max(other.start).minutes()
    }

    /// Whether `t` falls inside `[start, end)`.
    pub fn contains(&self, t: ClockTime) -> bool {
        self.start <= t && t < self.end
    }

    pub fn duration_minutes(&self) -> u16 {
        self.end.minutes() - self.start.minutes()
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Signed minutes from `now` until `start` (negative once `start` has passed).
pub fn minutes_until(now: ClockTime, start: ClockTime) -> i32 {
    i32::from(start.minutes()) - i32::from(now.minutes())
}

/// Parse a calendar date, ignoring any time-of-day suffix.
///
/// Accepts `YYYY-MM-DD` as well as ISO datetimes such as `2025-03-01T00:00:00Z`;
/// only the date part is kept.
///
/// # Errors
/// Returns `TimetableError::InvalidDate` when the leading ten characters are not
/// a valid `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let trimmed = s.trim();
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|_| TimetableError::InvalidDate(s.to_string()))
}
