//! Shift type catalog.
//!
//! A shift type is a named daily time window. Duration arithmetic treats
//! `end <= start` as crossing midnight, so `16:00-08:00` lasts 16 hours
//! and `08:00-08:00` is a full 24-hour duty.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Error parsing a `"HH:MM"` time of day.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid time of day '{0}', expected HH:MM")]
pub struct ShiftTimeError(pub String);

/// A time of day with minute resolution.
///
/// Accepts `"24:00"` as an alias for end of day, which is how overnight
/// windows such as `16:00-24:00` are usually written down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime {
    minutes: u32,
}

impl ClockTime {
    /// Creates a time from hour and minute.
    pub fn new(hour: u32, minute: u32) -> Result<Self, ShiftTimeError> {
        if minute >= 60 || hour > 24 || (hour == 24 && minute != 0) {
            return Err(ShiftTimeError(format!("{hour:02}:{minute:02}")));
        }
        Ok(Self {
            minutes: hour * 60 + minute,
        })
    }

    /// Minutes since midnight (0..=1440).
    #[inline]
    pub fn minutes(&self) -> u32 {
        self.minutes
    }
}

impl FromStr for ClockTime {
    type Err = ShiftTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ShiftTimeError(s.to_string());
        let (h, m) = s.trim().split_once(':').ok_or_else(err)?;
        let hour = h.parse::<u32>().map_err(|_| err())?;
        let minute = m.parse::<u32>().map_err(|_| err())?;
        Self::new(hour, minute).map_err(|_| err())
    }
}

impl TryFrom<String> for ClockTime {
    type Error = ShiftTimeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ClockTime> for String {
    fn from(value: ClockTime) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.minutes / 60, self.minutes % 60)
    }
}

/// A named duty time window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftType {
    /// Unique shift type name.
    pub name: String,
    /// Start time of day.
    pub start: ClockTime,
    /// End time of day. `end <= start` means the shift ends the next day.
    pub end: ClockTime,
}

impl ShiftType {
    /// Creates a shift type from `"HH:MM"` strings.
    pub fn new(name: impl Into<String>, start: &str, end: &str) -> Result<Self, ShiftTimeError> {
        Ok(Self {
            name: name.into(),
            start: start.parse()?,
            end: end.parse()?,
        })
    }

    /// Duration in minutes, wrapping past midnight.
    pub fn duration_minutes(&self) -> u32 {
        let start = self.start.minutes() % MINUTES_PER_DAY;
        let mut end = self.end.minutes();
        if end <= start {
            end += MINUTES_PER_DAY;
        }
        end - start
    }

    /// Duration in whole hours (truncated).
    #[inline]
    pub fn duration_hours(&self) -> u32 {
        self.duration_minutes() / 60
    }
}
