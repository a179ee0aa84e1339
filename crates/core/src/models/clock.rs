use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::errors::{BookingError, BookingResult};

const MINUTES_PER_DAY: u16 = 24 * 60;

/// Wall-clock time of day with minute precision, written as `HH:MM` (24-hour).
///
/// `24:00` is accepted so that a range can end exactly at midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime(u16);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid wall-clock time {0:?}, expected HH:MM between 00:00 and 24:00")]
pub struct ParseClockTimeError(String);

impl ClockTime {
    pub const END_OF_DAY: ClockTime = ClockTime(MINUTES_PER_DAY);

    /// Builds a time from literal parts. Panics on an out-of-range time, so
    /// use it for constants and use [`ClockTime::from_hm`] for input.
    pub const fn at(hours: u16, minutes: u16) -> Self {
        assert!(minutes < 60 && hours * 60 + minutes <= MINUTES_PER_DAY);
        ClockTime(hours * 60 + minutes)
    }

    pub fn from_minutes(minutes: u16) -> Option<Self> {
        (minutes <= MINUTES_PER_DAY).then_some(ClockTime(minutes))
    }

    pub fn from_hm(hours: u16, minutes: u16) -> Option<Self> {
        if minutes >= 60 {
            return None;
        }
        Self::from_minutes(hours.checked_mul(60)?.checked_add(minutes)?)
    }

    /// Minutes since midnight.
    pub fn minutes(self) -> u16 {
        self.0
    }

    /// Minutes from `self` until `later`, or `None` if `later` is not after `self`.
    pub fn minutes_until(self, later: ClockTime) -> Option<u16> {
        later.0.checked_sub(self.0).filter(|gap| *gap > 0)
    }

    pub fn checked_add_minutes(self, minutes: u16) -> Option<Self> {
        Self::from_minutes(self.0.checked_add(minutes)?)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl FromStr for ClockTime {
    type Err = ParseClockTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseClockTimeError(s.to_string());
        let (hours, minutes) = s.trim().split_once(':').ok_or_else(invalid)?;

        let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(hours) || hours.len() > 2 || !all_digits(minutes) || minutes.len() != 2 {
            return Err(invalid());
        }

        let hours: u16 = hours.parse().map_err(|_| invalid())?;
        let minutes: u16 = minutes.parse().map_err(|_| invalid())?;
        ClockTime::from_hm(hours, minutes).ok_or_else(invalid)
    }
}

impl TryFrom<String> for ClockTime {
    type Error = ParseClockTimeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ClockTime> for String {
    fn from(value: ClockTime) -> Self {
        value.to_string()
    }
}

/// Inclusive calendar-day window; either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateWindow {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> BookingResult<Self> {
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(BookingError::Validation(format!(
                    "Date window starts on {} which is after its end {}",
                    from, to
                )));
            }
        }
        Ok(Self { from, to })
    }

    pub fn single_day(date: NaiveDate) -> Self {
        Self {
            from: Some(date),
            to: Some(date),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.is_none_or(|from| date >= from) && self.to.is_none_or(|to| date <= to)
    }
}
