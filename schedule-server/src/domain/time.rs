//! Time-of-day handling for the timetable.
//!
//! Timetable rows carry a bare time of day ("HH:MM:SS"); the calendar date
//! only matters when a look-ahead window runs past midnight. This module
//! provides [`ClockTime`] for the stored values and [`DepartureWindow`] for
//! the date-aware window arithmetic.

use std::fmt;

use chrono::{Duration, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Seconds in one day.
const SECONDS_PER_DAY: u32 = 24 * 60 * 60;

/// Error returned when parsing or constructing an invalid time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// A time of day with second precision, `00:00:00` to `23:59:59`.
///
/// Stored as seconds since midnight, which is also how it is persisted, so
/// ordering and range comparisons in SQL match the Rust ordering.
///
/// # Examples
///
/// ```
/// use schedule_server::domain::ClockTime;
///
/// let t = ClockTime::parse("06:45").unwrap();
/// assert_eq!(t.to_string(), "06:45:00");
/// assert_eq!(t.seconds(), 6 * 3600 + 45 * 60);
///
/// assert!(ClockTime::parse("24:00").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClockTime(u32);

impl ClockTime {
    /// Midnight, the first moment of the day.
    pub const MIDNIGHT: ClockTime = ClockTime(0);

    /// `23:59:59`, the last representable moment of the day.
    pub const LAST_MOMENT: ClockTime = ClockTime(SECONDS_PER_DAY - 1);

    /// Create from hour, minute and second components.
    pub fn from_hms(hour: u32, minute: u32, second: u32) -> Result<Self, TimeError> {
        if hour > 23 {
            return Err(TimeError::new("hour must be 0-23"));
        }
        if minute > 59 {
            return Err(TimeError::new("minute must be 0-59"));
        }
        if second > 59 {
            return Err(TimeError::new("second must be 0-59"));
        }
        Ok(Self(hour * 3600 + minute * 60 + second))
    }

    /// Create from a number of seconds since midnight.
    pub fn from_seconds(seconds: u32) -> Result<Self, TimeError> {
        if seconds >= SECONDS_PER_DAY {
            return Err(TimeError::new("seconds must be below 86400"));
        }
        Ok(Self(seconds))
    }

    /// Time of day of a chrono time, dropping sub-second precision.
    pub fn from_naive(time: NaiveTime) -> Self {
        Self(time.num_seconds_from_midnight())
    }

    /// Parse "HH:MM" or "HH:MM:SS".
    ///
    /// # Examples
    ///
    /// ```
    /// use schedule_server::domain::ClockTime;
    ///
    /// assert!(ClockTime::parse("00:00").is_ok());
    /// assert!(ClockTime::parse("23:59:59").is_ok());
    ///
    /// assert!(ClockTime::parse("7:05").is_err());
    /// assert!(ClockTime::parse("07-05").is_err());
    /// assert!(ClockTime::parse("07:60").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, TimeError> {
        let bytes = s.as_bytes();
        if bytes.len() != 5 && bytes.len() != 8 {
            return Err(TimeError::new("expected HH:MM or HH:MM:SS format"));
        }
        if bytes[2] != b':' {
            return Err(TimeError::new("expected colon at position 2"));
        }

        let hour =
            parse_two_digits(&bytes[0..2]).ok_or_else(|| TimeError::new("invalid hour digits"))?;
        let minute = parse_two_digits(&bytes[3..5])
            .ok_or_else(|| TimeError::new("invalid minute digits"))?;

        let second = if bytes.len() == 8 {
            if bytes[5] != b':' {
                return Err(TimeError::new("expected colon at position 5"));
            }
            parse_two_digits(&bytes[6..8])
                .ok_or_else(|| TimeError::new("invalid second digits"))?
        } else {
            0
        };

        Self::from_hms(hour, minute, second)
    }

    /// Seconds since midnight.
    pub fn seconds(&self) -> u32 {
        self.0
    }

    /// Returns the hour (0-23).
    pub fn hour(&self) -> u32 {
        self.0 / 3600
    }

    /// Returns the minute (0-59).
    pub fn minute(&self) -> u32 {
        (self.0 / 60) % 60
    }

    /// Returns the second (0-59).
    pub fn second(&self) -> u32 {
        self.0 % 60
    }

    /// Whole minutes from `self` to `later`; negative if `later` is earlier.
    pub fn minutes_until(&self, later: ClockTime) -> i64 {
        (i64::from(later.0) - i64::from(self.0)) / 60
    }
}

impl TryFrom<i64> for ClockTime {
    type Error = TimeError;

    fn try_from(seconds: i64) -> Result<Self, Self::Error> {
        let seconds =
            u32::try_from(seconds).map_err(|_| TimeError::new("seconds must be non-negative"))?;
        Self::from_seconds(seconds)
    }
}

impl From<ClockTime> for i64 {
    fn from(time: ClockTime) -> Self {
        i64::from(time.0)
    }
}

impl fmt::Debug for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClockTime({self})")
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.hour(),
            self.minute(),
            self.second()
        )
    }
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ClockTime::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Parse two ASCII digit bytes into a u32.
fn parse_two_digits(bytes: &[u8]) -> Option<u32> {
    if bytes.len() != 2 {
        return None;
    }
    let d1 = (bytes[0] as char).to_digit(10)?;
    let d2 = (bytes[1] as char).to_digit(10)?;
    Some(d1 * 10 + d2)
}

/// The look-ahead window of a departure board.
///
/// A window that ends on a later calendar date than it starts is split into
/// two ranges, `[from, 23:59:59]` and `[00:00:00, to]`. It is never
/// represented as a single wrapped range.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use schedule_server::domain::{ClockTime, DepartureWindow};
///
/// let now = NaiveDate::from_ymd_opt(2024, 3, 15)
///     .unwrap()
///     .and_hms_opt(23, 50, 0)
///     .unwrap();
/// let window = DepartureWindow::starting_at(now, 20);
///
/// assert!(window.crosses_midnight());
/// assert!(window.contains(ClockTime::parse("00:05").unwrap()));
/// assert!(!window.contains(ClockTime::parse("12:00").unwrap()));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepartureWindow {
    /// Start and end fall on the same date.
    SameDay { from: ClockTime, to: ClockTime },

    /// The end falls on a later date than the start.
    AcrossMidnight { from: ClockTime, to: ClockTime },
}

impl DepartureWindow {
    /// Window of `minutes` starting at `now`.
    pub fn starting_at(now: NaiveDateTime, minutes: u32) -> Self {
        let end = now + Duration::minutes(i64::from(minutes));
        let from = ClockTime::from_naive(now.time());
        let to = ClockTime::from_naive(end.time());

        if end.date() > now.date() {
            DepartureWindow::AcrossMidnight { from, to }
        } else {
            DepartureWindow::SameDay { from, to }
        }
    }

    /// Whether the window runs past midnight.
    pub fn crosses_midnight(&self) -> bool {
        matches!(self, DepartureWindow::AcrossMidnight { .. })
    }

    /// The inclusive time-of-day ranges the window covers.
    pub fn ranges(&self) -> Vec<(ClockTime, ClockTime)> {
        match *self {
            DepartureWindow::SameDay { from, to } => vec![(from, to)],
            DepartureWindow::AcrossMidnight { from, to } => vec![
                (from, ClockTime::LAST_MOMENT),
                (ClockTime::MIDNIGHT, to),
            ],
        }
    }

    /// Whether a departure at `time` falls inside the window.
    pub fn contains(&self, time: ClockTime) -> bool {
        self.ranges()
            .iter()
            .any(|&(start, end)| start <= time && time <= end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn t(s: &str) -> ClockTime {
        ClockTime::parse(s).unwrap()
    }

    #[test]
    fn parse_valid_times() {
        let time = t("00:00");
        assert_eq!(time.seconds(), 0);

        let time = t("23:59:59");
        assert_eq!(time.hour(), 23);
        assert_eq!(time.minute(), 59);
        assert_eq!(time.second(), 59);

        let time = t("14:30");
        assert_eq!(time.hour(), 14);
        assert_eq!(time.minute(), 30);
        assert_eq!(time.second(), 0);
    }

    #[test]
    fn parse_invalid_format() {
        assert!(ClockTime::parse("1430").is_err());
        assert!(ClockTime::parse("14:3").is_err());
        assert!(ClockTime::parse("14:30:0").is_err());
        assert!(ClockTime::parse("14-30").is_err());
        assert!(ClockTime::parse("14:30-00").is_err());
        assert!(ClockTime::parse("ab:cd").is_err());
        assert!(ClockTime::parse("").is_err());
    }

    #[test]
    fn parse_out_of_range() {
        assert!(ClockTime::parse("24:00").is_err());
        assert!(ClockTime::parse("12:60").is_err());
        assert!(ClockTime::parse("12:00:60").is_err());
    }

    #[test]
    fn from_seconds_bounds() {
        assert_eq!(ClockTime::from_seconds(86_399).unwrap(), ClockTime::LAST_MOMENT);
        assert!(ClockTime::from_seconds(86_400).is_err());
        assert!(ClockTime::try_from(-1i64).is_err());
        assert_eq!(ClockTime::try_from(3600i64).unwrap(), t("01:00"));
    }

    #[test]
    fn display_and_debug() {
        assert_eq!(t("06:05").to_string(), "06:05:00");
        assert_eq!(format!("{:?}", t("06:05:09")), "ClockTime(06:05:09)");
    }

    #[test]
    fn minutes_until() {
        assert_eq!(t("06:00").minutes_until(t("06:50")), 50);
        assert_eq!(t("06:50").minutes_until(t("06:00")), -50);
    }

    #[test]
    fn serde_as_string() {
        let json = serde_json::to_string(&t("10:05")).unwrap();
        assert_eq!(json, "\"10:05:00\"");

        let parsed: ClockTime = serde_json::from_str("\"10:05\"").unwrap();
        assert_eq!(parsed, t("10:05"));

        assert!(serde_json::from_str::<ClockTime>("\"25:00\"").is_err());
    }

    #[test]
    fn same_day_window() {
        let window = DepartureWindow::starting_at(at(10, 0), 30);
        assert_eq!(
            window,
            DepartureWindow::SameDay {
                from: t("10:00"),
                to: t("10:30")
            }
        );
        assert!(window.contains(t("10:05")));
        assert!(window.contains(t("10:30")));
        assert!(!window.contains(t("09:59")));

        let short = DepartureWindow::starting_at(at(10, 0), 3);
        assert!(!short.contains(t("10:05")));
    }

    #[test]
    fn window_across_midnight() {
        let window = DepartureWindow::starting_at(at(23, 50), 20);
        assert!(window.crosses_midnight());
        assert_eq!(
            window.ranges(),
            vec![(t("23:50"), t("23:59:59")), (t("00:00"), t("00:10"))]
        );
        assert!(window.contains(t("23:55")));
        assert!(window.contains(t("00:05")));
        assert!(!window.contains(t("12:00")));
        assert!(!window.contains(t("00:11")));
    }

    #[test]
    fn window_ending_exactly_at_midnight() {
        let window = DepartureWindow::starting_at(at(23, 50), 10);
        assert!(window.crosses_midnight());
        assert!(window.contains(t("00:00")));
        assert!(!window.contains(t("00:01")));
    }

    #[test]
    fn zero_length_window() {
        let window = DepartureWindow::starting_at(at(8, 0), 0);
        assert!(!window.crosses_midnight());
        assert!(window.contains(t("08:00")));
        assert!(!window.contains(t("08:01")));
    }
}
