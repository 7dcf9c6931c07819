//! Local calendar-day identity.
//!
//! A [`DateKey`] is the zero-padded `YYYY-MM-DD` string of a day as seen by
//! the observer's wall clock. It is built from the year/month/day fields of a
//! local date and never from a UTC-normalised timestamp, so an evening west of
//! UTC stays on the same day.

use crate::errors::HabitError;
use chrono::{DateTime, Datelike, Local, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::RangeInclusive;
use std::sync::Mutex;

/// Years whose key is exactly four digits. Keys outside this range cannot be
/// parsed back or compared as text, so checked constructors reject them.
pub const SUPPORTED_YEARS: RangeInclusive<i32> = 0..=9999;

// Field order matters: the derived ordering compares the date first, which
// matches the text order of the key for every supported year.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DateKey {
    date: NaiveDate,
    key: String,
}

impl DateKey {
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            key: format!("{:04}-{:02}-{:02}", date.year(), date.month(), date.day()),
            date,
        }
    }

    /// Key for the calendar day `point` falls on in its own offset.
    pub fn from_datetime<Tz: TimeZone>(point: &DateTime<Tz>) -> Self {
        Self::from_date(point.date_naive())
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self, HabitError> {
        let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
            HabitError::MalformedInput(format!("{year:04}-{month:02}-{day:02} is not a date"))
        })?;
        Self::checked(date)
    }

    /// Like [`DateKey::from_date`] but refuses years outside
    /// [`SUPPORTED_YEARS`].
    pub fn checked(date: NaiveDate) -> Result<Self, HabitError> {
        if !SUPPORTED_YEARS.contains(&date.year()) {
            return Err(HabitError::MalformedInput(format!(
                "year {} is outside 0000-9999",
                date.year()
            )));
        }
        Ok(Self::from_date(date))
    }

    /// Parses a manually entered `YYYY-MM-DD` string into its canonical form.
    pub fn parse(input: &str) -> Result<Self, HabitError> {
        let trimmed = input.trim();
        let date = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map_err(|_| {
            HabitError::MalformedInput(format!("invalid date `{trimmed}`, use YYYY-MM-DD"))
        })?;
        Self::checked(date)
    }

    pub fn as_str(&self) -> &str {
        &self.key
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn compare(&self, other: &DateKey) -> Ordering {
        self.date.cmp(&other.date)
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

impl From<DateKey> for String {
    fn from(key: DateKey) -> Self {
        key.key
    }
}

impl TryFrom<String> for DateKey {
    type Error = HabitError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let key = Self::parse(&value)?;
        if key.key != value {
            return Err(HabitError::MalformedInput(format!(
                "date key `{value}` is not zero-padded YYYY-MM-DD"
            )));
        }
        Ok(key)
    }
}

/// Source of "today". Implementations must not cache across calls.
pub trait Clock: Send + Sync {
    fn today(&self) -> DateKey;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> DateKey {
        DateKey::from_datetime(&Local::now())
    }
}

/// Clock pinned to a settable local date.
#[derive(Debug)]
pub struct ManualClock {
    today: Mutex<NaiveDate>,
}

impl ManualClock {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today: Mutex::new(today),
        }
    }

    pub fn set(&self, date: NaiveDate) {
        *self.today.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = date;
    }

    pub fn advance_days(&self, days: i64) {
        let mut guard = self.today.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard += chrono::Duration::days(days);
    }
}

impl Clock for ManualClock {
    fn today(&self) -> DateKey {
        let date = *self.today.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        DateKey::from_date(date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    #[test]
    fn same_local_day_across_utc_boundary() {
        let east = FixedOffset::east_opt(3 * 3600).unwrap();
        let early = east.with_ymd_and_hms(2025, 6, 10, 1, 0, 0).unwrap();
        let late = east.with_ymd_and_hms(2025, 6, 10, 23, 30, 0).unwrap();

        // 01:00 at UTC+3 is still the previous day in UTC.
        assert_eq!(early.with_timezone(&Utc).day(), 9);
        assert_eq!(DateKey::from_datetime(&early), DateKey::from_datetime(&late));
        assert_eq!(DateKey::from_datetime(&early).as_str(), "2025-06-10");
    }

    #[test]
    fn evening_west_of_utc_keeps_local_day() {
        let west = FixedOffset::west_opt(7 * 3600).unwrap();
        let evening = west.with_ymd_and_hms(2025, 12, 31, 20, 15, 0).unwrap();

        assert_eq!(evening.with_timezone(&Utc).year(), 2026);
        assert_eq!(DateKey::from_datetime(&evening).as_str(), "2025-12-31");
    }

    #[test]
    fn compare_is_chronological() {
        let a = DateKey::from_ymd(2025, 9, 30).unwrap();
        let b = DateKey::from_ymd(2025, 10, 1).unwrap();
        assert_eq!(a.compare(&b), Ordering::Less);
        assert_eq!(b.compare(&a), Ordering::Greater);
        assert_eq!(a.compare(&a.clone()), Ordering::Equal);
    }

    #[test]
    fn years_beyond_four_digits() {
        assert!(matches!(
            DateKey::from_ymd(10000, 1, 1),
            Err(HabitError::MalformedInput(_))
        ));
        assert!(DateKey::from_ymd(-1, 12, 31).is_err());
        assert!(DateKey::parse("+10000-01-01").is_err());
        assert_eq!(DateKey::from_ymd(9999, 12, 31).unwrap().as_str(), "9999-12-31");
        assert_eq!(DateKey::from_ymd(0, 1, 1).unwrap().as_str(), "0000-01-01");

        // Unchecked keys past the range still order by date.
        let last = DateKey::from_ymd(9999, 12, 31).unwrap();
        let beyond = DateKey::from_date(NaiveDate::from_ymd_opt(10000, 1, 1).unwrap());
        assert_eq!(last.compare(&beyond), Ordering::Less);
        assert!(last < beyond);
    }

    #[test]
    fn parse_canonicalises_and_rejects_garbage() {
        assert_eq!(DateKey::parse(" 2024-2-9 ").unwrap().as_str(), "2024-02-09");
        assert!(matches!(
            DateKey::parse("2024-02-30"),
            Err(HabitError::MalformedInput(_))
        ));
        assert!(DateKey::parse("tomorrow").is_err());
        assert!(DateKey::from_ymd(2023, 2, 29).is_err());
    }

    #[test]
    fn serde_uses_plain_string() {
        let key = DateKey::from_ymd(2025, 6, 10).unwrap();
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"2025-06-10\"");
        let back: DateKey = serde_json::from_str("\"2025-06-10\"").unwrap();
        assert_eq!(back, key);
        assert!(serde_json::from_str::<DateKey>("\"2025-6-10\"").is_err());
    }

    #[test]
    fn manual_clock_is_read_fresh() {
        let clock = ManualClock::new(NaiveDate::from_ymd_opt(2025, 6, 10).unwrap());
        assert_eq!(clock.today().as_str(), "2025-06-10");
        clock.advance_days(1);
        assert_eq!(clock.today().as_str(), "2025-06-11");
    }
}
