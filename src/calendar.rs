use crate::date_key::{Clock, DateKey, SUPPORTED_YEARS};
use crate::errors::HabitError;
use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

pub const WEEKDAY_HEADERS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// A (year, month) position for month-by-month navigation. Months are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct MonthCursor {
    year: i32,
    month: u32,
}

impl MonthCursor {
    pub fn new(year: i32, month: u32) -> Result<Self, HabitError> {
        if !(1..=12).contains(&month) || !SUPPORTED_YEARS.contains(&year) {
            return Err(HabitError::malformed(format!(
                "month {month} of year {year} is out of range"
            )));
        }
        Ok(Self { year, month })
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn current(clock: &dyn Clock) -> Self {
        Self::containing(clock.today().date())
    }

    /// Parses `YYYY-MM`.
    pub fn parse(input: &str) -> Result<Self, HabitError> {
        let trimmed = input.trim();
        let invalid = || HabitError::malformed(format!("invalid month `{trimmed}`, use YYYY-MM"));
        let (year, month) = trimmed.split_once('-').ok_or_else(invalid)?;
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        Self::new(year, month)
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn label(&self) -> String {
        format!("{} {}", MONTH_NAMES[self.month as usize - 1], self.year)
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// Day before the first of the following month.
    pub fn days_in_month(&self) -> u32 {
        let next = self.next();
        next.first_day()
            .pred_opt()
            .map(|last| last.day())
            .unwrap_or(31)
    }

    /// Weekday of the 1st, Sunday = 0.
    pub fn first_weekday(&self) -> u32 {
        self.first_day().weekday().num_days_from_sunday()
    }

    /// Placeholder cells before the 1st in a Monday-first grid.
    pub fn leading_blanks(&self) -> u32 {
        match self.first_weekday() {
            1 => 0,
            0 => 6,
            weekday => weekday - 1,
        }
    }

    pub fn previous(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GridCell {
    Blank,
    Day {
        key: DateKey,
        day: u32,
        is_today: bool,
    },
}

impl GridCell {
    pub fn key(&self) -> Option<&DateKey> {
        match self {
            GridCell::Blank => None,
            GridCell::Day { key, .. } => Some(key),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthGrid {
    pub cursor: MonthCursor,
    pub cells: Vec<GridCell>,
}

impl MonthGrid {
    pub fn leading_blanks(&self) -> usize {
        self.cells
            .iter()
            .take_while(|cell| matches!(cell, GridCell::Blank))
            .count()
    }

    pub fn day_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.key().is_some()).count()
    }

    /// Rows of seven, the last one padded with trailing blanks.
    pub fn weeks(&self) -> Vec<Vec<GridCell>> {
        self.cells
            .chunks(7)
            .map(|row| {
                let mut row = row.to_vec();
                row.resize(7, GridCell::Blank);
                row
            })
            .collect()
    }
}

pub fn build_month_grid(cursor: MonthCursor, clock: &dyn Clock) -> MonthGrid {
    build_month_grid_at(cursor, &clock.today())
}

pub fn build_month_grid_at(cursor: MonthCursor, today: &DateKey) -> MonthGrid {
    let blanks = cursor.leading_blanks() as usize;
    let days = cursor.days_in_month();
    let first = cursor.first_day();

    let mut cells = Vec::with_capacity(blanks + days as usize);
    cells.resize(blanks, GridCell::Blank);
    for offset in 0..days {
        let key = DateKey::from_date(first + Duration::days(offset as i64));
        let is_today = key == *today;
        cells.push(GridCell::Day {
            key,
            day: offset + 1,
            is_today,
        });
    }

    MonthGrid { cursor, cells }
}

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let current_day = date.weekday().num_days_from_sunday() as i64;
    let distance = if current_day == 0 { -6 } else { 1 - current_day };
    date + Duration::days(distance)
}

pub fn build_week_strip(reference: NaiveDate) -> [DateKey; 7] {
    let monday = week_start(reference);
    std::array::from_fn(|offset| DateKey::from_date(monday + Duration::days(offset as i64)))
}

pub fn current_week_strip(clock: &dyn Clock) -> [DateKey; 7] {
    build_week_strip(clock.today().date())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date_key::ManualClock;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn leap_february_has_29_days_and_three_blanks() {
        let feb = MonthCursor::new(2024, 2).unwrap();
        assert_eq!(feb.days_in_month(), 29);
        // 2024-02-01 is a Thursday.
        assert_eq!(feb.first_weekday(), 4);
        assert_eq!(feb.leading_blanks(), 3);

        assert_eq!(MonthCursor::new(2023, 2).unwrap().days_in_month(), 28);
        assert_eq!(MonthCursor::new(1900, 2).unwrap().days_in_month(), 28);
        assert_eq!(MonthCursor::new(2000, 2).unwrap().days_in_month(), 29);
    }

    #[test]
    fn cursor_years_stay_four_digits() {
        assert!(MonthCursor::new(10000, 1).is_err());
        assert!(MonthCursor::new(-1, 12).is_err());
        assert!(MonthCursor::parse("10000-01").is_err());
        let last = MonthCursor::new(9999, 12).unwrap();
        assert_eq!(last.days_in_month(), 31);
        assert_eq!(MonthCursor::parse("0000-01").unwrap().year(), 0);
    }

    #[test]
    fn sunday_and_monday_starts() {
        // June 2025 starts on a Sunday, September 2025 on a Monday.
        assert_eq!(MonthCursor::new(2025, 6).unwrap().leading_blanks(), 6);
        assert_eq!(MonthCursor::new(2025, 9).unwrap().leading_blanks(), 0);
    }

    #[test]
    fn every_grid_fills_whole_weeks() {
        let today = DateKey::from_ymd(2025, 6, 10).unwrap();
        let mut cursor = MonthCursor::new(1999, 1).unwrap();
        for _ in 0..(12 * 40) {
            let grid = build_month_grid_at(cursor, &today);
            assert_eq!(grid.day_count(), cursor.days_in_month() as usize);
            assert!(grid.leading_blanks() <= 6);
            assert_eq!(grid.leading_blanks(), cursor.leading_blanks() as usize);

            let weeks = grid.weeks();
            assert!(weeks.iter().all(|row| row.len() == 7));
            assert!(weeks.len() * 7 >= grid.cells.len());
            assert!(weeks.len() * 7 - grid.cells.len() < 7);
            cursor = cursor.next();
        }
    }

    #[test]
    fn grid_marks_only_today() {
        let clock = ManualClock::new(date(2025, 6, 10));
        let grid = build_month_grid(MonthCursor::current(&clock), &clock);
        let todays: Vec<_> = grid
            .cells
            .iter()
            .filter(|cell| matches!(cell, GridCell::Day { is_today: true, .. }))
            .collect();
        assert_eq!(todays.len(), 1);
        assert_eq!(todays[0].key().unwrap().as_str(), "2025-06-10");

        let other = build_month_grid(MonthCursor::new(2025, 7).unwrap(), &clock);
        assert!(
            other
                .cells
                .iter()
                .all(|cell| !matches!(cell, GridCell::Day { is_today: true, .. }))
        );
    }

    #[test]
    fn navigation_wraps_years() {
        let jan = MonthCursor::new(2025, 1).unwrap();
        assert_eq!(jan.previous(), MonthCursor::new(2024, 12).unwrap());
        let dec = MonthCursor::new(2025, 12).unwrap();
        assert_eq!(dec.next(), MonthCursor::new(2026, 1).unwrap());
        assert_eq!(dec.next().previous(), dec);
        assert_eq!(jan.label(), "January 2025");
    }

    #[test]
    fn cursor_validation() {
        assert!(MonthCursor::new(2025, 0).is_err());
        assert!(MonthCursor::new(2025, 13).is_err());
        assert_eq!(
            MonthCursor::parse("2024-02").unwrap(),
            MonthCursor::new(2024, 2).unwrap()
        );
        assert!(MonthCursor::parse("2024/02").is_err());
    }

    #[test]
    fn week_strip_from_wednesday() {
        let strip = build_week_strip(date(2025, 6, 11));
        let keys: Vec<&str> = strip.iter().map(DateKey::as_str).collect();
        assert_eq!(
            keys,
            [
                "2025-06-09",
                "2025-06-10",
                "2025-06-11",
                "2025-06-12",
                "2025-06-13",
                "2025-06-14",
                "2025-06-15"
            ]
        );
    }

    #[test]
    fn week_strip_from_sunday_and_across_new_year() {
        let sunday = build_week_strip(date(2025, 6, 15));
        assert_eq!(sunday[0].as_str(), "2025-06-09");
        assert_eq!(sunday[6].as_str(), "2025-06-15");

        let new_year = build_week_strip(date(2025, 1, 1));
        assert_eq!(new_year[0].as_str(), "2024-12-30");
        assert_eq!(new_year[6].as_str(), "2025-01-05");
    }

    #[test]
    fn current_week_follows_the_clock() {
        let clock = ManualClock::new(date(2025, 6, 15));
        assert_eq!(current_week_strip(&clock)[0].as_str(), "2025-06-09");
        clock.advance_days(1);
        assert_eq!(current_week_strip(&clock)[0].as_str(), "2025-06-16");
    }
}
