use chrono::{Datelike, Days, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::AttendanceError;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, AttendanceError> {
        if end < start {
            return Err(AttendanceError::invalid_argument(format!(
                "range end {end} is before start {start}"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn single(day: NaiveDate) -> Self {
        Self { start: day, end: day }
    }

    pub fn month(year: i32, month: u32) -> Result<Self, AttendanceError> {
        let (start, end) = month_bounds(year, month)?;
        Ok(Self {
            start: start.date(),
            end: end.date(),
        })
    }

    /// The `days` calendar days ending at `end`, inclusive.
    pub fn trailing(end: NaiveDate, days: u32) -> Self {
        let start = end
            .checked_sub_days(Days::new(u64::from(days.saturating_sub(1))))
            .unwrap_or(NaiveDate::MIN);
        Self { start, end }
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    /// Instant bounds: first millisecond of `start` to last millisecond of `end`.
    pub fn bounds(&self) -> (NaiveDateTime, NaiveDateTime) {
        (start_of_day(self.start), end_of_day(self.end))
    }
}

pub fn start_of_day(day: NaiveDate) -> NaiveDateTime {
    day.and_time(NaiveTime::MIN)
}

pub fn end_of_day(day: NaiveDate) -> NaiveDateTime {
    start_of_day(day) + Duration::milliseconds(MILLIS_PER_DAY - 1)
}

/// Local midnight and 23:59:59.999 of the day containing `instant`.
pub fn day_bounds(instant: NaiveDateTime) -> (NaiveDateTime, NaiveDateTime) {
    let day = instant.date();
    (start_of_day(day), end_of_day(day))
}

/// First and last millisecond of a 1-indexed month.
pub fn month_bounds(
    year: i32,
    month: u32,
) -> Result<(NaiveDateTime, NaiveDateTime), AttendanceError> {
    let first = first_day_of_month(year, month)?;
    let last = last_day_of_month(year, month)?;
    Ok((start_of_day(first), end_of_day(last)))
}

fn first_day_of_month(year: i32, month: u32) -> Result<NaiveDate, AttendanceError> {
    if !(1..=12).contains(&month) {
        return Err(AttendanceError::invalid_argument(format!(
            "month must be between 1 and 12, got {month}"
        )));
    }
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| AttendanceError::invalid_argument(format!("year {year} is out of range")))
}

// "Day 0" of the following month.
fn last_day_of_month(year: i32, month: u32) -> Result<NaiveDate, AttendanceError> {
    first_day_of_month(year, month)?;
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .ok_or_else(|| AttendanceError::invalid_argument(format!("year {year} is out of range")))
}

/// Every calendar day of the month, in order.
pub fn month_days(year: i32, month: u32) -> Result<Vec<NaiveDate>, AttendanceError> {
    let first = first_day_of_month(year, month)?;
    let last = last_day_of_month(year, month)?;
    Ok(first.iter_days().take_while(|d| *d <= last).collect())
}

/// The last `count` days ending at `end` (inclusive), oldest first.
pub fn trailing_days(end: NaiveDate, count: u32) -> Vec<NaiveDate> {
    (0..u64::from(count))
        .rev()
        .filter_map(|back| end.checked_sub_days(Days::new(back)))
        .collect()
}

pub fn is_weekend(day: NaiveDate) -> bool {
    matches!(day.weekday(), Weekday::Sat | Weekday::Sun)
}

/// 0 = Sunday .. 6 = Saturday.
pub fn weekday_number(day: NaiveDate) -> u32 {
    day.weekday().num_days_from_sunday()
}

pub fn weekday_label(day: NaiveDate) -> &'static str {
    match day.weekday() {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}
