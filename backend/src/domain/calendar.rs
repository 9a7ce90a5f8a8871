//! Calendar date logic for the expense tracker.
//!
//! Pure computations behind the monthly grid: month lengths, the weekday
//! of the 1st, and the ordered sequence of dates a month renders. The UI
//! only handles presentation; every date rule lives here.

use chrono::{Datelike, NaiveDate};

/// Number of days in the given month (1 = January ... 12 = December).
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

pub fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

/// Weekday of the 1st of the month (0 = Sunday ... 6 = Saturday).
pub fn first_weekday_of_month(year: i32, month: u32) -> u32 {
    // chrono's weekday(): Monday = 0 via num_days_from_monday; we keep the
    // Sunday = 0 convention the calendar grid renders with.
    if let Some(date) = NaiveDate::from_ymd_opt(year, month, 1) {
        date.weekday().num_days_from_sunday()
    } else {
        0
    }
}

/// One date per day of the month, ascending from day 1.
///
/// Pure and restartable; the length always equals `days_in_month`.
pub fn generate_calendar_days(year: i32, month: u32) -> Vec<NaiveDate> {
    (1..=days_in_month(year, month))
        .filter_map(|day| NaiveDate::from_ymd_opt(year, month, day))
        .collect()
}

/// First and last date of the month, for inclusive range queries.
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let last = NaiveDate::from_ymd_opt(year, month, days_in_month(year, month))?;
    Some((first, last))
}

/// Human-readable name for a month number.
pub fn month_name(month: u32) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        12 => "December",
        _ => "Invalid Month",
    }
}

/// The month before the given one, rolling over year boundaries.
pub fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month == 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

/// The month after the given one, rolling over year boundaries.
pub fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}
