//! Month grid generation
//!
//! Weeks start on Monday. A month grid runs from the Monday of the week
//! holding the 1st through the Sunday of the week holding the last day, so
//! it always holds 28, 35 or 42 days.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, Months, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::RotaError;

/// Format used for every date exchanged with the backend
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A calendar month. Always stored as the 1st of that month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct YearMonth(NaiveDate);

impl YearMonth {
    /// Create a month. Years outside 1..=9999 are rejected.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if !(1..=9999).contains(&year) {
            return None;
        }
        NaiveDate::from_ymd_opt(year, month, 1).map(Self)
    }

    /// The month containing `date`
    pub fn of(date: NaiveDate) -> Self {
        Self(date.with_day(1).unwrap_or(date))
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.0
    }

    pub fn last_day(&self) -> NaiveDate {
        self.0
            .checked_add_months(Months::new(1))
            .and_then(|d| d.pred_opt())
            .unwrap_or(self.0)
    }

    /// Following month. Saturates at December 9999.
    pub fn next(&self) -> Self {
        self.0
            .checked_add_months(Months::new(1))
            .and_then(|d| Self::new(d.year(), d.month()))
            .unwrap_or(*self)
    }

    /// Preceding month. Saturates at January of year 1.
    pub fn previous(&self) -> Self {
        self.0
            .checked_sub_months(Months::new(1))
            .and_then(|d| Self::new(d.year(), d.month()))
            .unwrap_or(*self)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year() && date.month() == self.month()
    }

    /// Human readable title, e.g. "May 2024"
    pub fn title(&self) -> String {
        self.0.format("%B %Y").to_string()
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl FromStr for YearMonth {
    type Err = RotaError;

    /// Parse `YYYY-MM`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || RotaError::Validation(format!("invalid month '{}', expected YYYY-MM", s));
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month).ok_or_else(invalid)
    }
}

impl From<YearMonth> for String {
    fn from(value: YearMonth) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for YearMonth {
    type Error = RotaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Saturday and Sunday are weekend days in every view.
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Monday of the week containing `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let offset = u64::from(date.weekday().num_days_from_monday());
    date.checked_sub_days(Days::new(offset)).unwrap_or(date)
}

/// Parse a `YYYY-MM-DD` date key
pub fn parse_date(s: &str) -> Result<NaiveDate, RotaError> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|e| RotaError::Validation(format!("invalid date '{}': {}", s, e)))
}

/// Format a date as a `YYYY-MM-DD` key
pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// All dates shown for `month`, leading and trailing days included.
pub fn month_grid_dates(month: YearMonth) -> Vec<NaiveDate> {
    let start = week_start(month.first_day());
    let last = month.last_day();
    let trailing = 6 - u64::from(last.weekday().num_days_from_monday());
    let end = last.checked_add_days(Days::new(trailing)).unwrap_or(last);

    start.iter_days().take_while(|d| *d <= end).collect()
}

/// A single cell of the month grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    /// Belongs to the viewed month
    pub in_month: bool,
    pub is_weekend: bool,
    /// Strictly before today
    pub is_past: bool,
    pub is_today: bool,
    /// Availability may not be changed for this day
    pub is_disabled: bool,
}

impl CalendarDay {
    pub fn new(date: NaiveDate, viewed: YearMonth, today: NaiveDate, allow_past_edits: bool) -> Self {
        let in_month = viewed.contains(date);
        let is_past = date < today;
        Self {
            date,
            in_month,
            is_weekend: is_weekend(date),
            is_past,
            is_today: date == today,
            is_disabled: !in_month || (is_past && !allow_past_edits),
        }
    }

    pub fn is_editable(&self) -> bool {
        !self.is_disabled
    }

    pub fn day_number(&self) -> u32 {
        self.date.day()
    }

    pub fn key(&self) -> String {
        date_key(self.date)
    }
}

/// Days of one month view, grouped into Monday-first weeks
#[derive(Debug, Clone)]
pub struct CalendarGrid {
    month: YearMonth,
    days: Vec<CalendarDay>,
}

impl CalendarGrid {
    pub fn new(month: YearMonth, today: NaiveDate, allow_past_edits: bool) -> Self {
        let days = month_grid_dates(month)
            .into_iter()
            .map(|date| CalendarDay::new(date, month, today, allow_past_edits))
            .collect();
        Self { month, days }
    }

    pub fn month(&self) -> YearMonth {
        self.month
    }

    pub fn days(&self) -> &[CalendarDay] {
        &self.days
    }

    pub fn weeks(&self) -> impl Iterator<Item = &[CalendarDay]> {
        self.days.chunks(7)
    }

    pub fn week_count(&self) -> usize {
        self.days.len() / 7
    }

    pub fn day(&self, date: NaiveDate) -> Option<&CalendarDay> {
        self.days.iter().find(|d| d.date == date)
    }
}
