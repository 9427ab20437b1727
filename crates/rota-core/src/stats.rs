//! Statistics reporting window
//!
//! The filter tracks which window the statistics panel reports over and
//! hands back a [`StatisticsQuery`] whenever the backend must be asked
//! again. Custom ranges only produce a query on explicit confirmation.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::calendar::{date_key, YearMonth};
use crate::error::RotaError;

/// Kind of reporting window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    #[default]
    Month,
    Year,
    Custom,
}

impl FilterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Month => "month",
            Self::Year => "year",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterType {
    type Err = RotaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            "custom" => Ok(Self::Custom),
            other => Err(RotaError::Validation(format!("unknown filter type '{}'", other))),
        }
    }
}

/// A fully bounded window to ask the backend about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticsQuery {
    pub filter_type: FilterType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl StatisticsQuery {
    pub fn month(month: YearMonth) -> Self {
        Self {
            filter_type: FilterType::Month,
            start_date: month.first_day(),
            end_date: month.last_day(),
        }
    }

    pub fn year(year: i32) -> Option<Self> {
        Some(Self {
            filter_type: FilterType::Year,
            start_date: NaiveDate::from_ymd_opt(year, 1, 1)?,
            end_date: NaiveDate::from_ymd_opt(year, 12, 31)?,
        })
    }

    /// Query string pairs in wire form
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("filter_type", self.filter_type.to_string()),
            ("start_date", date_key(self.start_date)),
            ("end_date", date_key(self.end_date)),
        ]
    }

    pub fn label(&self) -> String {
        format!("{} to {}", date_key(self.start_date), date_key(self.end_date))
    }
}

/// Aggregate counts computed by the backend
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Statistics {
    #[serde(default)]
    pub total_duty_days: u32,
    #[serde(default)]
    pub leave_taken: u32,
    #[serde(default)]
    pub upcoming_leave: u32,
    #[serde(default)]
    pub filter_type: FilterType,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

/// Reporting window state behind the statistics panel
#[derive(Debug, Clone)]
pub struct StatisticsFilter {
    filter_type: FilterType,
    anchor: YearMonth,
    custom_start: Option<NaiveDate>,
    custom_end: Option<NaiveDate>,
    applied: Option<StatisticsQuery>,
}

impl StatisticsFilter {
    /// Month window locked to `anchor`
    pub fn new(anchor: YearMonth) -> Self {
        Self {
            filter_type: FilterType::Month,
            anchor,
            custom_start: None,
            custom_end: None,
            applied: Some(StatisticsQuery::month(anchor)),
        }
    }

    pub fn filter_type(&self) -> FilterType {
        self.filter_type
    }

    pub fn custom_start(&self) -> Option<NaiveDate> {
        self.custom_start
    }

    pub fn custom_end(&self) -> Option<NaiveDate> {
        self.custom_end
    }

    /// Last query handed out
    pub fn applied(&self) -> Option<StatisticsQuery> {
        self.applied
    }

    /// Switch to the calendar's month and return the refresh query
    pub fn select_month(&mut self) -> StatisticsQuery {
        self.filter_type = FilterType::Month;
        self.apply(StatisticsQuery::month(self.anchor))
    }

    /// Switch to the calendar's year and return the refresh query
    pub fn select_year(&mut self) -> StatisticsQuery {
        self.filter_type = FilterType::Year;
        let query = StatisticsQuery::year(self.anchor.year())
            .unwrap_or_else(|| StatisticsQuery::month(self.anchor));
        self.apply(query)
    }

    /// Enter custom mode. Nothing is fetched until [`Self::confirm_custom`].
    pub fn select_custom(&mut self) {
        self.filter_type = FilterType::Custom;
    }

    pub fn set_custom_start(&mut self, date: Option<NaiveDate>) {
        self.custom_start = date;
    }

    pub fn set_custom_end(&mut self, date: Option<NaiveDate>) {
        self.custom_end = date;
    }

    /// Confirm the custom range. Returns a query only when both ends are
    /// set; a reversed range is swapped.
    pub fn confirm_custom(&mut self) -> Option<StatisticsQuery> {
        if self.filter_type != FilterType::Custom {
            return None;
        }
        let (start, end) = (self.custom_start?, self.custom_end?);
        let (start_date, end_date) = if start <= end { (start, end) } else { (end, start) };
        Some(self.apply(StatisticsQuery {
            filter_type: FilterType::Custom,
            start_date,
            end_date,
        }))
    }

    /// The calendar moved to `month`. Month and year windows follow it and
    /// return a query when their bounds changed; custom windows stay put.
    pub fn follow_month(&mut self, month: YearMonth) -> Option<StatisticsQuery> {
        let previous = self.anchor;
        self.anchor = month;
        match self.filter_type {
            FilterType::Month if previous != month => Some(self.select_month()),
            FilterType::Year if previous.year() != month.year() => Some(self.select_year()),
            _ => None,
        }
    }

    fn apply(&mut self, query: StatisticsQuery) -> StatisticsQuery {
        self.applied = Some(query);
        query
    }
}

/// Heading shown above the statistics panel
pub fn window_heading(query: &StatisticsQuery) -> String {
    match query.filter_type {
        FilterType::Month => YearMonth::of(query.start_date).title(),
        FilterType::Year => query.start_date.year().to_string(),
        FilterType::Custom => query.label(),
    }
}
