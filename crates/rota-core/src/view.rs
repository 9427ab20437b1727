//! View model shared by every layout
//!
//! Desktop and compact renderings both consume [`MonthView`]; neither
//! derives anything on its own.

use chrono::NaiveDate;
use serde::Serialize;

use crate::calendar::{CalendarDay, CalendarGrid, YearMonth};
use crate::models::User;
use crate::options::{AvailabilityOption, ColorCategory};
use crate::requirement::{evaluate_week, RequirementThresholds, WeekRequirement};
use crate::selection::{Selection, SelectionStore};
use crate::stats::{FilterType, Statistics};

/// Severity of a transient notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Transient user-facing notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OptionView {
    pub id: &'static str,
    pub label: &'static str,
    pub color: ColorCategory,
}

impl From<AvailabilityOption> for OptionView {
    fn from(option: AvailabilityOption) -> Self {
        Self {
            id: option.id(),
            label: option.label(),
            color: option.color(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DayView {
    #[serde(flatten)]
    pub day: CalendarDay,
    pub key: String,
    pub selection: Selection,
    pub saving: bool,
    /// Checkboxes are shown; otherwise a read-only summary
    pub editable: bool,
}

impl DayView {
    pub fn selection_label(&self) -> &'static str {
        self.selection.map(|o| o.label()).unwrap_or("No availability")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WeekView {
    pub days: Vec<DayView>,
    pub requirement: WeekRequirement,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatisticsPanel {
    pub filter_type: FilterType,
    pub heading: Option<String>,
    pub custom_start: Option<NaiveDate>,
    pub custom_end: Option<NaiveDate>,
    pub statistics: Option<Statistics>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthView {
    pub month: YearMonth,
    pub title: String,
    pub previous: YearMonth,
    pub next: YearMonth,
    pub viewer: User,
    /// Staff member being browsed, when not the viewer
    pub viewed_user: Option<User>,
    pub editable: bool,
    pub loading: bool,
    pub weeks: Vec<WeekView>,
    pub options: Vec<OptionView>,
    pub statistics: StatisticsPanel,
    pub staff: Vec<User>,
    pub notices: Vec<Notice>,
}

impl MonthView {
    pub fn complete_weeks(&self) -> usize {
        self.weeks.iter().filter(|w| w.requirement.complete).count()
    }

    /// Display name of whoever's calendar this is
    pub fn owner_name(&self) -> &str {
        self.viewed_user
            .as_ref()
            .map(|u| u.name.as_str())
            .unwrap_or(self.viewer.name.as_str())
    }
}

/// Group the grid into weeks with their requirement result
pub fn build_weeks(
    grid: &CalendarGrid,
    selections: &SelectionStore,
    thresholds: RequirementThresholds,
    editable: bool,
) -> Vec<WeekView> {
    grid.weeks()
        .map(|week| {
            let dates: Vec<NaiveDate> = week.iter().map(|d| d.date).collect();
            let mut requirement = evaluate_week(&dates, selections, thresholds);
            requirement.partial = week.iter().any(|d| !d.in_month);
            let days = week
                .iter()
                .map(|day| DayView {
                    day: *day,
                    key: day.key(),
                    selection: selections.get(day.date),
                    saving: selections.is_saving(day.date),
                    editable: editable && day.is_editable(),
                })
                .collect();
            WeekView { days, requirement }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_build_weeks_marks_editability_and_saving() {
        let month = YearMonth::new(2024, 5).unwrap();
        let grid = CalendarGrid::new(month, ymd(2024, 5, 10), false);
        let mut store = SelectionStore::from_server([(ymd(2024, 5, 2), Some(AvailabilityOption::Morning))]);
        store.set(ymd(2024, 5, 20), Some(AvailabilityOption::Evening));

        let weeks = build_weeks(&grid, &store, RequirementThresholds::default(), true);
        assert_eq!(weeks.len(), 5);

        let days: Vec<&DayView> = weeks.iter().flat_map(|w| w.days.iter()).collect();
        let find = |date| days.iter().find(|d| d.day.date == date).unwrap();

        assert!(!find(ymd(2024, 4, 29)).editable); // previous month
        assert!(!find(ymd(2024, 5, 2)).editable); // past
        assert_eq!(find(ymd(2024, 5, 2)).selection_label(), "Morning shift");
        assert!(find(ymd(2024, 5, 20)).saving);
        assert!(find(ymd(2024, 5, 20)).editable);
    }

    #[test]
    fn test_boundary_weeks_are_partial() {
        // May 2024 starts on a Wednesday and ends on a Friday
        let grid = CalendarGrid::new(YearMonth::new(2024, 5).unwrap(), ymd(2024, 5, 1), false);
        let store = SelectionStore::from_server([
            (ymd(2024, 5, 1), Some(AvailabilityOption::Morning)),
            (ymd(2024, 5, 31), Some(AvailabilityOption::Evening)),
        ]);
        let weeks = build_weeks(&grid, &store, RequirementThresholds::default(), true);

        let partial: Vec<bool> = weeks.iter().map(|w| w.requirement.partial).collect();
        assert_eq!(partial, [true, false, false, false, true]);
        assert_eq!(weeks[0].requirement.weekday.count, 1);
        assert_eq!(weeks[4].requirement.weekday.count, 1);
    }

    #[test]
    fn test_read_only_view_has_no_editable_days() {
        let grid = CalendarGrid::new(YearMonth::new(2024, 5).unwrap(), ymd(2024, 5, 1), true);
        let weeks = build_weeks(&grid, &SelectionStore::new(), RequirementThresholds::default(), false);
        assert!(weeks.iter().flat_map(|w| &w.days).all(|d| !d.editable));
    }

    #[test]
    fn test_day_view_serializes_flat() {
        let grid = CalendarGrid::new(YearMonth::new(2024, 5).unwrap(), ymd(2024, 5, 1), false);
        let weeks = build_weeks(&grid, &SelectionStore::new(), RequirementThresholds::default(), true);
        let value = serde_json::to_value(&weeks[0].days[2]).unwrap();
        assert_eq!(value["date"], "2024-05-01");
        assert_eq!(value["is_today"], true);
        assert_eq!(value["selection"], serde_json::Value::Null);
    }
}
