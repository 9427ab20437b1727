//! Weekly coverage requirement
//!
//! Each Monday-first week needs a minimum number of weekday blocks and
//! weekend blocks. A block is one day holding a duty option.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::is_weekend;
use crate::selection::SelectionStore;

pub const DEFAULT_WEEKDAY_MINIMUM: u32 = 3;
pub const DEFAULT_WEEKEND_MINIMUM: u32 = 2;

/// Minimum blocks per week
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementThresholds {
    pub weekday_minimum: u32,
    pub weekend_minimum: u32,
}

impl Default for RequirementThresholds {
    fn default() -> Self {
        Self {
            weekday_minimum: DEFAULT_WEEKDAY_MINIMUM,
            weekend_minimum: DEFAULT_WEEKEND_MINIMUM,
        }
    }
}

/// Count compared against its minimum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BlockCount {
    pub count: u32,
    pub required: u32,
    pub met: bool,
}

impl BlockCount {
    pub fn new(count: u32, required: u32) -> Self {
        Self {
            count,
            required,
            met: count >= required,
        }
    }

    /// Progress for display, capped at 100
    pub fn percent(&self) -> u32 {
        if self.required == 0 {
            return 100;
        }
        (self.count.saturating_mul(100) / self.required).min(100)
    }
}

/// Coverage of one week
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeekRequirement {
    pub week_start: NaiveDate,
    pub weekday: BlockCount,
    pub weekend: BlockCount,
    pub complete: bool,
    /// The week runs into another month whose days are not loaded
    pub partial: bool,
}

impl WeekRequirement {
    pub fn from_counts(
        week_start: NaiveDate,
        weekday_count: u32,
        weekend_count: u32,
        thresholds: RequirementThresholds,
    ) -> Self {
        let weekday = BlockCount::new(weekday_count, thresholds.weekday_minimum);
        let weekend = BlockCount::new(weekend_count, thresholds.weekend_minimum);
        Self {
            week_start,
            weekday,
            weekend,
            complete: weekday.met && weekend.met,
            partial: false,
        }
    }
}

/// Evaluate the week made of `dates` against the store
pub fn evaluate_week(
    dates: &[NaiveDate],
    selections: &SelectionStore,
    thresholds: RequirementThresholds,
) -> WeekRequirement {
    let (mut weekday, mut weekend) = (0u32, 0u32);
    for date in dates {
        let counts = selections.get(*date).is_some_and(|o| o.counts_as_duty());
        if !counts {
            continue;
        }
        if is_weekend(*date) {
            weekend += 1;
        } else {
            weekday += 1;
        }
    }

    let week_start = dates.first().copied().unwrap_or_default();
    WeekRequirement::from_counts(week_start, weekday, weekend, thresholds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{CalendarGrid, YearMonth};
    use crate::options::AvailabilityOption::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    /// Monday 13 May 2024 to Sunday 19 May 2024
    fn week() -> Vec<NaiveDate> {
        (13..=19).map(day).collect()
    }

    #[test]
    fn test_threshold_met_at_exact_count() {
        let req = WeekRequirement::from_counts(day(13), 3, 2, RequirementThresholds::default());
        assert!(req.weekday.met);
        assert!(req.weekend.met);
        assert!(req.complete);
    }

    #[test]
    fn test_threshold_not_met_below_count() {
        let req = WeekRequirement::from_counts(day(13), 2, 2, RequirementThresholds::default());
        assert!(!req.weekday.met);
        assert!(!req.complete);
    }

    #[test]
    fn test_counts_weekdays_and_weekends_separately() {
        let store = SelectionStore::from_server([
            (day(13), Some(Morning)),
            (day(15), Some(Evening)),
            (day(17), Some(AllDay)), // Friday is a weekday
            (day(18), Some(Morning)),
        ]);
        let req = evaluate_week(&week(), &store, RequirementThresholds::default());
        assert_eq!(req.weekday.count, 3);
        assert_eq!(req.weekend.count, 1);
        assert!(req.weekday.met);
        assert!(!req.weekend.met);
        assert!(!req.complete);
        assert_eq!(req.week_start, day(13));
    }

    #[test]
    fn test_holiday_does_not_count() {
        let store = SelectionStore::from_server([
            (day(18), Some(Holiday)),
            (day(19), Some(Holiday)),
        ]);
        let req = evaluate_week(&week(), &store, RequirementThresholds::default());
        assert_eq!(req.weekend.count, 0);
    }

    #[test]
    fn test_custom_thresholds() {
        let thresholds = RequirementThresholds {
            weekday_minimum: 1,
            weekend_minimum: 0,
        };
        let store = SelectionStore::from_server([(day(14), Some(Morning))]);
        assert!(evaluate_week(&week(), &store, thresholds).complete);
    }

    #[test]
    fn test_percent_is_capped() {
        assert_eq!(BlockCount::new(1, 2).percent(), 50);
        assert_eq!(BlockCount::new(5, 2).percent(), 100);
        assert_eq!(BlockCount::new(0, 0).percent(), 100);
    }

    #[test]
    fn test_every_grid_week_evaluates() {
        let grid = CalendarGrid::new(YearMonth::new(2024, 5).unwrap(), day(1), false);
        let store = SelectionStore::new();
        for week in grid.weeks() {
            let dates: Vec<_> = week.iter().map(|d| d.date).collect();
            let req = evaluate_week(&dates, &store, RequirementThresholds::default());
            assert_eq!(req.weekday.count + req.weekend.count, 0);
            assert!(!req.complete);
        }
    }
}
