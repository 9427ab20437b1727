//! In-memory backend for tests

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::backend::AvailabilityBackend;
use crate::calendar::YearMonth;
use crate::error::{Result, RotaError};
use crate::models::{MonthAvailability, SaveResponse, SaveSelectionsRequest, User, UserId};
use crate::selection::Selection;
use crate::stats::{Statistics, StatisticsQuery};

#[derive(Default)]
struct State {
    months: HashMap<(Option<UserId>, YearMonth), BTreeMap<NaiveDate, Selection>>,
    saved: Vec<SaveSelectionsRequest>,
    statistics_queries: Vec<StatisticsQuery>,
    reject_saves: Option<String>,
    no_statistics: bool,
}

/// Records every call and answers from memory
pub struct MockBackend {
    staff: Vec<User>,
    state: Mutex<State>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            staff: vec![
                User::new(1, "Ana", "ana@example.com").admin(),
                User::new(2, "Ben", "ben@example.com"),
                User::new(3, "Cai", "cai@example.com"),
            ],
            state: Mutex::new(State::default()),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn put_month<I>(&self, user_id: Option<UserId>, month: YearMonth, selections: I)
    where
        I: IntoIterator<Item = (NaiveDate, Selection)>,
    {
        self.state()
            .months
            .insert((user_id, month), selections.into_iter().collect());
    }

    /// Make every following save answer `success: false`
    pub fn reject_saves(&self, message: &str) {
        self.state().reject_saves = Some(message.to_string());
    }

    /// Behave as if no statistics were computed yet
    pub fn without_statistics(&self) {
        self.state().no_statistics = true;
    }

    pub fn saved(&self) -> Vec<SaveSelectionsRequest> {
        self.state().saved.clone()
    }

    pub fn statistics_queries(&self) -> Vec<StatisticsQuery> {
        self.state().statistics_queries.clone()
    }

    fn compute(state: &State, user_id: Option<UserId>, query: &StatisticsQuery) -> Statistics {
        let in_window = |d: &NaiveDate| *d >= query.start_date && *d <= query.end_date;
        let mut stats = Statistics {
            filter_type: query.filter_type,
            start_date: Some(query.start_date),
            end_date: Some(query.end_date),
            ..Default::default()
        };
        for ((owner, _), days) in &state.months {
            if *owner != user_id {
                continue;
            }
            for (_, value) in days.iter().filter(|(d, _)| in_window(d)) {
                match value {
                    Some(o) if o.counts_as_duty() => stats.total_duty_days += 1,
                    Some(_) => stats.leave_taken += 1,
                    None => {}
                }
            }
        }
        stats
    }
}

#[async_trait]
impl AvailabilityBackend for MockBackend {
    async fn list_staff(&self) -> Result<Vec<User>> {
        Ok(self.staff.clone())
    }

    async fn month_availability(&self, user_id: Option<UserId>, month: YearMonth) -> Result<MonthAvailability> {
        let state = self.state();
        let selections = state.months.get(&(user_id, month)).cloned().unwrap_or_default();
        let statistics = if state.no_statistics {
            None
        } else {
            Some(Self::compute(&state, user_id, &StatisticsQuery::month(month)))
        };
        Ok(MonthAvailability {
            year: month.year(),
            month: month.month(),
            selections,
            statistics,
        })
    }

    async fn statistics(&self, user_id: Option<UserId>, query: &StatisticsQuery) -> Result<Statistics> {
        let mut state = self.state();
        state.statistics_queries.push(*query);
        if state.no_statistics {
            return Err(RotaError::MissingData(query.label()));
        }
        Ok(Self::compute(&state, user_id, query))
    }

    async fn recompute_statistics(&self, user_id: Option<UserId>, query: &StatisticsQuery) -> Result<Statistics> {
        let mut state = self.state();
        state.statistics_queries.push(*query);
        Ok(Self::compute(&state, user_id, query))
    }

    async fn save_selections(&self, request: &SaveSelectionsRequest) -> Result<SaveResponse> {
        let mut state = self.state();
        state.saved.push(request.clone());
        if let Some(message) = state.reject_saves.clone() {
            return Ok(SaveResponse {
                success: false,
                message: Some(message),
            });
        }
        let month = YearMonth::new(request.year, request.month)
            .ok_or_else(|| RotaError::Validation("invalid month".to_string()))?;
        let days = state.months.entry((request.user_id, month)).or_default();
        for (date, value) in &request.selections {
            days.insert(*date, *value);
        }
        Ok(SaveResponse {
            success: true,
            message: None,
        })
    }
}
