//! Availability page controller
//!
//! Owns all state behind one calendar page. Every backend round trip is
//! split in two: a synchronous `begin_*` that updates local state and
//! returns the request to make, and an `apply_*` that folds the response
//! back in. Responses whose ticket is no longer the newest are dropped, so
//! callers may release the page while a request is in flight.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::backend::AvailabilityBackend;
use crate::calendar::{CalendarDay, CalendarGrid, YearMonth};
use crate::error::{Result, RotaError};
use crate::models::{MonthAvailability, SaveResponse, SaveSelectionsRequest, User, UserId};
use crate::options::AvailabilityOption;
use crate::requirement::RequirementThresholds;
use crate::selection::{PendingEdit, Selection, SelectionStore};
use crate::sequence::{RequestSequence, Ticket};
use crate::stats::{window_heading, FilterType, Statistics, StatisticsFilter, StatisticsQuery};
use crate::view::{build_weeks, MonthView, Notice, OptionView, StatisticsPanel};

/// Oldest notices are dropped past this many
const MAX_NOTICES: usize = 8;

/// Behavior switches for a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageSettings {
    /// Allow changing availability of days before today
    pub allow_past_edits: bool,
    pub thresholds: RequirementThresholds,
}

/// A month fetch waiting to be applied
#[derive(Debug, Clone, Copy)]
pub struct MonthLoad {
    ticket: Ticket,
    /// Set when the embedded statistics should feed the panel
    stats_ticket: Option<Ticket>,
    pub user_id: Option<UserId>,
    pub month: YearMonth,
}

impl MonthLoad {
    pub async fn fetch(&self, backend: &dyn AvailabilityBackend) -> Result<MonthAvailability> {
        backend.month_availability(self.user_id, self.month).await
    }
}

/// A statistics fetch waiting to be applied
#[derive(Debug, Clone, Copy)]
pub struct StatsRefresh {
    ticket: Ticket,
    pub user_id: Option<UserId>,
    pub query: StatisticsQuery,
    pub recompute: bool,
}

impl StatsRefresh {
    pub async fn fetch(&self, backend: &dyn AvailabilityBackend) -> Result<Statistics> {
        if self.recompute {
            backend.recompute_statistics(self.user_id, &self.query).await
        } else {
            backend.statistics(self.user_id, &self.query).await
        }
    }
}

/// Requests triggered by a month or user change
#[derive(Debug, Clone, Copy)]
pub struct Navigation {
    pub load: MonthLoad,
    pub stats: Option<StatsRefresh>,
}

/// A save waiting to be applied
#[derive(Debug, Clone)]
pub struct SaveOp {
    edits: Vec<PendingEdit>,
    pub request: SaveSelectionsRequest,
}

impl SaveOp {
    pub async fn send(&self, backend: &dyn AvailabilityBackend) -> Result<SaveResponse> {
        backend.save_selections(&self.request).await
    }
}

/// Result of folding a save response in
#[derive(Debug, Clone, Copy)]
pub enum SaveOutcome {
    /// Accepted. Carries the statistics refetch for the active window.
    Saved(Option<StatsRefresh>),
    /// Rejected and reverted
    Failed,
}

impl SaveOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved(_))
    }

    pub fn refresh(self) -> Option<StatsRefresh> {
        match self {
            Self::Saved(refresh) => refresh,
            Self::Failed => None,
        }
    }
}

pub struct AvailabilityPage {
    backend: Arc<dyn AvailabilityBackend>,
    viewer: User,
    viewed_user: Option<User>,
    month: YearMonth,
    today: NaiveDate,
    settings: PageSettings,
    selections: SelectionStore,
    filter: StatisticsFilter,
    statistics: Option<Statistics>,
    staff: Vec<User>,
    notices: VecDeque<Notice>,
    month_requests: RequestSequence,
    stats_requests: RequestSequence,
    loading: bool,
}

impl AvailabilityPage {
    /// New page showing the viewer's own calendar for `today`'s month.
    /// Nothing is fetched until [`Self::load`].
    pub fn new(backend: Arc<dyn AvailabilityBackend>, viewer: User, today: NaiveDate, settings: PageSettings) -> Self {
        let month = YearMonth::of(today);
        Self {
            backend,
            viewer,
            viewed_user: None,
            month,
            today,
            settings,
            selections: SelectionStore::new(),
            filter: StatisticsFilter::new(month),
            statistics: None,
            staff: Vec::new(),
            notices: VecDeque::new(),
            month_requests: RequestSequence::new(),
            stats_requests: RequestSequence::new(),
            loading: false,
        }
    }

    pub fn backend(&self) -> Arc<dyn AvailabilityBackend> {
        Arc::clone(&self.backend)
    }

    pub fn viewer(&self) -> &User {
        &self.viewer
    }

    pub fn viewed_user(&self) -> Option<&User> {
        self.viewed_user.as_ref()
    }

    pub fn month(&self) -> YearMonth {
        self.month
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Move "today" forward, e.g. when a long-lived session crosses midnight
    pub fn set_today(&mut self, today: NaiveDate) {
        self.today = today;
    }

    pub fn selections(&self) -> &SelectionStore {
        &self.selections
    }

    pub fn filter(&self) -> &StatisticsFilter {
        &self.filter
    }

    pub fn statistics(&self) -> Option<&Statistics> {
        self.statistics.as_ref()
    }

    pub fn staff(&self) -> &[User] {
        &self.staff
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn notices(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter()
    }

    /// Drain pending notices
    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    pub fn notify(&mut self, notice: Notice) {
        if self.notices.len() == MAX_NOTICES {
            self.notices.pop_front();
        }
        self.notices.push_back(notice);
    }

    /// Whether the calendar on screen belongs to the viewer
    pub fn is_own_calendar(&self) -> bool {
        self.viewed_user.as_ref().is_none_or(|u| u.id == self.viewer.id)
    }

    pub fn grid(&self) -> CalendarGrid {
        CalendarGrid::new(self.month, self.today, self.settings.allow_past_edits)
    }

    fn viewed_user_id(&self) -> Option<UserId> {
        if self.is_own_calendar() {
            None
        } else {
            self.viewed_user.as_ref().map(|u| u.id)
        }
    }

    // ------------------------------------------------------------------
    // Month loading and navigation
    // ------------------------------------------------------------------

    /// Start (re)loading the viewed month
    pub fn begin_month_load(&mut self) -> MonthLoad {
        self.loading = true;
        let stats_ticket = (self.filter.filter_type() == FilterType::Month).then(|| self.stats_requests.begin());
        MonthLoad {
            ticket: self.month_requests.begin(),
            stats_ticket,
            user_id: self.viewed_user_id(),
            month: self.month,
        }
    }

    /// Fold a month response in. Returns false for stale responses.
    pub fn apply_month_load(&mut self, load: MonthLoad, result: Result<MonthAvailability>) -> bool {
        if !self.month_requests.is_current(load.ticket) {
            debug!(month = %load.month, ticket = load.ticket.value(), "Dropping stale month response");
            return false;
        }
        self.loading = false;

        match result {
            Ok(data) => {
                info!(month = %load.month, entries = data.selections.len(), "Loaded month availability");
                // Navigation and staff changes empty the store up front, so a
                // current ticket always matches what is on screen
                self.selections.merge_server(data.selections);
                if let Some(ticket) = load.stats_ticket {
                    if self.stats_requests.is_current(ticket) {
                        if data.statistics.is_none() {
                            self.notify(Notice::info(format!(
                                "No statistics computed yet for {}",
                                load.month.title()
                            )));
                        }
                        self.statistics = data.statistics;
                    }
                }
            }
            Err(e) => {
                warn!(month = %load.month, "Failed to load month: {}", e);
                if load.stats_ticket.is_some_and(|t| self.stats_requests.is_current(t)) {
                    self.statistics = None;
                }
                self.notify(Notice::error(format!("Could not load {}: {}", load.month.title(), e)));
            }
        }
        true
    }

    /// Switch to `month`. The store is cleared right away; month and year
    /// statistics windows follow the calendar.
    pub fn begin_navigation(&mut self, month: YearMonth) -> Navigation {
        self.month = month;
        self.selections.replace_all([]);
        let follow = self.filter.follow_month(month);
        let load = self.begin_month_load();
        let stats = match follow {
            Some(query) if query.filter_type != FilterType::Month => Some(self.begin_stats(query, false)),
            _ => None,
        };
        Navigation { load, stats }
    }

    pub async fn load(&mut self) {
        let load = self.begin_month_load();
        self.finish_month_load(load).await;
    }

    pub async fn go_to(&mut self, month: YearMonth) {
        let navigation = self.begin_navigation(month);
        self.finish_navigation(navigation).await;
    }

    pub async fn next_month(&mut self) {
        self.go_to(self.month.next()).await;
    }

    pub async fn previous_month(&mut self) {
        self.go_to(self.month.previous()).await;
    }

    async fn finish_month_load(&mut self, load: MonthLoad) {
        let result = load.fetch(self.backend.as_ref()).await;
        self.apply_month_load(load, result);
    }

    async fn finish_navigation(&mut self, navigation: Navigation) {
        self.finish_month_load(navigation.load).await;
        if let Some(refresh) = navigation.stats {
            self.finish_stats(refresh).await;
        }
    }

    // ------------------------------------------------------------------
    // Selection edits
    // ------------------------------------------------------------------

    /// Check that `date` may be edited by the viewer right now
    pub fn check_editable(&self, date: NaiveDate) -> Result<CalendarDay> {
        if !self.is_own_calendar() {
            return Err(RotaError::Forbidden("staff calendars are read-only".to_string()));
        }
        let day = CalendarDay::new(date, self.month, self.today, self.settings.allow_past_edits);
        if day.is_disabled {
            return Err(RotaError::NotEditable(date));
        }
        Ok(day)
    }

    /// Optimistically set `date` and return the single-cell save to send
    pub fn begin_select(&mut self, date: NaiveDate, value: Selection) -> Result<SaveOp> {
        self.check_editable(date)?;
        let edit = self.selections.set(date, value);
        debug!(date = %date, value = ?value, seq = edit.seq, "Optimistic selection");
        Ok(SaveOp {
            edits: vec![edit],
            request: SaveSelectionsRequest::single(self.month, None, date, value),
        })
    }

    /// Like [`Self::begin_select`], clearing the cell if it already holds `option`
    pub fn begin_toggle(&mut self, date: NaiveDate, option: AvailabilityOption) -> Result<SaveOp> {
        let value = if self.selections.get(date) == Some(option) {
            None
        } else {
            Some(option)
        };
        self.begin_select(date, value)
    }

    /// Bulk save of every day in the viewed month
    pub fn begin_save_month(&mut self) -> Result<SaveOp> {
        if !self.is_own_calendar() {
            return Err(RotaError::Forbidden("staff calendars are read-only".to_string()));
        }
        let snapshot = self.selections.month_snapshot(self.month);
        Ok(SaveOp {
            edits: Vec::new(),
            request: SaveSelectionsRequest::bulk(self.month, None, snapshot),
        })
    }

    /// Fold a save response in. Failed writes are reverted; accepted ones
    /// invalidate the statistics on screen.
    pub fn apply_save(&mut self, op: SaveOp, result: Result<SaveResponse>) -> SaveOutcome {
        let failure = match result {
            Ok(response) if response.success => None,
            Ok(response) => Some(RotaError::Validation(
                response.message.unwrap_or_else(|| "selection rejected".to_string()),
            )),
            Err(e) => Some(e),
        };

        match failure {
            None => {
                for edit in op.edits {
                    self.selections.commit(edit);
                }
                if !op.request.is_single_update {
                    info!(month = %self.month, days = op.request.selections.len(), "Saved month");
                    self.notify(Notice::info("Availability saved"));
                }
                SaveOutcome::Saved(self.begin_refresh_statistics())
            }
            Some(e) => {
                warn!(kind = e.kind(), "Save failed: {}", e);
                for edit in op.edits {
                    self.selections.revert(edit);
                }
                self.notify(Notice::error(format!("Could not save availability: {}", e)));
                SaveOutcome::Failed
            }
        }
    }

    pub async fn select(&mut self, date: NaiveDate, value: Selection) -> bool {
        match self.begin_select(date, value) {
            Ok(op) => self.finish_save(op).await,
            Err(e) => self.reject(e),
        }
    }

    pub async fn toggle(&mut self, date: NaiveDate, option: AvailabilityOption) -> bool {
        match self.begin_toggle(date, option) {
            Ok(op) => self.finish_save(op).await,
            Err(e) => self.reject(e),
        }
    }

    pub async fn clear(&mut self, date: NaiveDate) -> bool {
        self.select(date, None).await
    }

    pub async fn save_month(&mut self) -> bool {
        match self.begin_save_month() {
            Ok(op) => self.finish_save(op).await,
            Err(e) => self.reject(e),
        }
    }

    async fn finish_save(&mut self, op: SaveOp) -> bool {
        let result = op.send(self.backend.as_ref()).await;
        match self.apply_save(op, result) {
            SaveOutcome::Saved(refresh) => {
                if let Some(refresh) = refresh {
                    self.finish_stats(refresh).await;
                }
                true
            }
            SaveOutcome::Failed => false,
        }
    }

    /// Surface a locally rejected action
    pub fn reject(&mut self, error: RotaError) -> bool {
        debug!(kind = error.kind(), "Rejected: {}", error);
        self.notify(Notice::error(error.to_string()));
        false
    }

    // ------------------------------------------------------------------
    // Statistics window
    // ------------------------------------------------------------------

    fn begin_stats(&mut self, query: StatisticsQuery, recompute: bool) -> StatsRefresh {
        StatsRefresh {
            ticket: self.stats_requests.begin(),
            user_id: self.viewed_user_id(),
            query,
            recompute,
        }
    }

    pub fn begin_filter_month(&mut self) -> StatsRefresh {
        let query = self.filter.select_month();
        self.begin_stats(query, false)
    }

    pub fn begin_filter_year(&mut self) -> StatsRefresh {
        let query = self.filter.select_year();
        self.begin_stats(query, false)
    }

    /// Enter custom mode. No request until the range is confirmed.
    pub fn set_filter_custom(&mut self) {
        self.filter.select_custom();
    }

    pub fn set_custom_start(&mut self, date: Option<NaiveDate>) {
        self.filter.set_custom_start(date);
    }

    pub fn set_custom_end(&mut self, date: Option<NaiveDate>) {
        self.filter.set_custom_end(date);
    }

    /// Confirm the custom range; `None` when a date is still missing
    pub fn begin_confirm_custom(&mut self) -> Option<StatsRefresh> {
        match self.filter.confirm_custom() {
            Some(query) => Some(self.begin_stats(query, false)),
            None => {
                self.notify(Notice::info("Pick both a start and an end date"));
                None
            }
        }
    }

    /// Ask the backend to recompute the active window
    pub fn begin_recompute(&mut self) -> Option<StatsRefresh> {
        let query = self.filter.applied()?;
        Some(self.begin_stats(query, true))
    }

    /// Refetch the active window after the data behind it changed. Stored
    /// figures are stale at that point, so this recomputes.
    pub fn begin_refresh_statistics(&mut self) -> Option<StatsRefresh> {
        let query = self.filter.applied()?;
        debug!(filter = %query.filter_type, "Refreshing statistics after save");
        Some(self.begin_stats(query, true))
    }

    /// Fold a statistics response in. Returns false for stale responses.
    pub fn apply_statistics(&mut self, refresh: StatsRefresh, result: Result<Statistics>) -> bool {
        if !self.stats_requests.is_current(refresh.ticket) {
            debug!(ticket = refresh.ticket.value(), "Dropping stale statistics response");
            return false;
        }
        match result {
            Ok(statistics) => {
                self.statistics = Some(statistics);
            }
            Err(RotaError::MissingData(_)) => {
                self.statistics = None;
                self.notify(Notice::info(format!(
                    "No statistics computed yet for {}",
                    window_heading(&refresh.query)
                )));
            }
            Err(e) => {
                warn!(filter = %refresh.query.filter_type, "Statistics refresh failed: {}", e);
                self.notify(Notice::error(format!("Could not load statistics: {}", e)));
            }
        }
        true
    }

    pub async fn set_filter_month(&mut self) {
        let refresh = self.begin_filter_month();
        self.finish_stats(refresh).await;
    }

    pub async fn set_filter_year(&mut self) {
        let refresh = self.begin_filter_year();
        self.finish_stats(refresh).await;
    }

    /// Returns false when the range is incomplete and nothing was requested
    pub async fn confirm_custom(&mut self) -> bool {
        match self.begin_confirm_custom() {
            Some(refresh) => {
                self.finish_stats(refresh).await;
                true
            }
            None => false,
        }
    }

    pub async fn recompute_statistics(&mut self) {
        if let Some(refresh) = self.begin_recompute() {
            self.finish_stats(refresh).await;
        }
    }

    async fn finish_stats(&mut self, refresh: StatsRefresh) {
        let result = refresh.fetch(self.backend.as_ref()).await;
        self.apply_statistics(refresh, result);
    }

    // ------------------------------------------------------------------
    // Staff browsing
    // ------------------------------------------------------------------

    fn require_admin(&self) -> Result<()> {
        if self.viewer.is_admin {
            Ok(())
        } else {
            Err(RotaError::Forbidden("administrator access required".to_string()))
        }
    }

    pub fn apply_staff(&mut self, result: Result<Vec<User>>) {
        match result {
            Ok(staff) => {
                info!(count = staff.len(), "Loaded staff list");
                self.staff = staff;
            }
            Err(e) => {
                warn!("Failed to load staff: {}", e);
                self.notify(Notice::error(format!("Could not load staff: {}", e)));
            }
        }
    }

    pub async fn load_staff(&mut self) {
        if let Err(e) = self.require_admin() {
            self.reject(e);
            return;
        }
        let result = self.backend.list_staff().await;
        self.apply_staff(result);
    }

    /// Browse `user_id`'s calendar, or go back to the viewer's own with
    /// `None`. The store is replaced wholesale.
    pub fn begin_view_staff(&mut self, user_id: Option<UserId>) -> Result<Navigation> {
        let viewed = match user_id {
            None => None,
            Some(id) if id == self.viewer.id => None,
            Some(id) => {
                self.require_admin()?;
                let user = self
                    .staff
                    .iter()
                    .find(|u| u.id == id)
                    .cloned()
                    .ok_or_else(|| RotaError::Validation(format!("unknown staff member {}", id)))?;
                Some(user)
            }
        };

        self.viewed_user = viewed;
        self.selections.replace_all([]);
        self.statistics = None;
        let load = self.begin_month_load();
        let stats = match self.filter.applied() {
            Some(query) if query.filter_type != FilterType::Month => Some(self.begin_stats(query, false)),
            _ => None,
        };
        Ok(Navigation { load, stats })
    }

    pub async fn view_staff(&mut self, user_id: Option<UserId>) -> bool {
        match self.begin_view_staff(user_id) {
            Ok(navigation) => {
                self.finish_navigation(navigation).await;
                true
            }
            Err(e) => self.reject(e),
        }
    }

    // ------------------------------------------------------------------
    // View
    // ------------------------------------------------------------------

    /// Build the view model both layouts render from
    pub fn month_view(&self) -> MonthView {
        let grid = self.grid();
        let editable = self.is_own_calendar();
        MonthView {
            month: self.month,
            title: self.month.title(),
            previous: self.month.previous(),
            next: self.month.next(),
            viewer: self.viewer.clone(),
            viewed_user: self.viewed_user.clone(),
            editable,
            loading: self.loading,
            weeks: build_weeks(&grid, &self.selections, self.settings.thresholds, editable),
            options: AvailabilityOption::ALL.into_iter().map(OptionView::from).collect(),
            statistics: StatisticsPanel {
                filter_type: self.filter.filter_type(),
                heading: self.filter.applied().map(|q| window_heading(&q)),
                custom_start: self.filter.custom_start(),
                custom_end: self.filter.custom_end(),
                statistics: self.statistics.clone(),
            },
            staff: self.staff.clone(),
            notices: self.notices.iter().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockBackend;
    use AvailabilityOption::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn viewer() -> User {
        User::new(1, "Ana", "ana@example.com")
    }

    fn page_with(backend: Arc<MockBackend>, viewer: User) -> AvailabilityPage {
        AvailabilityPage::new(backend, viewer, ymd(2024, 5, 10), PageSettings::default())
    }

    #[tokio::test]
    async fn test_load_seeds_store_and_statistics() {
        let backend = Arc::new(MockBackend::new());
        backend.put_month(None, YearMonth::new(2024, 5).unwrap(), [(ymd(2024, 5, 20), Some(Morning))]);
        let mut page = page_with(backend.clone(), viewer());

        page.load().await;

        assert_eq!(page.selections().get(ymd(2024, 5, 20)), Some(Morning));
        assert!(page.statistics().is_some());
        assert!(!page.is_loading());
    }

    #[tokio::test]
    async fn test_select_is_optimistic_and_committed() {
        let backend = Arc::new(MockBackend::new());
        let mut page = page_with(backend.clone(), viewer());

        assert!(page.select(ymd(2024, 5, 20), Some(Evening)).await);
        assert_eq!(page.selections().get(ymd(2024, 5, 20)), Some(Evening));
        assert!(!page.selections().is_saving(ymd(2024, 5, 20)));

        let saved = backend.saved();
        assert_eq!(saved.len(), 1);
        assert!(saved[0].is_single_update);
        assert_eq!(saved[0].selections[&ymd(2024, 5, 20)], Some(Evening));
    }

    #[tokio::test]
    async fn test_failed_save_reverts_and_notifies() {
        let backend = Arc::new(MockBackend::new());
        backend.put_month(None, YearMonth::new(2024, 5).unwrap(), [(ymd(2024, 5, 21), Some(Morning))]);
        let mut page = page_with(backend.clone(), viewer());
        page.load().await;
        page.take_notices();

        backend.reject_saves("slot closed");
        assert!(!page.select(ymd(2024, 5, 21), Some(Holiday)).await);

        assert_eq!(page.selections().get(ymd(2024, 5, 21)), Some(Morning));
        let notices = page.take_notices();
        assert_eq!(notices.len(), 1);
        assert!(notices[0].message.contains("slot closed"));
    }

    #[tokio::test]
    async fn test_select_refreshes_statistics() {
        let backend = Arc::new(MockBackend::new());
        let mut page = page_with(backend.clone(), viewer());
        page.load().await;
        assert_eq!(page.statistics().unwrap().total_duty_days, 0);

        assert!(page.select(ymd(2024, 5, 20), Some(Morning)).await);
        assert!(page.toggle(ymd(2024, 5, 21), Holiday).await);

        let stats = page.statistics().unwrap();
        assert_eq!(stats.total_duty_days, 1);
        assert_eq!(stats.leave_taken, 1);
        assert_eq!(stats.filter_type, FilterType::Month);
        assert_eq!(backend.statistics_queries().len(), 2);
    }

    #[tokio::test]
    async fn test_rejected_save_keeps_statistics() {
        let backend = Arc::new(MockBackend::new());
        let mut page = page_with(backend.clone(), viewer());
        page.load().await;
        backend.reject_saves("closed");

        let op = page.begin_select(ymd(2024, 5, 20), Some(Morning)).unwrap();
        let result = op.send(backend.as_ref()).await;
        let outcome = page.apply_save(op, result);
        assert!(!outcome.is_saved());
        assert!(outcome.refresh().is_none());
        assert!(backend.statistics_queries().is_empty());
    }

    #[tokio::test]
    async fn test_month_reload_keeps_edit_in_flight() {
        let backend = Arc::new(MockBackend::new());
        let mut page = page_with(backend.clone(), viewer());

        // The reload is answered before the save, but applied after the edit
        let load = page.begin_month_load();
        let loaded = load.fetch(backend.as_ref()).await;
        let op = page.begin_select(ymd(2024, 5, 20), Some(Evening)).unwrap();
        assert!(page.apply_month_load(load, loaded));
        assert_eq!(page.selections().get(ymd(2024, 5, 20)), Some(Evening));
        assert!(page.selections().is_saving(ymd(2024, 5, 20)));

        let result = op.send(backend.as_ref()).await;
        assert!(page.apply_save(op, result).is_saved());
        assert_eq!(page.selections().get(ymd(2024, 5, 20)), Some(Evening));
        assert!(!page.selections().is_saving(ymd(2024, 5, 20)));
    }

    #[tokio::test]
    async fn test_failed_month_load_clears_month_statistics() {
        let backend = Arc::new(MockBackend::new());
        backend.put_month(None, YearMonth::new(2024, 5).unwrap(), [(ymd(2024, 5, 20), Some(Morning))]);
        let mut page = page_with(backend.clone(), viewer());
        page.load().await;
        assert_eq!(page.statistics().unwrap().total_duty_days, 1);
        page.take_notices();

        let navigation = page.begin_navigation(YearMonth::new(2024, 6).unwrap());
        assert!(page.apply_month_load(navigation.load, Err(RotaError::Network("connection reset".to_string()))));

        assert!(page.statistics().is_none());
        assert!(!page.is_loading());
        let notices = page.take_notices();
        assert_eq!(notices[0].level, crate::view::NoticeLevel::Error);
        assert!(notices[0].message.contains("June 2024"));
    }

    #[tokio::test]
    async fn test_failed_month_load_keeps_year_statistics() {
        let backend = Arc::new(MockBackend::new());
        let mut page = page_with(backend.clone(), viewer());
        page.set_filter_year().await;
        assert!(page.statistics().is_some());

        let load = page.begin_month_load();
        page.apply_month_load(load, Err(RotaError::Network("timeout".to_string())));
        assert!(page.statistics().is_some());
    }

    #[tokio::test]
    async fn test_past_and_outside_days_are_rejected_without_request() {
        let backend = Arc::new(MockBackend::new());
        let mut page = page_with(backend.clone(), viewer());

        assert!(!page.select(ymd(2024, 5, 2), Some(Morning)).await);
        assert!(!page.select(ymd(2024, 6, 1), Some(Morning)).await);
        assert!(backend.saved().is_empty());
        assert_eq!(page.take_notices().len(), 2);
    }

    #[tokio::test]
    async fn test_past_edit_override() {
        let backend = Arc::new(MockBackend::new());
        let settings = PageSettings {
            allow_past_edits: true,
            ..Default::default()
        };
        let mut page = AvailabilityPage::new(backend.clone(), viewer(), ymd(2024, 5, 10), settings);
        assert!(page.select(ymd(2024, 5, 2), Some(Morning)).await);
        assert_eq!(backend.saved().len(), 1);
    }

    #[tokio::test]
    async fn test_toggle_clears_same_option() {
        let backend = Arc::new(MockBackend::new());
        let mut page = page_with(backend.clone(), viewer());
        page.toggle(ymd(2024, 5, 22), AllDay).await;
        page.toggle(ymd(2024, 5, 22), AllDay).await;
        assert_eq!(page.selections().get(ymd(2024, 5, 22)), None);
        assert_eq!(backend.saved()[1].selections[&ymd(2024, 5, 22)], None);
    }

    #[tokio::test]
    async fn test_stale_month_response_is_ignored() {
        let backend = Arc::new(MockBackend::new());
        let may = YearMonth::new(2024, 5).unwrap();
        let june = may.next();
        backend.put_month(None, may, [(ymd(2024, 5, 20), Some(Morning))]);
        backend.put_month(None, june, [(ymd(2024, 6, 3), Some(Evening))]);
        let mut page = page_with(backend.clone(), viewer());

        // Two navigations in flight, answered out of order
        let to_june = page.begin_navigation(june);
        let back_to_may = page.begin_navigation(may);
        let may_result = back_to_may.load.fetch(backend.as_ref()).await;
        assert!(page.apply_month_load(back_to_may.load, may_result));
        let june_result = to_june.load.fetch(backend.as_ref()).await;
        assert!(!page.apply_month_load(to_june.load, june_result));

        assert_eq!(page.month(), may);
        assert_eq!(page.selections().get(ymd(2024, 5, 20)), Some(Morning));
        assert_eq!(page.selections().get(ymd(2024, 6, 3)), None);
    }

    #[tokio::test]
    async fn test_navigation_replaces_store() {
        let backend = Arc::new(MockBackend::new());
        backend.put_month(None, YearMonth::new(2024, 5).unwrap(), [(ymd(2024, 5, 20), Some(Morning))]);
        let mut page = page_with(backend.clone(), viewer());
        page.load().await;

        page.next_month().await;
        assert_eq!(page.month(), YearMonth::new(2024, 6).unwrap());
        assert!(page.selections().is_empty());

        page.previous_month().await;
        assert_eq!(page.month(), YearMonth::new(2024, 5).unwrap());
        assert_eq!(page.selections().get(ymd(2024, 5, 20)), Some(Morning));
    }

    #[tokio::test]
    async fn test_custom_filter_needs_both_dates() {
        let backend = Arc::new(MockBackend::new());
        let mut page = page_with(backend.clone(), viewer());

        page.set_filter_custom();
        page.set_custom_start(Some(ymd(2024, 1, 1)));
        assert!(!page.confirm_custom().await);
        assert!(backend.statistics_queries().is_empty());

        page.set_custom_end(Some(ymd(2024, 3, 31)));
        assert!(page.confirm_custom().await);
        let queries = backend.statistics_queries();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].filter_type, FilterType::Custom);
    }

    #[tokio::test]
    async fn test_year_filter_does_not_touch_selections() {
        let backend = Arc::new(MockBackend::new());
        backend.put_month(None, YearMonth::new(2024, 5).unwrap(), [(ymd(2024, 5, 20), Some(Morning))]);
        let mut page = page_with(backend.clone(), viewer());
        page.load().await;

        page.set_filter_year().await;
        let query = backend.statistics_queries()[0];
        assert_eq!(query.start_date, ymd(2024, 1, 1));
        assert_eq!(query.end_date, ymd(2024, 12, 31));
        assert_eq!(page.selections().get(ymd(2024, 5, 20)), Some(Morning));
    }

    #[tokio::test]
    async fn test_stale_statistics_are_ignored() {
        let backend = Arc::new(MockBackend::new());
        let mut page = page_with(backend.clone(), viewer());

        let year = page.begin_filter_year();
        let month = page.begin_filter_month();
        let year_result = year.fetch(backend.as_ref()).await;
        assert!(!page.apply_statistics(year, year_result));
        let month_result = month.fetch(backend.as_ref()).await;
        assert!(page.apply_statistics(month, month_result));
        assert_eq!(page.statistics().unwrap().filter_type, FilterType::Month);
    }

    #[tokio::test]
    async fn test_missing_statistics_become_notice() {
        let backend = Arc::new(MockBackend::new());
        backend.without_statistics();
        let mut page = page_with(backend.clone(), viewer());
        page.set_filter_year().await;
        assert!(page.statistics().is_none());
        assert_eq!(page.take_notices()[0].level, crate::view::NoticeLevel::Info);
    }

    #[tokio::test]
    async fn test_staff_browsing_requires_admin() {
        let backend = Arc::new(MockBackend::new());
        let mut page = page_with(backend.clone(), viewer());
        page.load_staff().await;
        assert!(page.staff().is_empty());
        assert!(!page.view_staff(Some(2)).await);
    }

    #[tokio::test]
    async fn test_admin_browses_staff_read_only() {
        let backend = Arc::new(MockBackend::new());
        let may = YearMonth::new(2024, 5).unwrap();
        backend.put_month(Some(2), may, [(ymd(2024, 5, 14), Some(Evening))]);
        let mut page = page_with(backend.clone(), viewer().admin());

        page.load_staff().await;
        assert!(!page.staff().is_empty());
        assert!(page.view_staff(Some(2)).await);
        assert_eq!(page.selections().get(ymd(2024, 5, 14)), Some(Evening));
        assert!(!page.month_view().editable);

        assert!(!page.select(ymd(2024, 5, 20), Some(Morning)).await);
        assert!(backend.saved().is_empty());

        assert!(page.view_staff(None).await);
        assert!(page.is_own_calendar());
        assert_eq!(page.selections().get(ymd(2024, 5, 14)), None);
    }

    #[tokio::test]
    async fn test_bulk_save_sends_whole_month() {
        let backend = Arc::new(MockBackend::new());
        let mut page = page_with(backend.clone(), viewer());
        page.select(ymd(2024, 5, 20), Some(Morning)).await;
        assert!(page.save_month().await);

        let saved = backend.saved();
        let bulk = saved.last().unwrap();
        assert!(!bulk.is_single_update);
        assert_eq!(bulk.selections.len(), 31);
    }

    #[test]
    fn test_month_view_counts_requirements() {
        let backend = Arc::new(MockBackend::new());
        let mut page = page_with(backend, viewer());
        // Week of 20 May 2024: three weekdays and both weekend days
        for d in [20, 21, 22, 25, 26] {
            let op = page.begin_select(ymd(2024, 5, d), Some(Morning)).unwrap();
            page.apply_save(op, Ok(SaveResponse { success: true, message: None }));
        }
        let view = page.month_view();
        assert_eq!(view.complete_weeks(), 1);
        assert_eq!(view.title, "May 2024");
        assert_eq!(view.options.len(), 4);
    }

    #[test]
    fn test_notices_are_bounded() {
        let backend = Arc::new(MockBackend::new());
        let mut page = page_with(backend, viewer());
        for i in 0..20 {
            page.notify(Notice::info(format!("n{}", i)));
        }
        let notices = page.take_notices();
        assert_eq!(notices.len(), MAX_NOTICES);
        assert_eq!(notices.last().unwrap().message, "n19");
        assert!(page.take_notices().is_empty());
    }

    #[test]
    fn test_block_on_load() {
        let backend = Arc::new(MockBackend::new());
        let mut page = page_with(backend, viewer());
        tokio_test::block_on(page.load());
        assert!(page.selections().is_empty());
    }
}
