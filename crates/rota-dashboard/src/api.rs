//! Dashboard routes and handlers
//!
//! Handlers hold the page lock only while touching page state. Backend
//! round trips run unlocked between the `begin_*` and `apply_*` halves.

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{Form, Query, State},
    response::{Html, IntoResponse, Json, Redirect},
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use rota_core::{
    parse_date, AvailabilityBackend, AvailabilityOption, AvailabilityPage, FilterType, Navigation, RotaError, SaveOp,
    StatsRefresh, UserId,
};
use serde::Deserialize;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::render::{render_page, Layout};

/// Supplies the current date
pub type Clock = fn() -> NaiveDate;

/// Dashboard state shared across handlers
#[derive(Clone)]
pub struct DashboardState {
    /// The single page session
    pub page: Arc<Mutex<AvailabilityPage>>,
    backend: Arc<dyn AvailabilityBackend>,
    clock: Option<Clock>,
}

impl DashboardState {
    /// Create a new dashboard state
    pub fn new(page: AvailabilityPage) -> Self {
        let backend = page.backend();
        Self {
            page: Arc::new(Mutex::new(page)),
            backend,
            clock: None,
        }
    }

    /// Keep the page's notion of today current on every request
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Load the first month and, for admins, the staff list
    pub async fn prime(&self) {
        let mut page = self.page.lock().await;
        page.load().await;
        if page.viewer().is_admin {
            page.load_staff().await;
        }
    }

    async fn tick(&self) {
        if let Some(clock) = self.clock {
            self.page.lock().await.set_today(clock());
        }
    }

    async fn run_navigation(&self, navigation: Navigation) {
        let load = navigation.load;
        let result = load.fetch(self.backend.as_ref()).await;
        self.page.lock().await.apply_month_load(load, result);

        if let Some(refresh) = navigation.stats {
            self.run_stats(refresh).await;
        }
    }

    async fn run_stats(&self, refresh: StatsRefresh) {
        let result = refresh.fetch(self.backend.as_ref()).await;
        self.page.lock().await.apply_statistics(refresh, result);
    }

    async fn run_save(&self, op: SaveOp) {
        let result = op.send(self.backend.as_ref()).await;
        let outcome = self.page.lock().await.apply_save(op, result);
        if let Some(refresh) = outcome.refresh() {
            self.run_stats(refresh).await;
        }
    }

    async fn reject(&self, error: RotaError) {
        self.page.lock().await.reject(error);
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub layout: Layout,
}

#[derive(Debug, Default, Deserialize)]
pub struct LayoutForm {
    #[serde(default)]
    pub layout: Layout,
}

#[derive(Debug, Deserialize)]
pub struct SelectForm {
    pub date: String,
    /// Option id to toggle; empty clears the day
    #[serde(default)]
    pub option: String,
    #[serde(default)]
    pub layout: Layout,
}

#[derive(Debug, Deserialize)]
pub struct FilterForm {
    pub filter_type: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub confirm: Option<String>,
    #[serde(default)]
    pub layout: Layout,
}

#[derive(Debug, Deserialize)]
pub struct StaffForm {
    /// Empty returns to the viewer's own calendar
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub layout: Layout,
}

/// Create the dashboard router
pub fn create_router(state: DashboardState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/month/next", post(next_month))
        .route("/month/previous", post(previous_month))
        .route("/select", post(select))
        .route("/save", post(save_month))
        .route("/filter", post(filter))
        .route("/statistics/recompute", post(recompute))
        .route("/staff", post(view_staff))
        .route("/api/month", get(month_json))
        .route("/api/health", get(health_check))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Blank form fields count as absent
fn optional_date(field: Option<&str>) -> Result<Option<NaiveDate>, RotaError> {
    match field.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_date(value).map(Some),
    }
}

/// Month page; notices are shown once
async fn index(State(state): State<Arc<DashboardState>>, Query(query): Query<PageQuery>) -> impl IntoResponse {
    state.tick().await;
    let mut page = state.page.lock().await;
    let view = page.month_view();
    page.take_notices();
    drop(page);

    Html(render_page(&view, query.layout))
}

async fn month_json(State(state): State<Arc<DashboardState>>) -> impl IntoResponse {
    let view = state.page.lock().await.month_view();
    Json(view)
}

async fn next_month(State(state): State<Arc<DashboardState>>, Form(form): Form<LayoutForm>) -> Redirect {
    let navigation = {
        let mut page = state.page.lock().await;
        let month = page.month().next();
        page.begin_navigation(month)
    };
    state.run_navigation(navigation).await;
    Redirect::to(&form.layout.home())
}

async fn previous_month(State(state): State<Arc<DashboardState>>, Form(form): Form<LayoutForm>) -> Redirect {
    let navigation = {
        let mut page = state.page.lock().await;
        let month = page.month().previous();
        page.begin_navigation(month)
    };
    state.run_navigation(navigation).await;
    Redirect::to(&form.layout.home())
}

async fn select(State(state): State<Arc<DashboardState>>, Form(form): Form<SelectForm>) -> Redirect {
    state.tick().await;
    debug!(date = %form.date, option = %form.option, "Selection posted");

    let op = {
        let mut page = state.page.lock().await;
        parse_date(&form.date).and_then(|date| match form.option.trim() {
            "" => page.begin_select(date, None),
            id => AvailabilityOption::from_str(id).and_then(|option| page.begin_toggle(date, option)),
        })
    };

    match op {
        Ok(op) => state.run_save(op).await,
        Err(e) => state.reject(e).await,
    }
    Redirect::to(&form.layout.home())
}

async fn save_month(State(state): State<Arc<DashboardState>>, Form(form): Form<LayoutForm>) -> Redirect {
    let op = state.page.lock().await.begin_save_month();
    match op {
        Ok(op) => state.run_save(op).await,
        Err(e) => state.reject(e).await,
    }
    Redirect::to(&form.layout.home())
}

async fn filter(State(state): State<Arc<DashboardState>>, Form(form): Form<FilterForm>) -> Redirect {
    let refresh = {
        let mut page = state.page.lock().await;
        match FilterType::from_str(&form.filter_type) {
            Ok(FilterType::Month) => Ok(Some(page.begin_filter_month())),
            Ok(FilterType::Year) => Ok(Some(page.begin_filter_year())),
            Ok(FilterType::Custom) => {
                // Absent fields keep whatever range was entered before
                let range = optional_date(form.start_date.as_deref())
                    .and_then(|start| Ok((start, optional_date(form.end_date.as_deref())?)));
                range.map(|(start, end)| {
                    page.set_filter_custom();
                    if form.start_date.is_some() {
                        page.set_custom_start(start);
                    }
                    if form.end_date.is_some() {
                        page.set_custom_end(end);
                    }
                    if form.confirm.is_some() {
                        page.begin_confirm_custom()
                    } else {
                        None
                    }
                })
            }
            Err(e) => Err(e),
        }
    };

    match refresh {
        Ok(Some(refresh)) => state.run_stats(refresh).await,
        Ok(None) => {}
        Err(e) => state.reject(e).await,
    }
    Redirect::to(&form.layout.home())
}

async fn recompute(State(state): State<Arc<DashboardState>>, Form(form): Form<LayoutForm>) -> Redirect {
    let refresh = state.page.lock().await.begin_recompute();
    if let Some(refresh) = refresh {
        state.run_stats(refresh).await;
    }
    Redirect::to(&form.layout.home())
}

async fn view_staff(State(state): State<Arc<DashboardState>>, Form(form): Form<StaffForm>) -> Redirect {
    let user_id = match form.user_id.trim() {
        "" => Ok(None),
        raw => raw
            .parse::<UserId>()
            .map(Some)
            .map_err(|_| RotaError::Validation(format!("invalid staff id '{}'", raw))),
    };

    let navigation = match user_id {
        Ok(user_id) => state.page.lock().await.begin_view_staff(user_id),
        Err(e) => Err(e),
    };
    match navigation {
        Ok(navigation) => state.run_navigation(navigation).await,
        Err(e) => state.reject(e).await,
    }
    Redirect::to(&form.layout.home())
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "rota-dashboard"
    }))
}
