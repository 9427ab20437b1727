//! rota-core: staff availability scheduling core
//!
//! Month grids, the availability selection store, weekly coverage
//! requirements, the statistics reporting window and the page controller
//! that ties them to an [`AvailabilityBackend`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rota_core::{AvailabilityPage, Config};
//!
//! let config = Config::load()?;
//! let mut page = AvailabilityPage::new(backend, config.viewer_user(), today, config.page_settings());
//! page.load().await;
//! page.toggle(date, AvailabilityOption::Morning).await;
//! let view = page.month_view();
//! ```

pub mod backend;
pub mod calendar;
pub mod config;
pub mod error;
pub mod models;
pub mod options;
pub mod page;
pub mod requirement;
pub mod selection;
pub mod sequence;
pub mod stats;
pub mod view;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use backend::AvailabilityBackend;
pub use calendar::{date_key, is_weekend, month_grid_dates, parse_date, CalendarDay, CalendarGrid, YearMonth};
pub use config::{BackendConfig, CalendarConfig, Config, ServerConfig, ViewerConfig};
pub use error::{Result, RotaError};
pub use models::{MonthAvailability, SaveResponse, SaveSelectionsRequest, User, UserId};
pub use options::{AvailabilityOption, ColorCategory};
pub use page::{AvailabilityPage, MonthLoad, Navigation, PageSettings, SaveOp, SaveOutcome, StatsRefresh};
pub use requirement::{evaluate_week, BlockCount, RequirementThresholds, WeekRequirement};
pub use selection::{PendingEdit, Selection, SelectionStore};
pub use sequence::{RequestSequence, Ticket};
pub use stats::{FilterType, Statistics, StatisticsFilter, StatisticsQuery};
pub use view::{DayView, MonthView, Notice, NoticeLevel, StatisticsPanel, WeekView};
