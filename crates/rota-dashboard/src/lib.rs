//! rota-dashboard: web front end for the availability calendar
//!
//! Serves one page session as server-rendered HTML in a desktop or a
//! compact layout, plus a small JSON API.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rota_dashboard::{DashboardConfig, DashboardServer};
//!
//! let page = AvailabilityPage::new(backend, viewer, today, settings);
//! DashboardServer::new(DashboardConfig::default(), page).run().await?;
//! ```

pub mod api;
pub mod error;
pub mod render;
pub mod server;

pub use api::{create_router, Clock, DashboardState};
pub use error::{DashboardError, Result};
pub use render::{render_page, Layout};
pub use server::{DashboardConfig, DashboardServer};
