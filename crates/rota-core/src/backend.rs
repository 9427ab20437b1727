//! Backend seam
//!
//! Persistence and statistics live behind this trait. `rota-client`
//! provides the HTTP implementation.

use async_trait::async_trait;

use crate::calendar::YearMonth;
use crate::error::Result;
use crate::models::{MonthAvailability, SaveResponse, SaveSelectionsRequest, User, UserId};
use crate::stats::{Statistics, StatisticsQuery};

#[async_trait]
pub trait AvailabilityBackend: Send + Sync {
    /// List staff users
    async fn list_staff(&self) -> Result<Vec<User>>;

    /// Availability and statistics of one month. `None` means the viewer.
    async fn month_availability(&self, user_id: Option<UserId>, month: YearMonth) -> Result<MonthAvailability>;

    /// Statistics for a reporting window. `RotaError::MissingData` when the
    /// backend has not computed any yet.
    async fn statistics(&self, user_id: Option<UserId>, query: &StatisticsQuery) -> Result<Statistics>;

    /// Ask the backend to recompute statistics for a window
    async fn recompute_statistics(&self, user_id: Option<UserId>, query: &StatisticsQuery) -> Result<Statistics>;

    /// Persist one or many selections
    async fn save_selections(&self, request: &SaveSelectionsRequest) -> Result<SaveResponse>;
}
