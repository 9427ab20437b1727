//! Wire models exchanged with the availability backend

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::YearMonth;
use crate::selection::Selection;
use crate::stats::Statistics;

pub type UserId = u64;

/// Staff member as listed by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    /// Administrators may browse other staff calendars
    #[serde(default)]
    pub is_admin: bool,
}

impl User {
    pub fn new(id: UserId, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            is_admin: false,
        }
    }

    pub fn admin(mut self) -> Self {
        self.is_admin = true;
        self
    }
}

/// One month of a staff member's availability
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthAvailability {
    pub year: i32,
    pub month: u32,
    /// `YYYY-MM-DD` to option id, or null when cleared
    #[serde(default)]
    pub selections: BTreeMap<NaiveDate, Selection>,
    #[serde(default)]
    pub statistics: Option<Statistics>,
}

/// Body of the availability save call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveSelectionsRequest {
    pub year: i32,
    pub month: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    pub selections: BTreeMap<NaiveDate, Selection>,
    /// true for a single cell toggle, false for a bulk save
    pub is_single_update: bool,
}

impl SaveSelectionsRequest {
    /// Save one cell
    pub fn single(month: YearMonth, user_id: Option<UserId>, date: NaiveDate, value: Selection) -> Self {
        Self {
            year: month.year(),
            month: month.month(),
            user_id,
            selections: BTreeMap::from([(date, value)]),
            is_single_update: true,
        }
    }

    /// Save many cells at once
    pub fn bulk(month: YearMonth, user_id: Option<UserId>, selections: BTreeMap<NaiveDate, Selection>) -> Self {
        Self {
            year: month.year(),
            month: month.month(),
            user_id,
            selections,
            is_single_update: false,
        }
    }
}

/// Acknowledgement of a save
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}
