//! Availability options
//!
//! The option set is fixed. Anything the backend or a form sends outside of
//! it is a validation failure.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RotaError;

/// Color category used by the views to tint an option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorCategory {
    Primary,
    Secondary,
    Success,
    Warning,
}

impl ColorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
            Self::Success => "success",
            Self::Warning => "warning",
        }
    }
}

/// One choice a staff member can make for a day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityOption {
    Morning,
    Evening,
    AllDay,
    Holiday,
}

impl AvailabilityOption {
    /// All options in display order
    pub const ALL: [AvailabilityOption; 4] = [
        AvailabilityOption::Morning,
        AvailabilityOption::Evening,
        AvailabilityOption::AllDay,
        AvailabilityOption::Holiday,
    ];

    /// Wire identifier
    pub fn id(&self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Evening => "evening",
            Self::AllDay => "all_day",
            Self::Holiday => "holiday",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Morning => "Morning shift",
            Self::Evening => "Evening shift",
            Self::AllDay => "All day",
            Self::Holiday => "Holiday",
        }
    }

    pub fn color(&self) -> ColorCategory {
        match self {
            Self::Morning => ColorCategory::Primary,
            Self::Evening => ColorCategory::Secondary,
            Self::AllDay => ColorCategory::Success,
            Self::Holiday => ColorCategory::Warning,
        }
    }

    /// Whether a day holding this option counts as a duty block.
    /// Holiday is leave, not availability.
    pub fn counts_as_duty(&self) -> bool {
        !matches!(self, Self::Holiday)
    }
}

impl fmt::Display for AvailabilityOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for AvailabilityOption {
    type Err = RotaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|o| o.id() == s.trim())
            .ok_or_else(|| RotaError::Validation(format!("unknown availability option '{}'", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_options() {
        for option in AvailabilityOption::ALL {
            assert_eq!(option.id().parse::<AvailabilityOption>().unwrap(), option);
        }
    }

    #[test]
    fn test_unknown_option_is_validation_error() {
        let err = "night".parse::<AvailabilityOption>().unwrap_err();
        assert_eq!(err.kind(), "validation");
    }

    #[test]
    fn test_serde_uses_wire_ids() {
        let json = serde_json::to_string(&AvailabilityOption::AllDay).unwrap();
        assert_eq!(json, "\"all_day\"");
        let parsed: AvailabilityOption = serde_json::from_str("\"evening\"").unwrap();
        assert_eq!(parsed, AvailabilityOption::Evening);
        assert!(serde_json::from_str::<AvailabilityOption>("\"night\"").is_err());
    }

    #[test]
    fn test_holiday_is_not_duty() {
        assert!(AvailabilityOption::Morning.counts_as_duty());
        assert!(AvailabilityOption::AllDay.counts_as_duty());
        assert!(!AvailabilityOption::Holiday.counts_as_duty());
    }
}
