//! Soft-delete lifecycle shared by every persisted record.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Record lifecycle (`status` column): 1 active, 0 inactive/hidden, 2 retired.
///
/// Orthogonal to any workflow state a record may carry. "Deleting" a record is
/// always a move to `Retired`, never a physical delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub enum LifecycleStatus {
    Inactive,
    #[default]
    Active,
    Retired,
}

impl LifecycleStatus {
    pub const fn code(self) -> i16 {
        match self {
            LifecycleStatus::Inactive => 0,
            LifecycleStatus::Active => 1,
            LifecycleStatus::Retired => 2,
        }
    }

    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(LifecycleStatus::Inactive),
            1 => Some(LifecycleStatus::Active),
            2 => Some(LifecycleStatus::Retired),
            _ => None,
        }
    }

    pub fn is_active(self) -> bool {
        self == LifecycleStatus::Active
    }
}

impl TryFrom<i16> for LifecycleStatus {
    type Error = DomainError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        Self::from_code(value)
            .ok_or_else(|| DomainError::validation(format!("illegal status code {value}")))
    }
}

impl From<LifecycleStatus> for i16 {
    fn from(value: LifecycleStatus) -> Self {
        value.code()
    }
}
