//! Roles group ACL grants and are assigned to users.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use nova_core::{AclId, DomainError, DomainResult, Entity, LifecycleStatus, RoleId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    /// Unique among non-deleted roles.
    pub name: String,
    pub remark: Option<String>,
    pub acl_ids: Vec<AclId>,
    pub lifecycle: LifecycleStatus,
    pub created_by: Option<UserId>,
    pub updated_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Role {
    type Id = RoleId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn lifecycle(&self) -> LifecycleStatus {
        self.lifecycle
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleFields {
    pub name: String,
    pub remark: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRole {
    pub id: RoleId,
    pub fields: RoleFields,
    pub created_by: UserId,
}

impl RoleFields {
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("role name cannot be empty"));
        }
        Ok(())
    }
}
