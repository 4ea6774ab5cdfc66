//! ACL entries: the permission tree administrators grant to roles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use nova_core::{AclId, DomainError, DomainResult, Entity, LifecycleStatus, UserId};

use crate::Permission;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclEntry {
    pub id: AclId,
    pub parent_id: Option<AclId>,
    /// Permission code; unique among non-deleted entries.
    pub code: String,
    /// Display name; unique among non-deleted entries.
    pub name: String,
    pub remark: Option<String>,
    pub lifecycle: LifecycleStatus,
    pub created_by: Option<UserId>,
    pub updated_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AclEntry {
    pub fn permission(&self) -> Permission {
        Permission::new(self.code.clone())
    }
}

impl Entity for AclEntry {
    type Id = AclId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn lifecycle(&self) -> LifecycleStatus {
        self.lifecycle
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclFields {
    pub parent_id: Option<AclId>,
    pub code: String,
    pub name: String,
    pub remark: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAcl {
    pub id: AclId,
    pub fields: AclFields,
    pub created_by: UserId,
}

impl AclFields {
    pub fn validate(&self) -> DomainResult<()> {
        if self.code.trim().is_empty() {
            return Err(DomainError::validation("acl code cannot be empty"));
        }
        if self.code.len() > 30 || self.name.chars().count() > 30 {
            return Err(DomainError::validation("acl code and name are limited to 30 characters"));
        }
        if self.code.trim() == "*" {
            return Err(DomainError::validation("'*' is reserved"));
        }
        Ok(())
    }
}

/// Reject a parent assignment that would make an entry its own ancestor.
///
/// `parent_of` resolves the current parent of any entry.
pub fn check_no_cycle(
    id: AclId,
    new_parent: Option<AclId>,
    parent_of: impl Fn(AclId) -> Option<AclId>,
) -> DomainResult<()> {
    let mut cursor = new_parent;
    let mut hops = 0usize;
    while let Some(current) = cursor {
        if current == id {
            return Err(DomainError::validation("acl parent would create a cycle"));
        }
        hops += 1;
        if hops > 1024 {
            return Err(DomainError::validation("acl tree is too deep"));
        }
        cursor = parent_of(current);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn wildcard_code_is_reserved() {
        let fields = AclFields {
            parent_id: None,
            code: "*".into(),
            name: "all".into(),
            remark: None,
        };
        assert!(fields.validate().is_err());
    }

    #[test]
    fn detects_cycles_through_ancestors() {
        let root = AclId::new();
        let child = AclId::new();
        let grandchild = AclId::new();
        let parents: HashMap<AclId, AclId> = [(child, root), (grandchild, child)].into();

        let lookup = |id: AclId| parents.get(&id).copied();
        assert!(check_no_cycle(root, Some(grandchild), lookup).is_err());
        assert!(check_no_cycle(grandchild, Some(root), lookup).is_ok());
        assert!(check_no_cycle(root, None, lookup).is_ok());
    }
}
