use std::collections::BTreeSet;

use nova_core::{Entity, UserId};

use crate::{AclEntry, Permission, Role, UserAccount};

/// A fully resolved principal for authorization decisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub username: String,
    pub permissions: Vec<Permission>,
}

impl Principal {
    pub fn has_wildcard(&self) -> bool {
        self.permissions.iter().any(Permission::is_wildcard)
    }
}

/// Effective permissions of `user`: ACL codes granted by their active roles.
///
/// Inactive roles and ACL entries grant nothing. The superuser holds `*`.
pub fn resolve_permissions(user: &UserAccount, roles: &[Role], acls: &[AclEntry]) -> Vec<Permission> {
    if user.superuser {
        return vec![Permission::WILDCARD];
    }

    let codes: BTreeSet<&str> = roles
        .iter()
        .filter(|r| r.is_active() && user.role_ids.contains(&r.id))
        .flat_map(|r| r.acl_ids.iter())
        .filter_map(|acl_id| acls.iter().find(|a| a.id == *acl_id && a.is_active()))
        .map(|a| a.code.as_str())
        .collect();

    codes.into_iter().map(|c| Permission::new(c.to_string())).collect()
}

impl Principal {
    pub fn resolve(user: &UserAccount, roles: &[Role], acls: &[AclEntry]) -> Self {
        Self {
            user_id: user.id,
            username: user.username.clone(),
            permissions: resolve_permissions(user, roles, acls),
        }
    }
}
