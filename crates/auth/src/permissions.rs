use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier: the `code` of an ACL entry (e.g. "products.read").
///
/// The wildcard `"*"` grants everything and is only held by the superuser.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const WILDCARD: Permission = Permission::from_static("*");

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Permission codes checked by the HTTP layer.
pub mod codes {
    use super::Permission;

    pub const USERS_READ: Permission = Permission::from_static("users.read");
    pub const USERS_WRITE: Permission = Permission::from_static("users.write");
    pub const ROLES_READ: Permission = Permission::from_static("roles.read");
    pub const ROLES_WRITE: Permission = Permission::from_static("roles.write");
    pub const ACLS_READ: Permission = Permission::from_static("acls.read");
    pub const ACLS_WRITE: Permission = Permission::from_static("acls.write");
    pub const PRODUCTS_READ: Permission = Permission::from_static("products.read");
    pub const PRODUCTS_WRITE: Permission = Permission::from_static("products.write");
    pub const PRODUCTS_PUBLISH: Permission = Permission::from_static("products.publish");
    pub const PACKAGES_READ: Permission = Permission::from_static("packages.read");
    pub const PACKAGES_WRITE: Permission = Permission::from_static("packages.write");
    pub const PACKAGES_PUBLISH: Permission = Permission::from_static("packages.publish");
    pub const DEVICES_READ: Permission = Permission::from_static("devices.read");

    /// Every code above, e.g. for seeding an ACL tree.
    pub const ALL: [Permission; 13] = [
        USERS_READ,
        USERS_WRITE,
        ROLES_READ,
        ROLES_WRITE,
        ACLS_READ,
        ACLS_WRITE,
        PRODUCTS_READ,
        PRODUCTS_WRITE,
        PRODUCTS_PUBLISH,
        PACKAGES_READ,
        PACKAGES_WRITE,
        PACKAGES_PUBLISH,
        DEVICES_READ,
    ];
}
