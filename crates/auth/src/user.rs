//! Back-office user accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use nova_core::{DomainError, DomainResult, Entity, LifecycleStatus, RoleId, UserId};

/// A console user.
///
/// # Invariants
/// - The superuser can never be edited, disabled, or deleted through the API.
/// - Only a disabled (`Inactive`) user may be deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: UserId,
    pub username: String,
    pub name: Option<String>,
    pub code: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub superuser: bool,
    pub role_ids: Vec<RoleId>,
    pub lifecycle: LifecycleStatus,
    pub created_by: Option<UserId>,
    pub updated_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for UserAccount {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn lifecycle(&self) -> LifecycleStatus {
        self.lifecycle
    }
}

impl UserAccount {
    pub fn ensure_mutable(&self) -> DomainResult<()> {
        if self.superuser {
            return Err(DomainError::forbidden("the superuser cannot be modified"));
        }
        Ok(())
    }

    pub fn ensure_deletable(&self) -> DomainResult<()> {
        self.ensure_mutable()?;
        match self.lifecycle {
            LifecycleStatus::Active => Err(DomainError::invalid_state(
                "active users cannot be deleted; disable the user first",
            )),
            LifecycleStatus::Retired => Err(DomainError::already_retired("user")),
            LifecycleStatus::Inactive => Ok(()),
        }
    }

    pub fn can_log_in(&self) -> bool {
        self.lifecycle.is_active()
    }
}

/// Target of a status toggle; deletion goes through its own operation.
pub fn validate_status_change(target: LifecycleStatus) -> DomainResult<()> {
    if target == LifecycleStatus::Retired {
        return Err(DomainError::forbidden("use delete to retire a user"));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: Option<String>,
    pub code: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub id: UserId,
    pub username: String,
    pub profile: UserProfile,
    pub password_hash: String,
    pub superuser: bool,
    pub role_ids: Vec<RoleId>,
    pub created_by: Option<UserId>,
}

impl NewUser {
    pub fn validate(&self) -> DomainResult<()> {
        let username = self.username.trim();
        if username.is_empty() {
            return Err(DomainError::validation("username cannot be empty"));
        }
        if username.len() > 64 {
            return Err(DomainError::validation("username is limited to 64 characters"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserChanges {
    pub profile: UserProfile,
    /// `Some` replaces the stored password hash.
    pub password_hash: Option<String>,
    pub role_ids: Vec<RoleId>,
    pub updated_by: UserId,
}

/// Filters for user listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserQuery {
    pub username: Option<String>,
    pub name: Option<String>,
    pub code: Option<String>,
    pub role_id: Option<RoleId>,
    pub lifecycle: LifecycleStatus,
    /// Users never listed (typically the caller).
    pub exclude: Vec<UserId>,
}

impl Default for UserQuery {
    fn default() -> Self {
        Self {
            username: None,
            name: None,
            code: None,
            role_id: None,
            lifecycle: LifecycleStatus::Active,
            exclude: Vec::new(),
        }
    }
}

impl UserQuery {
    /// The superuser is never part of a listing.
    pub fn matches(&self, user: &UserAccount) -> bool {
        fn contains(field: Option<&str>, needle: Option<&str>) -> bool {
            match needle {
                None => true,
                Some(n) => field.is_some_and(|f| f.contains(n)),
            }
        }

        !user.superuser
            && user.lifecycle == self.lifecycle
            && !self.exclude.contains(&user.id)
            && contains(Some(&user.username), self.username.as_deref())
            && contains(user.name.as_deref(), self.name.as_deref())
            && contains(user.code.as_deref(), self.code.as_deref())
            && self.role_id.is_none_or(|r| user.role_ids.contains(&r))
    }
}
