//! Access management: users, roles, ACL entries, login and principal resolution.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use nova_auth::{
    AclEntry, AclFields, AuthError, Hs256Jwt, IssuedToken, JwtValidator, NewAcl, NewRole, NewUser,
    PasswordHasher, Principal, Role, RoleFields, UserAccount, UserChanges, UserProfile, UserQuery,
    check_no_cycle, validate_status_change,
};
use nova_core::{
    AclId, ActorContext, DomainError, Entity, LifecycleStatus, Page, Paged, RoleId, UserId,
};

use crate::error::ServiceResult;
use crate::store::AccessStore;

/// Input for a new console user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInput {
    pub username: String,
    pub password: String,
    pub profile: UserProfile,
    pub role_ids: Vec<RoleId>,
}

/// Input for an update. A blank or absent password keeps the current one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserUpdate {
    pub profile: UserProfile,
    pub password: Option<String>,
    pub role_ids: Vec<RoleId>,
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: UserAccount,
    pub token: IssuedToken,
}

#[derive(Clone)]
pub struct AccessService {
    store: Arc<dyn AccessStore>,
    hasher: PasswordHasher,
    jwt: Arc<Hs256Jwt>,
}

impl AccessService {
    pub fn new(store: Arc<dyn AccessStore>, hasher: PasswordHasher, jwt: Arc<Hs256Jwt>) -> Self {
        Self { store, hasher, jwt }
    }

    /// Token validator backing the HTTP auth middleware.
    pub fn validator(&self) -> Arc<dyn JwtValidator> {
        self.jwt.clone()
    }

    // ---- authentication ----

    pub async fn login(
        &self,
        username: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> ServiceResult<Session> {
        let user = self
            .store
            .find_user_by_username(username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        if !self.verify_password(password, &user.password_hash).await? {
            tracing::info!(username, "login rejected");
            return Err(AuthError::InvalidCredentials.into());
        }
        if !user.can_log_in() {
            return Err(AuthError::AccountDisabled.into());
        }

        let token = self.jwt.issue(user.id, now).map_err(AuthError::from)?;
        tracing::info!(user = %user.id, username, "login");
        Ok(Session { user, token })
    }

    /// Resolve the permissions of an authenticated user.
    ///
    /// Users that were disabled or deleted after their token was issued are
    /// rejected here.
    pub async fn principal_for(&self, user_id: UserId) -> ServiceResult<Principal> {
        let user = self
            .store
            .find_user(user_id)
            .await?
            .filter(UserAccount::can_log_in)
            .ok_or(DomainError::Unauthorized)?;
        if user.superuser {
            return Ok(Principal::resolve(&user, &[], &[]));
        }
        let roles = self.store.list_roles().await?;
        let acls = self.store.list_acls().await?;
        Ok(Principal::resolve(&user, &roles, &acls))
    }

    /// Create the superuser from configuration when none exists yet.
    pub async fn ensure_superuser(&self, username: &str, password: &str) -> ServiceResult<UserAccount> {
        if let Some(existing) = self.store.find_superuser().await? {
            return Ok(existing);
        }
        let password_hash = self.hash_password(password).await?;
        let new = NewUser {
            id: UserId::new(),
            username: username.to_string(),
            profile: UserProfile {
                name: Some(username.to_string()),
                code: None,
                phone: None,
                email: None,
            },
            password_hash,
            superuser: true,
            role_ids: Vec::new(),
            created_by: None,
        };
        new.validate()?;
        let user = self.store.insert_user(new).await?;
        tracing::info!(user = %user.id, username, "superuser created");
        Ok(user)
    }

    // ---- users ----

    /// The caller and the superuser never appear in the listing.
    pub async fn list_users(
        &self,
        ctx: &ActorContext,
        mut query: UserQuery,
        page: Page,
    ) -> ServiceResult<Paged<UserAccount>> {
        query.exclude.push(ctx.actor_id());
        Ok(self.store.list_users(&query, page).await?)
    }

    pub async fn get_user(&self, id: UserId) -> ServiceResult<UserAccount> {
        self.store
            .find_user(id)
            .await?
            .filter(|u| u.lifecycle != LifecycleStatus::Retired)
            .ok_or_else(|| DomainError::not_found("user").into())
    }

    pub async fn create_user(&self, ctx: &ActorContext, input: UserInput) -> ServiceResult<UserAccount> {
        self.check_roles(&input.role_ids).await?;
        let username = input.username.trim().to_string();
        if self.store.find_user_by_username(&username).await?.is_some() {
            return Err(DomainError::duplicate("username").into());
        }
        let password_hash = self.hash_password(&input.password).await?;
        let new = NewUser {
            id: UserId::new(),
            username,
            profile: input.profile,
            password_hash,
            superuser: false,
            role_ids: input.role_ids,
            created_by: Some(ctx.actor_id()),
        };
        new.validate()?;
        let user = self.store.insert_user(new).await?;
        tracing::info!(actor = %ctx.actor_id(), user = %user.id, "user created");
        Ok(user)
    }

    pub async fn update_user(
        &self,
        ctx: &ActorContext,
        id: UserId,
        update: UserUpdate,
    ) -> ServiceResult<UserAccount> {
        let current = self.get_user(id).await?;
        current.ensure_mutable()?;
        self.check_roles(&update.role_ids).await?;

        let password_hash = match update.password.as_deref().filter(|p| !p.is_empty()) {
            Some(password) => Some(self.hash_password(password).await?),
            None => None,
        };
        let updated = self
            .store
            .update_user(
                id,
                UserChanges {
                    profile: update.profile,
                    password_hash,
                    role_ids: update.role_ids,
                    updated_by: ctx.actor_id(),
                },
            )
            .await?
            .ok_or_else(|| DomainError::not_found("user"))?;
        Ok(updated)
    }

    /// Only a disabled, non-superuser account can be deleted.
    pub async fn delete_user(&self, ctx: &ActorContext, id: UserId) -> ServiceResult<u64> {
        let current = self
            .store
            .find_user(id)
            .await?
            .ok_or_else(|| DomainError::not_found("user"))?;
        current.ensure_deletable()?;
        let changed = self.store.retire_user(id, ctx.actor_id()).await?;
        tracing::info!(actor = %ctx.actor_id(), user = %id, changed, "user deleted");
        Ok(changed)
    }

    pub async fn set_user_status(
        &self,
        ctx: &ActorContext,
        id: UserId,
        status: LifecycleStatus,
    ) -> ServiceResult<u64> {
        validate_status_change(status)?;
        let current = self.get_user(id).await?;
        current.ensure_mutable()?;
        Ok(self.store.set_user_status(id, status, ctx.actor_id()).await?)
    }

    // ---- roles ----

    pub async fn list_roles(&self) -> ServiceResult<Vec<Role>> {
        Ok(self.store.list_roles().await?)
    }

    pub async fn get_role(&self, id: RoleId) -> ServiceResult<Role> {
        self.store
            .find_role(id)
            .await?
            .filter(|r| r.lifecycle != LifecycleStatus::Retired)
            .ok_or_else(|| DomainError::not_found("role").into())
    }

    pub async fn create_role(&self, ctx: &ActorContext, fields: RoleFields) -> ServiceResult<Role> {
        fields.validate()?;
        if self.store.find_role_by_name(&fields.name, None).await?.is_some() {
            return Err(DomainError::duplicate("role name").into());
        }
        Ok(self
            .store
            .insert_role(NewRole {
                id: RoleId::new(),
                fields,
                created_by: ctx.actor_id(),
            })
            .await?)
    }

    pub async fn update_role(
        &self,
        ctx: &ActorContext,
        id: RoleId,
        fields: RoleFields,
    ) -> ServiceResult<Role> {
        fields.validate()?;
        if self.store.find_role_by_name(&fields.name, Some(id)).await?.is_some() {
            return Err(DomainError::duplicate("role name").into());
        }
        self.store
            .update_role(id, fields, ctx.actor_id())
            .await?
            .ok_or_else(|| DomainError::not_found("role").into())
    }

    pub async fn delete_role(&self, ctx: &ActorContext, id: RoleId) -> ServiceResult<u64> {
        Ok(self.store.retire_role(id, ctx.actor_id()).await?)
    }

    /// Replace the members of a role. Every user must exist and not be deleted.
    pub async fn set_role_users(
        &self,
        ctx: &ActorContext,
        id: RoleId,
        users: Vec<UserId>,
    ) -> ServiceResult<()> {
        self.get_role(id).await?;
        for user in &users {
            let live = self
                .store
                .find_user(*user)
                .await?
                .is_some_and(|u| u.lifecycle != LifecycleStatus::Retired);
            if !live {
                return Err(DomainError::validation("invalid user").into());
            }
        }
        self.store.set_role_users(id, &users).await?;
        tracing::info!(actor = %ctx.actor_id(), role = %id, members = users.len(), "role members replaced");
        Ok(())
    }

    /// Replace the ACL entries a role grants.
    pub async fn set_role_acls(
        &self,
        ctx: &ActorContext,
        id: RoleId,
        acls: Vec<AclId>,
    ) -> ServiceResult<()> {
        self.get_role(id).await?;
        for acl in &acls {
            let live = self
                .store
                .find_acl(*acl)
                .await?
                .is_some_and(|a| a.lifecycle != LifecycleStatus::Retired);
            if !live {
                return Err(DomainError::validation("invalid acl").into());
            }
        }
        self.store.set_role_acls(id, &acls).await?;
        tracing::info!(actor = %ctx.actor_id(), role = %id, grants = acls.len(), "role grants replaced");
        Ok(())
    }

    // ---- acl entries ----

    pub async fn list_acls(&self) -> ServiceResult<Vec<AclEntry>> {
        Ok(self.store.list_acls().await?)
    }

    pub async fn get_acl(&self, id: AclId) -> ServiceResult<AclEntry> {
        self.store
            .find_acl(id)
            .await?
            .filter(|a| a.lifecycle != LifecycleStatus::Retired)
            .ok_or_else(|| DomainError::not_found("acl").into())
    }

    pub async fn create_acl(&self, ctx: &ActorContext, fields: AclFields) -> ServiceResult<AclEntry> {
        fields.validate()?;
        self.check_acl_parent(fields.parent_id).await?;
        if self
            .store
            .find_acl_conflict(&fields.code, &fields.name, None)
            .await?
            .is_some()
        {
            return Err(DomainError::duplicate("acl code or name").into());
        }
        Ok(self
            .store
            .insert_acl(NewAcl {
                id: AclId::new(),
                fields,
                created_by: ctx.actor_id(),
            })
            .await?)
    }

    pub async fn update_acl(
        &self,
        ctx: &ActorContext,
        id: AclId,
        fields: AclFields,
    ) -> ServiceResult<AclEntry> {
        self.get_acl(id).await?;
        fields.validate()?;
        self.check_acl_parent(fields.parent_id).await?;

        let parents: HashMap<AclId, Option<AclId>> = self
            .store
            .list_acls()
            .await?
            .into_iter()
            .map(|a| (a.id, a.parent_id))
            .collect();
        check_no_cycle(id, fields.parent_id, |acl| parents.get(&acl).copied().flatten())?;

        if self
            .store
            .find_acl_conflict(&fields.code, &fields.name, Some(id))
            .await?
            .is_some()
        {
            return Err(DomainError::duplicate("acl code or name").into());
        }
        self.store
            .update_acl(id, fields, ctx.actor_id())
            .await?
            .ok_or_else(|| DomainError::not_found("acl").into())
    }

    pub async fn delete_acl(&self, ctx: &ActorContext, id: AclId) -> ServiceResult<u64> {
        Ok(self.store.retire_acl(id, ctx.actor_id()).await?)
    }

    // ---- helpers ----

    async fn check_roles(&self, role_ids: &[RoleId]) -> ServiceResult<()> {
        for id in role_ids {
            let active = self.store.find_role(*id).await?.is_some_and(|r| r.is_active());
            if !active {
                return Err(DomainError::validation("invalid role").into());
            }
        }
        Ok(())
    }

    async fn check_acl_parent(&self, parent: Option<AclId>) -> ServiceResult<()> {
        let Some(parent) = parent else {
            return Ok(());
        };
        let live = self
            .store
            .find_acl(parent)
            .await?
            .is_some_and(|a| a.lifecycle != LifecycleStatus::Retired);
        if !live {
            return Err(DomainError::parent_not_found("acl").into());
        }
        Ok(())
    }

    // bcrypt is CPU bound; keep it off the async workers.
    async fn hash_password(&self, password: &str) -> ServiceResult<String> {
        let hasher = self.hasher;
        let password = password.to_string();
        let hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))??;
        Ok(hash)
    }

    async fn verify_password(&self, password: &str, hash: &str) -> ServiceResult<bool> {
        let hasher = self.hasher;
        let password = password.to_string();
        let hash = hash.to_string();
        let ok = tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))??;
        Ok(ok)
    }
}
