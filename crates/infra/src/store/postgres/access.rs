use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Row};
use tracing::instrument;
use uuid::Uuid;

use nova_auth::{
    AclEntry, AclFields, NewAcl, NewRole, NewUser, Role, RoleFields, UserAccount, UserChanges,
    UserQuery,
};
use nova_core::{AclId, LifecycleStatus, Page, Paged, RoleId, UserId};

use super::{like_pattern, map_sqlx_error};
use crate::error::StoreError;
use crate::store::{AccessStore, StoreResult};

const USER_SELECT: &str = "SELECT u.id, u.username, u.name, u.code, u.phone, u.email, \
     u.password_hash, u.superuser, u.status, u.created_by, u.updated_by, u.created_at, \
     u.updated_at, ARRAY(SELECT ur.role_id FROM user_roles ur WHERE ur.user_id = u.id \
     ORDER BY ur.role_id) AS role_ids FROM users u";

const ROLE_SELECT: &str = "SELECT r.id, r.name, r.remark, r.status, r.created_by, \
     r.updated_by, r.created_at, r.updated_at, ARRAY(SELECT ra.acl_id FROM role_acls ra \
     WHERE ra.role_id = r.id ORDER BY ra.acl_id) AS acl_ids FROM roles r";

const ACL_COLUMNS: &str = "id, parent_id, code, name, remark, status, created_by, updated_by, \
     created_at, updated_at";

/// Postgres-backed [`AccessStore`].
#[derive(Debug, Clone)]
pub struct PostgresAccessStore {
    pool: Arc<PgPool>,
}

impl PostgresAccessStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    async fn fetch_user(&self, clause: &str, operation: &str, arg: String) -> StoreResult<Option<UserAccount>> {
        let sql = format!("{USER_SELECT} WHERE {clause} LIMIT 1");
        let row = sqlx::query(&sql)
            .bind(arg)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;
        row.map(|r| decode_user(&r)).transpose()
    }

    async fn fetch_role(&self, id: Uuid) -> StoreResult<Option<Role>> {
        let sql = format!("{ROLE_SELECT} WHERE r.id = $1");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_role", e))?;
        row.map(|r| decode_role(&r)).transpose()
    }
}

fn ids<T: Copy + Into<Uuid>>(ids: &[T]) -> Vec<Uuid> {
    ids.iter().map(|id| (*id).into()).collect()
}

fn push_user_filters<'a>(qb: &mut QueryBuilder<'a, Postgres>, query: &'a UserQuery) {
    qb.push(" WHERE NOT u.superuser AND u.status = ")
        .push_bind(query.lifecycle.code());
    if !query.exclude.is_empty() {
        qb.push(" AND u.id <> ALL(").push_bind(ids(&query.exclude)).push(")");
    }
    if let Some(username) = &query.username {
        qb.push(" AND u.username LIKE ").push_bind(like_pattern(username));
    }
    if let Some(name) = &query.name {
        qb.push(" AND u.name LIKE ").push_bind(like_pattern(name));
    }
    if let Some(code) = &query.code {
        qb.push(" AND u.code LIKE ").push_bind(like_pattern(code));
    }
    if let Some(role_id) = query.role_id {
        qb.push(" AND EXISTS (SELECT 1 FROM user_roles ur WHERE ur.user_id = u.id AND ur.role_id = ")
            .push_bind(*role_id.as_uuid())
            .push(")");
    }
}

#[async_trait]
impl AccessStore for PostgresAccessStore {
    #[instrument(skip_all, fields(user_id = %new.id, username = %new.username), err)]
    async fn insert_user(&self, new: NewUser) -> StoreResult<UserAccount> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        sqlx::query(
            r#"
            INSERT INTO users (id, username, name, code, phone, email, password_hash, superuser,
                               status, created_by, updated_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
            "#,
        )
        .bind(new.id.as_uuid())
        .bind(&new.username)
        .bind(&new.profile.name)
        .bind(&new.profile.code)
        .bind(&new.profile.phone)
        .bind(&new.profile.email)
        .bind(&new.password_hash)
        .bind(new.superuser)
        .bind(LifecycleStatus::Active.code())
        .bind(new.created_by.map(Uuid::from))
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_user", e))?;

        sqlx::query(
            "INSERT INTO user_roles (user_id, role_id) SELECT $1, UNNEST($2::uuid[]) ON CONFLICT DO NOTHING",
        )
        .bind(new.id.as_uuid())
        .bind(ids(&new.role_ids))
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_user_roles", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        self.find_user(new.id)
            .await?
            .ok_or_else(|| StoreError::Backend("inserted user vanished".to_string()))
    }

    #[instrument(skip_all, fields(user_id = %id), err)]
    async fn find_user(&self, id: UserId) -> StoreResult<Option<UserAccount>> {
        let sql = format!("{USER_SELECT} WHERE u.id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_user", e))?;
        row.map(|r| decode_user(&r)).transpose()
    }

    #[instrument(skip(self), err)]
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<UserAccount>> {
        self.fetch_user(
            "u.username = $1 AND u.status <> 2",
            "find_user_by_username",
            username.to_string(),
        )
        .await
    }

    #[instrument(skip(self), err)]
    async fn find_superuser(&self) -> StoreResult<Option<UserAccount>> {
        let sql = format!("{USER_SELECT} WHERE u.superuser ORDER BY u.created_at LIMIT 1");
        let row = sqlx::query(&sql)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_superuser", e))?;
        row.map(|r| decode_user(&r)).transpose()
    }

    #[instrument(skip(self), err)]
    async fn list_users(&self, query: &UserQuery, page: Page) -> StoreResult<Paged<UserAccount>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users u");
        push_user_filters(&mut count, query);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_users", e))?;

        let mut select = QueryBuilder::<Postgres>::new(USER_SELECT);
        push_user_filters(&mut select, query);
        select
            .push(" ORDER BY u.created_at DESC, u.id DESC LIMIT ")
            .push_bind(page.limit() as i64)
            .push(" OFFSET ")
            .push_bind(page.offset() as i64);
        let rows = select
            .build()
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_users", e))?;

        Ok(Paged {
            count: total.max(0) as u64,
            rows: rows.iter().map(decode_user).collect::<StoreResult<_>>()?,
        })
    }

    #[instrument(skip_all, fields(user_id = %id), err)]
    async fn update_user(
        &self,
        id: UserId,
        changes: UserChanges,
    ) -> StoreResult<Option<UserAccount>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let updated = sqlx::query(
            r#"
            UPDATE users
            SET name = $1, code = $2, phone = $3, email = $4,
                password_hash = COALESCE($5, password_hash),
                updated_by = $6, updated_at = NOW()
            WHERE id = $7 AND status <> 2 AND NOT superuser
            "#,
        )
        .bind(&changes.profile.name)
        .bind(&changes.profile.code)
        .bind(&changes.profile.phone)
        .bind(&changes.profile.email)
        .bind(&changes.password_hash)
        .bind(changes.updated_by.as_uuid())
        .bind(id.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_user", e))?;

        if updated.rows_affected() == 0 {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Ok(None);
        }

        sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("clear_user_roles", e))?;
        sqlx::query(
            "INSERT INTO user_roles (user_id, role_id) SELECT $1, UNNEST($2::uuid[]) ON CONFLICT DO NOTHING",
        )
        .bind(id.as_uuid())
        .bind(ids(&changes.role_ids))
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_user_roles", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        self.find_user(id).await
    }

    #[instrument(skip(self), err)]
    async fn set_user_status(
        &self,
        id: UserId,
        status: LifecycleStatus,
        actor: UserId,
    ) -> StoreResult<u64> {
        if status == LifecycleStatus::Retired {
            return Ok(0);
        }
        let result = sqlx::query(
            r#"
            UPDATE users SET status = $1, updated_by = $2, updated_at = NOW()
            WHERE id = $3 AND status <> 2 AND NOT superuser
            "#,
        )
        .bind(status.code())
        .bind(actor.as_uuid())
        .bind(id.as_uuid())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("set_user_status", e))?;
        Ok(result.rows_affected())
    }

    #[instrument(skip(self), err)]
    async fn retire_user(&self, id: UserId, actor: UserId) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE users SET status = $1, updated_by = $2, updated_at = NOW()
            WHERE id = $3 AND status = $4 AND NOT superuser
            "#,
        )
        .bind(LifecycleStatus::Retired.code())
        .bind(actor.as_uuid())
        .bind(id.as_uuid())
        .bind(LifecycleStatus::Inactive.code())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("retire_user", e))?;
        Ok(result.rows_affected())
    }

    #[instrument(skip_all, fields(role_id = %new.id, name = %new.fields.name), err)]
    async fn insert_role(&self, new: NewRole) -> StoreResult<Role> {
        sqlx::query(
            r#"
            INSERT INTO roles (id, name, remark, status, created_by, updated_by)
            VALUES ($1, $2, $3, $4, $5, $5)
            "#,
        )
        .bind(new.id.as_uuid())
        .bind(&new.fields.name)
        .bind(&new.fields.remark)
        .bind(LifecycleStatus::Active.code())
        .bind(new.created_by.as_uuid())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_role", e))?;

        self.fetch_role(*new.id.as_uuid())
            .await?
            .ok_or_else(|| StoreError::Backend("inserted role vanished".to_string()))
    }

    #[instrument(skip_all, fields(role_id = %id), err)]
    async fn find_role(&self, id: RoleId) -> StoreResult<Option<Role>> {
        self.fetch_role(*id.as_uuid()).await
    }

    #[instrument(skip(self), err)]
    async fn find_role_by_name(
        &self,
        name: &str,
        excluding: Option<RoleId>,
    ) -> StoreResult<Option<Role>> {
        let sql = format!(
            "{ROLE_SELECT} WHERE r.name = $1 AND r.status <> 2 AND ($2::uuid IS NULL OR r.id <> $2) LIMIT 1"
        );
        let row = sqlx::query(&sql)
            .bind(name)
            .bind(excluding.map(Uuid::from))
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_role_by_name", e))?;
        row.map(|r| decode_role(&r)).transpose()
    }

    #[instrument(skip(self), err)]
    async fn list_roles(&self) -> StoreResult<Vec<Role>> {
        let sql = format!("{ROLE_SELECT} WHERE r.status <> 2 ORDER BY r.name");
        let rows = sqlx::query(&sql)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_roles", e))?;
        rows.iter().map(decode_role).collect()
    }

    #[instrument(skip_all, fields(role_id = %id), err)]
    async fn update_role(
        &self,
        id: RoleId,
        fields: RoleFields,
        actor: UserId,
    ) -> StoreResult<Option<Role>> {
        let result = sqlx::query(
            r#"
            UPDATE roles SET name = $1, remark = $2, updated_by = $3, updated_at = NOW()
            WHERE id = $4 AND status <> 2
            "#,
        )
        .bind(&fields.name)
        .bind(&fields.remark)
        .bind(actor.as_uuid())
        .bind(id.as_uuid())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_role", e))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.fetch_role(*id.as_uuid()).await
    }

    #[instrument(skip(self), err)]
    async fn retire_role(&self, id: RoleId, actor: UserId) -> StoreResult<u64> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let result = sqlx::query(
            r#"
            UPDATE roles SET status = $1, updated_by = $2, updated_at = NOW()
            WHERE id = $3 AND status <> 2
            "#,
        )
        .bind(LifecycleStatus::Retired.code())
        .bind(actor.as_uuid())
        .bind(id.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("retire_role", e))?;

        if result.rows_affected() > 0 {
            sqlx::query("DELETE FROM user_roles WHERE role_id = $1")
                .bind(id.as_uuid())
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("clear_role_users", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(result.rows_affected())
    }

    #[instrument(skip_all, fields(role_id = %id, users = users.len()), err)]
    async fn set_role_users(&self, id: RoleId, users: &[UserId]) -> StoreResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;
        sqlx::query("DELETE FROM user_roles WHERE role_id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("clear_role_users", e))?;
        sqlx::query(
            "INSERT INTO user_roles (user_id, role_id) SELECT UNNEST($1::uuid[]), $2 ON CONFLICT DO NOTHING",
        )
        .bind(ids(users))
        .bind(id.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_role_users", e))?;
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    #[instrument(skip_all, fields(role_id = %id, acls = acls.len()), err)]
    async fn set_role_acls(&self, id: RoleId, acls: &[AclId]) -> StoreResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;
        sqlx::query("DELETE FROM role_acls WHERE role_id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("clear_role_acls", e))?;
        sqlx::query(
            "INSERT INTO role_acls (role_id, acl_id) SELECT $1, UNNEST($2::uuid[]) ON CONFLICT DO NOTHING",
        )
        .bind(id.as_uuid())
        .bind(ids(acls))
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_role_acls", e))?;
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    #[instrument(skip_all, fields(acl_id = %new.id, code = %new.fields.code), err)]
    async fn insert_acl(&self, new: NewAcl) -> StoreResult<AclEntry> {
        let sql = format!(
            "INSERT INTO acls (id, parent_id, code, name, remark, status, created_by, updated_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $7) RETURNING {ACL_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(new.id.as_uuid())
            .bind(new.fields.parent_id.map(Uuid::from))
            .bind(&new.fields.code)
            .bind(&new.fields.name)
            .bind(&new.fields.remark)
            .bind(LifecycleStatus::Active.code())
            .bind(new.created_by.as_uuid())
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_acl", e))?;
        decode_acl(&row)
    }

    #[instrument(skip_all, fields(acl_id = %id), err)]
    async fn find_acl(&self, id: AclId) -> StoreResult<Option<AclEntry>> {
        let sql = format!("SELECT {ACL_COLUMNS} FROM acls WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_acl", e))?;
        row.map(|r| decode_acl(&r)).transpose()
    }

    #[instrument(skip(self), err)]
    async fn find_acl_conflict(
        &self,
        code: &str,
        name: &str,
        excluding: Option<AclId>,
    ) -> StoreResult<Option<AclEntry>> {
        let sql = format!(
            "SELECT {ACL_COLUMNS} FROM acls \
             WHERE (code = $1 OR name = $2) AND status <> 2 AND ($3::uuid IS NULL OR id <> $3) \
             LIMIT 1"
        );
        let row = sqlx::query(&sql)
            .bind(code)
            .bind(name)
            .bind(excluding.map(Uuid::from))
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_acl_conflict", e))?;
        row.map(|r| decode_acl(&r)).transpose()
    }

    #[instrument(skip(self), err)]
    async fn list_acls(&self) -> StoreResult<Vec<AclEntry>> {
        let sql = format!("SELECT {ACL_COLUMNS} FROM acls WHERE status <> 2 ORDER BY code");
        let rows = sqlx::query(&sql)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_acls", e))?;
        rows.iter().map(decode_acl).collect()
    }

    #[instrument(skip_all, fields(acl_id = %id), err)]
    async fn update_acl(
        &self,
        id: AclId,
        fields: AclFields,
        actor: UserId,
    ) -> StoreResult<Option<AclEntry>> {
        let sql = format!(
            "UPDATE acls SET parent_id = $1, code = $2, name = $3, remark = $4, updated_by = $5, \
             updated_at = NOW() WHERE id = $6 AND status <> 2 RETURNING {ACL_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(fields.parent_id.map(Uuid::from))
            .bind(&fields.code)
            .bind(&fields.name)
            .bind(&fields.remark)
            .bind(actor.as_uuid())
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_acl", e))?;
        row.map(|r| decode_acl(&r)).transpose()
    }

    #[instrument(skip(self), err)]
    async fn retire_acl(&self, id: AclId, actor: UserId) -> StoreResult<u64> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let result = sqlx::query(
            r#"
            UPDATE acls SET status = $1, updated_by = $2, updated_at = NOW()
            WHERE id = $3 AND status <> 2
            "#,
        )
        .bind(LifecycleStatus::Retired.code())
        .bind(actor.as_uuid())
        .bind(id.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("retire_acl", e))?;

        if result.rows_affected() > 0 {
            sqlx::query("DELETE FROM role_acls WHERE acl_id = $1")
                .bind(id.as_uuid())
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("clear_acl_grants", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(result.rows_affected())
    }
}

fn corrupt(err: sqlx::Error) -> StoreError {
    StoreError::Corrupt(err.to_string())
}

fn lifecycle(code: i16) -> StoreResult<LifecycleStatus> {
    LifecycleStatus::from_code(code)
        .ok_or_else(|| StoreError::Corrupt(format!("unknown status code {code}")))
}

fn decode_user(row: &PgRow) -> StoreResult<UserAccount> {
    let raw = UserRow::from_row(row).map_err(corrupt)?;
    Ok(UserAccount {
        id: UserId::from_uuid(raw.id),
        username: raw.username,
        name: raw.name,
        code: raw.code,
        phone: raw.phone,
        email: raw.email,
        password_hash: raw.password_hash,
        superuser: raw.superuser,
        role_ids: raw.role_ids.into_iter().map(RoleId::from_uuid).collect(),
        lifecycle: lifecycle(raw.status)?,
        created_by: raw.created_by.map(UserId::from_uuid),
        updated_by: raw.updated_by.map(UserId::from_uuid),
        created_at: raw.created_at,
        updated_at: raw.updated_at,
    })
}

fn decode_role(row: &PgRow) -> StoreResult<Role> {
    let raw = RoleRow::from_row(row).map_err(corrupt)?;
    Ok(Role {
        id: RoleId::from_uuid(raw.id),
        name: raw.name,
        remark: raw.remark,
        acl_ids: raw.acl_ids.into_iter().map(AclId::from_uuid).collect(),
        lifecycle: lifecycle(raw.status)?,
        created_by: raw.created_by.map(UserId::from_uuid),
        updated_by: raw.updated_by.map(UserId::from_uuid),
        created_at: raw.created_at,
        updated_at: raw.updated_at,
    })
}

fn decode_acl(row: &PgRow) -> StoreResult<AclEntry> {
    let raw = AclRow::from_row(row).map_err(corrupt)?;
    Ok(AclEntry {
        id: AclId::from_uuid(raw.id),
        parent_id: raw.parent_id.map(AclId::from_uuid),
        code: raw.code,
        name: raw.name,
        remark: raw.remark,
        lifecycle: lifecycle(raw.status)?,
        created_by: raw.created_by.map(UserId::from_uuid),
        updated_by: raw.updated_by.map(UserId::from_uuid),
        created_at: raw.created_at,
        updated_at: raw.updated_at,
    })
}

// SQLx row types

#[derive(Debug)]
struct UserRow {
    id: Uuid,
    username: String,
    name: Option<String>,
    code: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    password_hash: String,
    superuser: bool,
    role_ids: Vec<Uuid>,
    status: i16,
    created_by: Option<Uuid>,
    updated_by: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for UserRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(UserRow {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            name: row.try_get("name")?,
            code: row.try_get("code")?,
            phone: row.try_get("phone")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            superuser: row.try_get("superuser")?,
            role_ids: row.try_get("role_ids")?,
            status: row.try_get("status")?,
            created_by: row.try_get("created_by")?,
            updated_by: row.try_get("updated_by")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[derive(Debug)]
struct RoleRow {
    id: Uuid,
    name: String,
    remark: Option<String>,
    acl_ids: Vec<Uuid>,
    status: i16,
    created_by: Option<Uuid>,
    updated_by: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for RoleRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(RoleRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            remark: row.try_get("remark")?,
            acl_ids: row.try_get("acl_ids")?,
            status: row.try_get("status")?,
            created_by: row.try_get("created_by")?,
            updated_by: row.try_get("updated_by")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[derive(Debug)]
struct AclRow {
    id: Uuid,
    parent_id: Option<Uuid>,
    code: String,
    name: String,
    remark: Option<String>,
    status: i16,
    created_by: Option<Uuid>,
    updated_by: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for AclRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(AclRow {
            id: row.try_get("id")?,
            parent_id: row.try_get("parent_id")?,
            code: row.try_get("code")?,
            name: row.try_get("name")?,
            remark: row.try_get("remark")?,
            status: row.try_get("status")?,
            created_by: row.try_get("created_by")?,
            updated_by: row.try_get("updated_by")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}
