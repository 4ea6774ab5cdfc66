//! Postgres-backed store adapters.
//!
//! ## Error Mapping
//!
//! | SQLx error | PostgreSQL code | StoreError |
//! |---|---|---|
//! | Database (unique violation) | `23505` | `Duplicate` (named after the violated index) |
//! | Database (other) | any | `Backend` |
//! | PoolClosed / Io / other | n/a | `Backend` |
//!
//! ## Conditional updates
//!
//! Workflow transitions and retirement are single `UPDATE ... WHERE` statements;
//! `rows_affected()` is returned as-is so concurrent requests race in the
//! database and exactly one of a conflicting pair wins.

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::error::StoreError;

mod access;
mod catalog;

pub use access::PostgresAccessStore;
pub use catalog::PostgresCatalogStore;

const SCHEMA: &str = include_str!("schema.sql");

/// Open a pool against `database_url`.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, StoreError> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .map_err(|e| map_sqlx_error("connect", e))
}

/// Apply the (idempotent) schema.
pub async fn apply_schema(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::raw_sql(SCHEMA)
        .execute(pool)
        .await
        .map_err(|e| map_sqlx_error("apply_schema", e))?;
    Ok(())
}

pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            if db_err.code().as_deref() == Some("23505") {
                return StoreError::Duplicate(duplicate_key(db_err.constraint()).to_string());
            }
            StoreError::Backend(format!("database error in {}: {}", operation, db_err.message()))
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed during {}", operation))
        }
        sqlx::Error::ColumnDecode { index, source } => {
            StoreError::Corrupt(format!("column {} in {}: {}", index, operation, source))
        }
        other => StoreError::Backend(format!("sqlx error in {}: {}", operation, other)),
    }
}

/// User-facing name of the natural key behind a unique index.
fn duplicate_key(constraint: Option<&str>) -> &'static str {
    match constraint {
        Some("products_model_id_active") => "modelId",
        Some("product_packages_version_active") => "version",
        Some("users_username_live") => "username",
        Some("roles_name_live") => "role name",
        Some("acls_code_live") => "acl code",
        Some("acls_name_live") => "acl name",
        _ => "record",
    }
}

/// Escape `%`, `_` and `\` for use inside a `LIKE` pattern.
pub(crate) fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("Gate"), "%Gate%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn unique_indexes_name_their_keys() {
        assert_eq!(duplicate_key(Some("product_packages_version_active")), "version");
        assert_eq!(duplicate_key(Some("unknown")), "record");
        assert_eq!(duplicate_key(None), "record");
    }

    #[test]
    fn pool_closed_is_a_backend_error() {
        assert!(matches!(
            map_sqlx_error("find", sqlx::Error::PoolClosed),
            StoreError::Backend(_)
        ));
    }
}
