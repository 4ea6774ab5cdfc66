use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Row};
use tracing::instrument;
use uuid::Uuid;

use nova_core::{DeviceLogId, LifecycleStatus, Page, Paged, PackageId, ProductId, UserId};
use nova_products::{
    ArtifactRef, DeviceLog, DeviceLogQuery, NewDeviceLog, NewPackage, NewProduct, PackageChanges,
    PackageListing, PackageQuery, Product, ProductChanges, ProductPackage, ProductQuery,
    ProductSummary, PublishStatus, Stage, Transition,
};

use super::{like_pattern, map_sqlx_error};
use crate::error::StoreError;
use crate::store::{CatalogStore, StoreResult};

const PRODUCT_COLUMNS: &str = "id, name, model, model_id, kind, stage, fit_products, area, dept, \
     project_manager, description, logo, publish_status, published_by, status, created_by, \
     updated_by, created_at, updated_at";

const PACKAGE_COLUMNS: &str = "pk.id, pk.product_id, pk.version, pk.version_log, pk.stage, \
     pk.size, pk.file_key, pk.publish_status, pk.published_by, pk.status, pk.created_by, \
     pk.updated_by, pk.created_at, pk.updated_at";

const DEVICE_LOG_COLUMNS: &str = "id, device_id, device_name, version, device_info, \
     device_status, software_ip, status, created_at";

/// Postgres-backed [`CatalogStore`].
#[derive(Debug, Clone)]
pub struct PostgresCatalogStore {
    pool: Arc<PgPool>,
}

impl PostgresCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    async fn fetch_product(&self, operation: &str, id: Uuid) -> StoreResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;
        row.map(|r| decode::<ProductRow, Product>(&r)).transpose()
    }

    async fn fetch_package(&self, operation: &str, id: Uuid) -> StoreResult<Option<ProductPackage>> {
        let sql = format!("SELECT {PACKAGE_COLUMNS} FROM product_packages pk WHERE pk.id = $1");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;
        row.map(|r| decode::<PackageRow, ProductPackage>(&r)).transpose()
    }
}

fn table_of(target: ArtifactRef) -> (&'static str, Uuid) {
    match target {
        ArtifactRef::Product(id) => ("products", *id.as_uuid()),
        ArtifactRef::Package(id) => ("product_packages", *id.as_uuid()),
    }
}

fn push_product_filters<'a>(qb: &mut QueryBuilder<'a, Postgres>, query: &'a ProductQuery) {
    qb.push(" WHERE status = ")
        .push_bind(LifecycleStatus::Active.code());
    if let Some(status) = query.publish_status {
        qb.push(" AND publish_status = ").push_bind(status.as_token());
    }
    if let Some(kind) = &query.kind {
        qb.push(" AND kind = ").push_bind(kind.as_str());
    }
    if let Some(name) = &query.name {
        qb.push(" AND name LIKE ").push_bind(like_pattern(name));
    }
}

fn push_package_filters<'a>(qb: &mut QueryBuilder<'a, Postgres>, query: &'a PackageQuery) {
    qb.push(" WHERE pk.status = ").push_bind(query.lifecycle.code());
    if let Some(product_id) = query.product_id {
        qb.push(" AND pk.product_id = ").push_bind(*product_id.as_uuid());
    }
    if let Some(version) = &query.version {
        qb.push(" AND pk.version = ").push_bind(version.as_str());
    }
    if let Some(stage) = query.stage {
        qb.push(" AND pk.stage = ").push_bind(stage.code());
    }
    if let Some(status) = query.publish_status {
        qb.push(" AND pk.publish_status = ").push_bind(status.as_token());
    }
    if let Some(from) = query.updated_from {
        qb.push(" AND pk.updated_at >= ").push_bind(from);
    }
    if let Some(to) = query.updated_to {
        qb.push(" AND pk.updated_at <= ").push_bind(to);
    }
}

fn push_device_log_filters<'a>(qb: &mut QueryBuilder<'a, Postgres>, query: &'a DeviceLogQuery) {
    qb.push(" WHERE status = ").push_bind(LifecycleStatus::Active.code());
    if let Some(device_id) = &query.device_id {
        qb.push(" AND device_id = ").push_bind(device_id.as_str());
    }
    if let Some(name) = &query.device_name {
        qb.push(" AND device_name LIKE ").push_bind(like_pattern(name));
    }
    if let Some(version) = &query.version {
        qb.push(" AND version = ").push_bind(version.as_str());
    }
}

fn push_page(qb: &mut QueryBuilder<'_, Postgres>, page: Page) {
    qb.push(" LIMIT ")
        .push_bind(page.limit() as i64)
        .push(" OFFSET ")
        .push_bind(page.offset() as i64);
}

#[async_trait]
impl CatalogStore for PostgresCatalogStore {
    #[instrument(skip_all, fields(product_id = %new.id, model_id = %new.fields.model_id), err)]
    async fn insert_product(&self, new: NewProduct) -> StoreResult<Product> {
        let f = &new.fields;
        let fit: Vec<Uuid> = f.fit_products.iter().map(|id| *id.as_uuid()).collect();
        let sql = format!(
            "INSERT INTO products (id, name, model, model_id, kind, stage, fit_products, area, \
             dept, project_manager, description, logo, publish_status, status, created_by, updated_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $15) \
             RETURNING {PRODUCT_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(new.id.as_uuid())
            .bind(&f.name)
            .bind(&f.model)
            .bind(&f.model_id)
            .bind(&f.kind)
            .bind(&f.stage)
            .bind(&fit)
            .bind(&f.area)
            .bind(&f.dept)
            .bind(&f.project_manager)
            .bind(&f.description)
            .bind(&new.logo)
            .bind(PublishStatus::Unpublished.as_token())
            .bind(LifecycleStatus::Active.code())
            .bind(new.created_by.as_uuid())
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_product", e))?;
        decode::<ProductRow, Product>(&row)
    }

    #[instrument(skip_all, fields(product_id = %id), err)]
    async fn find_product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        self.fetch_product("find_product", *id.as_uuid()).await
    }

    #[instrument(skip(self), err)]
    async fn find_active_product_by_model(
        &self,
        model_id: &str,
        excluding: Option<ProductId>,
    ) -> StoreResult<Option<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE model_id = $1 AND status = $2 AND ($3::uuid IS NULL OR id <> $3) LIMIT 1"
        );
        let row = sqlx::query(&sql)
            .bind(model_id)
            .bind(LifecycleStatus::Active.code())
            .bind(excluding.map(Uuid::from))
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_active_product_by_model", e))?;
        row.map(|r| decode::<ProductRow, Product>(&r)).transpose()
    }

    #[instrument(skip(self), err)]
    async fn list_products(&self, query: &ProductQuery, page: Page) -> StoreResult<Paged<Product>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products");
        push_product_filters(&mut count, query);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_products", e))?;

        let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {PRODUCT_COLUMNS} FROM products"));
        push_product_filters(&mut select, query);
        select.push(" ORDER BY created_at DESC, id DESC");
        push_page(&mut select, page);
        let rows = select
            .build()
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_products", e))?;

        Ok(Paged {
            count: total.max(0) as u64,
            rows: decode_all::<ProductRow, Product>(&rows)?,
        })
    }

    #[instrument(skip(self), err)]
    async fn list_active_product_summaries(&self) -> StoreResult<Vec<ProductSummary>> {
        let rows = sqlx::query("SELECT id, name FROM products WHERE status = $1 ORDER BY name")
            .bind(LifecycleStatus::Active.code())
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_active_product_summaries", e))?;
        rows.iter()
            .map(|row| {
                Ok(ProductSummary {
                    id: ProductId::from_uuid(row.try_get("id").map_err(corrupt)?),
                    name: row.try_get("name").map_err(corrupt)?,
                })
            })
            .collect()
    }

    #[instrument(skip_all, fields(products = ids.len()), err)]
    async fn latest_versions(&self, ids: &[ProductId]) -> StoreResult<HashMap<ProductId, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let ids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        // COLLATE "C" keeps MAX a plain byte-wise string comparison.
        let rows = sqlx::query(
            r#"
            SELECT product_id, MAX(version COLLATE "C") AS version
            FROM product_packages
            WHERE status = $1 AND product_id = ANY($2)
            GROUP BY product_id
            "#,
        )
        .bind(LifecycleStatus::Active.code())
        .bind(&ids)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("latest_versions", e))?;

        rows.iter()
            .map(|row| {
                let id: Uuid = row.try_get("product_id").map_err(corrupt)?;
                let version: String = row.try_get("version").map_err(corrupt)?;
                Ok((ProductId::from_uuid(id), version))
            })
            .collect()
    }

    #[instrument(skip_all, fields(product_id = %id), err)]
    async fn update_product(
        &self,
        id: ProductId,
        changes: ProductChanges,
    ) -> StoreResult<Option<Product>> {
        let f = &changes.fields;
        let fit: Vec<Uuid> = f.fit_products.iter().map(|id| *id.as_uuid()).collect();
        let sql = format!(
            "UPDATE products SET name = $1, model = $2, model_id = $3, kind = $4, stage = $5, \
             fit_products = $6, area = $7, dept = $8, project_manager = $9, description = $10, \
             logo = COALESCE($11, logo), updated_by = $12, updated_at = NOW() \
             WHERE id = $13 AND status = $14 \
             RETURNING {PRODUCT_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(&f.name)
            .bind(&f.model)
            .bind(&f.model_id)
            .bind(&f.kind)
            .bind(&f.stage)
            .bind(&fit)
            .bind(&f.area)
            .bind(&f.dept)
            .bind(&f.project_manager)
            .bind(&f.description)
            .bind(&changes.logo)
            .bind(changes.updated_by.as_uuid())
            .bind(id.as_uuid())
            .bind(LifecycleStatus::Active.code())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_product", e))?;
        row.map(|r| decode::<ProductRow, Product>(&r)).transpose()
    }

    #[instrument(
        skip_all,
        fields(package_id = %new.id, product_id = %new.fields.product_id, version = %new.fields.version),
        err
    )]
    async fn insert_package(&self, new: NewPackage) -> StoreResult<ProductPackage> {
        let sql = format!(
            "WITH pk AS ( \
               INSERT INTO product_packages (id, product_id, version, version_log, stage, size, \
                 file_key, publish_status, status, created_by, updated_by) \
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10) \
               RETURNING * \
             ) SELECT {PACKAGE_COLUMNS} FROM pk"
        );
        let row = sqlx::query(&sql)
            .bind(new.id.as_uuid())
            .bind(new.fields.product_id.as_uuid())
            .bind(&new.fields.version)
            .bind(&new.fields.version_log)
            .bind(new.fields.stage.map(Stage::code))
            .bind(size_to_db(new.file.size))
            .bind(&new.file.key)
            .bind(PublishStatus::Unpublished.as_token())
            .bind(LifecycleStatus::Active.code())
            .bind(new.created_by.as_uuid())
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_package", e))?;
        decode::<PackageRow, ProductPackage>(&row)
    }

    #[instrument(skip_all, fields(package_id = %id), err)]
    async fn find_package(&self, id: PackageId) -> StoreResult<Option<ProductPackage>> {
        self.fetch_package("find_package", *id.as_uuid()).await
    }

    #[instrument(skip(self), err)]
    async fn find_active_package_by_version(
        &self,
        product_id: ProductId,
        version: &str,
        excluding: Option<PackageId>,
    ) -> StoreResult<Option<ProductPackage>> {
        let sql = format!(
            "SELECT {PACKAGE_COLUMNS} FROM product_packages pk \
             WHERE pk.product_id = $1 AND pk.version = $2 AND pk.status = $3 \
               AND ($4::uuid IS NULL OR pk.id <> $4) \
             LIMIT 1"
        );
        let row = sqlx::query(&sql)
            .bind(product_id.as_uuid())
            .bind(version)
            .bind(LifecycleStatus::Active.code())
            .bind(excluding.map(Uuid::from))
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_active_package_by_version", e))?;
        row.map(|r| decode::<PackageRow, ProductPackage>(&r)).transpose()
    }

    #[instrument(skip(self), err)]
    async fn list_packages(
        &self,
        query: &PackageQuery,
        page: Page,
    ) -> StoreResult<Paged<PackageListing>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM product_packages pk");
        push_package_filters(&mut count, query);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_packages", e))?;

        let mut select = QueryBuilder::<Postgres>::new(format!(
            "SELECT {PACKAGE_COLUMNS}, p.name AS product_name \
             FROM product_packages pk JOIN products p ON p.id = pk.product_id"
        ));
        push_package_filters(&mut select, query);
        select.push(" ORDER BY pk.updated_at ASC, pk.id ASC");
        push_page(&mut select, page);
        let rows = select
            .build()
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_packages", e))?;

        let listings = rows
            .iter()
            .map(|row| {
                Ok(PackageListing {
                    package: decode::<PackageRow, ProductPackage>(row)?,
                    product_name: row.try_get("product_name").map_err(corrupt)?,
                })
            })
            .collect::<StoreResult<Vec<_>>>()?;

        Ok(Paged {
            count: total.max(0) as u64,
            rows: listings,
        })
    }

    #[instrument(skip_all, fields(package_id = %id), err)]
    async fn update_package(
        &self,
        id: PackageId,
        changes: PackageChanges,
    ) -> StoreResult<Option<ProductPackage>> {
        let (file_key, size) = match &changes.file {
            Some(file) => (Some(file.key.as_str()), Some(size_to_db(file.size))),
            None => (None, None),
        };
        let sql = format!(
            "WITH pk AS ( \
               UPDATE product_packages SET product_id = $1, version = $2, version_log = $3, \
                 stage = $4, file_key = COALESCE($5, file_key), size = COALESCE($6, size), \
                 updated_by = $7, updated_at = NOW() \
               WHERE id = $8 AND status = $9 \
               RETURNING * \
             ) SELECT {PACKAGE_COLUMNS} FROM pk"
        );
        let row = sqlx::query(&sql)
            .bind(changes.fields.product_id.as_uuid())
            .bind(&changes.fields.version)
            .bind(&changes.fields.version_log)
            .bind(changes.fields.stage.map(Stage::code))
            .bind(file_key)
            .bind(size)
            .bind(changes.updated_by.as_uuid())
            .bind(id.as_uuid())
            .bind(LifecycleStatus::Active.code())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_package", e))?;
        row.map(|r| decode::<PackageRow, ProductPackage>(&r)).transpose()
    }

    #[instrument(skip_all, fields(product_id = %product_id), err)]
    async fn packages_of(&self, product_id: ProductId) -> StoreResult<Vec<ProductPackage>> {
        let sql = format!(
            "SELECT {PACKAGE_COLUMNS} FROM product_packages pk \
             WHERE pk.product_id = $1 ORDER BY pk.version COLLATE \"C\""
        );
        let rows = sqlx::query(&sql)
            .bind(product_id.as_uuid())
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("packages_of", e))?;
        decode_all::<PackageRow, ProductPackage>(&rows)
    }

    #[instrument(
        skip_all,
        fields(target = %target, transition = %transition, actor = %actor),
        err
    )]
    async fn apply_transition(
        &self,
        target: ArtifactRef,
        transition: Transition,
        actor: UserId,
    ) -> StoreResult<u64> {
        let (table, id) = table_of(target);
        let sql = format!(
            "UPDATE {table} SET publish_status = $1, updated_by = $2, updated_at = NOW(), \
               published_by = CASE WHEN $3 THEN $2 ELSE published_by END \
             WHERE id = $4 AND status = $5 AND publish_status = ANY($6)"
        );
        let result = sqlx::query(&sql)
            .bind(transition.target().as_token())
            .bind(actor.as_uuid())
            .bind(transition.records_publisher())
            .bind(id)
            .bind(LifecycleStatus::Active.code())
            .bind(transition.source_tokens())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("apply_transition", e))?;
        Ok(result.rows_affected())
    }

    #[instrument(skip_all, fields(target = %target, actor = %actor), err)]
    async fn retire(&self, target: ArtifactRef, actor: UserId) -> StoreResult<u64> {
        let (table, id) = table_of(target);
        let sql = format!(
            "UPDATE {table} SET status = $1, updated_by = $2, updated_at = NOW() \
             WHERE id = $3 AND status = $4"
        );
        let result = sqlx::query(&sql)
            .bind(LifecycleStatus::Retired.code())
            .bind(actor.as_uuid())
            .bind(id)
            .bind(LifecycleStatus::Active.code())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("retire", e))?;
        Ok(result.rows_affected())
    }

    #[instrument(skip_all, fields(device_id = %new.device_id), err)]
    async fn insert_device_log(&self, new: NewDeviceLog) -> StoreResult<DeviceLog> {
        let sql = format!(
            "INSERT INTO device_logs (id, device_id, device_name, version, device_info, \
             device_status, software_ip, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {DEVICE_LOG_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(new.id.as_uuid())
            .bind(&new.device_id)
            .bind(&new.device_name)
            .bind(&new.version)
            .bind(&new.device_info)
            .bind(&new.device_status)
            .bind(&new.software_ip)
            .bind(LifecycleStatus::Active.code())
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_device_log", e))?;
        decode::<DeviceLogRow, DeviceLog>(&row)
    }

    #[instrument(skip(self), err)]
    async fn list_device_logs(
        &self,
        query: &DeviceLogQuery,
        page: Page,
    ) -> StoreResult<Paged<DeviceLog>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM device_logs");
        push_device_log_filters(&mut count, query);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_device_logs", e))?;

        let mut select =
            QueryBuilder::<Postgres>::new(format!("SELECT {DEVICE_LOG_COLUMNS} FROM device_logs"));
        push_device_log_filters(&mut select, query);
        select.push(" ORDER BY created_at DESC, id DESC");
        push_page(&mut select, page);
        let rows = select
            .build()
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_device_logs", e))?;

        Ok(Paged {
            count: total.max(0) as u64,
            rows: decode_all::<DeviceLogRow, DeviceLog>(&rows)?,
        })
    }
}

fn size_to_db(size: u64) -> i64 {
    i64::try_from(size).unwrap_or(i64::MAX)
}

fn corrupt(err: sqlx::Error) -> StoreError {
    StoreError::Corrupt(err.to_string())
}

/// Decode a row through its raw row type, then validate it into the domain type.
fn decode<R, T>(row: &PgRow) -> StoreResult<T>
where
    R: for<'r> FromRow<'r, PgRow>,
    T: TryFrom<R, Error = StoreError>,
{
    let raw = R::from_row(row).map_err(corrupt)?;
    T::try_from(raw)
}

fn decode_all<R, T>(rows: &[PgRow]) -> StoreResult<Vec<T>>
where
    R: for<'r> FromRow<'r, PgRow>,
    T: TryFrom<R, Error = StoreError>,
{
    rows.iter().map(decode::<R, T>).collect()
}

fn lifecycle(code: i16) -> StoreResult<LifecycleStatus> {
    LifecycleStatus::from_code(code)
        .ok_or_else(|| StoreError::Corrupt(format!("unknown status code {code}")))
}

fn publish_status(token: &str) -> StoreResult<PublishStatus> {
    PublishStatus::from_token(token)
        .ok_or_else(|| StoreError::Corrupt(format!("unknown publish status '{token}'")))
}

// SQLx row types

#[derive(Debug)]
struct ProductRow {
    id: Uuid,
    name: String,
    model: String,
    model_id: String,
    kind: Option<String>,
    stage: Option<String>,
    fit_products: Vec<Uuid>,
    area: Option<String>,
    dept: Option<String>,
    project_manager: Option<String>,
    description: Option<String>,
    logo: Option<String>,
    publish_status: String,
    published_by: Option<Uuid>,
    status: i16,
    created_by: Option<Uuid>,
    updated_by: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for ProductRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ProductRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            model: row.try_get("model")?,
            model_id: row.try_get("model_id")?,
            kind: row.try_get("kind")?,
            stage: row.try_get("stage")?,
            fit_products: row.try_get("fit_products")?,
            area: row.try_get("area")?,
            dept: row.try_get("dept")?,
            project_manager: row.try_get("project_manager")?,
            description: row.try_get("description")?,
            logo: row.try_get("logo")?,
            publish_status: row.try_get("publish_status")?,
            published_by: row.try_get("published_by")?,
            status: row.try_get("status")?,
            created_by: row.try_get("created_by")?,
            updated_by: row.try_get("updated_by")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl TryFrom<ProductRow> for Product {
    type Error = StoreError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Product {
            id: ProductId::from_uuid(row.id),
            name: row.name,
            model: row.model,
            model_id: row.model_id,
            kind: row.kind,
            stage: row.stage,
            fit_products: row.fit_products.into_iter().map(ProductId::from_uuid).collect(),
            area: row.area,
            dept: row.dept,
            project_manager: row.project_manager,
            description: row.description,
            logo: row.logo,
            publish_status: publish_status(&row.publish_status)?,
            published_by: row.published_by.map(UserId::from_uuid),
            lifecycle: lifecycle(row.status)?,
            created_by: row.created_by.map(UserId::from_uuid),
            updated_by: row.updated_by.map(UserId::from_uuid),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug)]
struct PackageRow {
    id: Uuid,
    product_id: Uuid,
    version: String,
    version_log: Option<String>,
    stage: Option<i16>,
    size: i64,
    file_key: String,
    publish_status: String,
    published_by: Option<Uuid>,
    status: i16,
    created_by: Option<Uuid>,
    updated_by: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for PackageRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(PackageRow {
            id: row.try_get("id")?,
            product_id: row.try_get("product_id")?,
            version: row.try_get("version")?,
            version_log: row.try_get("version_log")?,
            stage: row.try_get("stage")?,
            size: row.try_get("size")?,
            file_key: row.try_get("file_key")?,
            publish_status: row.try_get("publish_status")?,
            published_by: row.try_get("published_by")?,
            status: row.try_get("status")?,
            created_by: row.try_get("created_by")?,
            updated_by: row.try_get("updated_by")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl TryFrom<PackageRow> for ProductPackage {
    type Error = StoreError;

    fn try_from(row: PackageRow) -> Result<Self, Self::Error> {
        let stage = row
            .stage
            .map(|code| {
                Stage::from_code(code)
                    .ok_or_else(|| StoreError::Corrupt(format!("unknown stage code {code}")))
            })
            .transpose()?;
        Ok(ProductPackage {
            id: PackageId::from_uuid(row.id),
            product_id: ProductId::from_uuid(row.product_id),
            version: row.version,
            version_log: row.version_log,
            stage,
            size: u64::try_from(row.size).unwrap_or_default(),
            file_key: row.file_key,
            publish_status: publish_status(&row.publish_status)?,
            published_by: row.published_by.map(UserId::from_uuid),
            lifecycle: lifecycle(row.status)?,
            created_by: row.created_by.map(UserId::from_uuid),
            updated_by: row.updated_by.map(UserId::from_uuid),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug)]
struct DeviceLogRow {
    id: Uuid,
    device_id: String,
    device_name: String,
    version: Option<String>,
    device_info: String,
    device_status: Option<String>,
    software_ip: Option<String>,
    status: i16,
    created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for DeviceLogRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(DeviceLogRow {
            id: row.try_get("id")?,
            device_id: row.try_get("device_id")?,
            device_name: row.try_get("device_name")?,
            version: row.try_get("version")?,
            device_info: row.try_get("device_info")?,
            device_status: row.try_get("device_status")?,
            software_ip: row.try_get("software_ip")?,
            status: row.try_get("status")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl TryFrom<DeviceLogRow> for DeviceLog {
    type Error = StoreError;

    fn try_from(row: DeviceLogRow) -> Result<Self, Self::Error> {
        Ok(DeviceLog {
            id: DeviceLogId::from_uuid(row.id),
            device_id: row.device_id,
            device_name: row.device_name,
            version: row.version,
            device_info: row.device_info,
            device_status: row.device_status,
            software_ip: row.software_ip,
            lifecycle: lifecycle(row.status)?,
            created_at: row.created_at,
        })
    }
}
