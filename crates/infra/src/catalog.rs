//! Catalog service: product/package CRUD guards, uploads, device check-ins and
//! upgrade lookups.
//!
//! Uniqueness and parent checks here are read-then-act fast paths; the store's
//! unique indexes are the backstop and surface the same `Duplicate` error.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use uuid::Uuid;

use nova_core::{
    ActorContext, DeviceLogId, DomainError, Entity, PackageId, Page, Paged, ProductId,
};
use nova_products::{
    DeviceLog, DeviceLogQuery, DeviceReport, NewDeviceLog, NewPackage, NewProduct, PackageChanges,
    PackageFields, PackageFile, PackageListing, PackageQuery, Product, ProductChanges,
    ProductFields, ProductQuery, ProductSummary, upgrades_after,
};

use crate::blob::{BlobStore, logo_key, package_key, spawn_delete};
use crate::error::{ServiceError, ServiceResult};
use crate::store::CatalogStore;

/// An uploaded file as received from the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub file_name: String,
    pub content: Bytes,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            content: content.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }
}

/// A product row enriched for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductView {
    pub product: Product,
    /// Latest Active package version, if any.
    pub latest_version: Option<String>,
    /// `fit_products` resolved to names; unknown or retired ids are dropped.
    pub compatible: Vec<ProductSummary>,
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageView {
    pub listing: PackageListing,
    pub download_url: String,
}

/// One version a device can upgrade to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpgradeOffer {
    pub version: String,
    pub url: String,
}

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
    blobs: Arc<dyn BlobStore>,
    public_base_url: String,
}

impl CatalogService {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        blobs: Arc<dyn BlobStore>,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            blobs,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Public URL a blob is served from.
    pub fn file_url(&self, key: &str) -> String {
        format!("{}/files/{key}", self.public_base_url)
    }

    pub async fn open_file(&self, key: &str) -> ServiceResult<Bytes> {
        Ok(self.blobs.get(key).await?)
    }

    pub async fn create_product(
        &self,
        ctx: &ActorContext,
        fields: ProductFields,
        logo: Option<Upload>,
    ) -> ServiceResult<ProductView> {
        fields.validate()?;
        if self
            .store
            .find_active_product_by_model(&fields.model_id, None)
            .await?
            .is_some()
        {
            return Err(DomainError::duplicate("modelId").into());
        }

        let logo = match logo {
            Some(upload) => {
                let key = logo_key(&fields.model_id, Uuid::now_v7(), &upload.file_name);
                Some(self.store_blob(key, upload).await?)
            },
            None => None,
        };

        let inserted = self
            .store
            .insert_product(NewProduct {
                id: ProductId::new(),
                fields,
                logo: logo.clone(),
                created_by: ctx.actor_id(),
            })
            .await;

        let product = match inserted {
            Ok(product) => product,
            Err(err) => {
                self.discard(logo);
                return Err(err.into());
            }
        };

        tracing::info!(
            request_id = %ctx.request_id(),
            actor = %ctx.actor_id(),
            product = %product.id,
            model_id = %product.model_id,
            "product created"
        );
        self.product_view(product).await
    }

    pub async fn update_product(
        &self,
        ctx: &ActorContext,
        id: ProductId,
        fields: ProductFields,
        logo: Option<Upload>,
    ) -> ServiceResult<ProductView> {
        let current = self
            .store
            .find_product(id)
            .await?
            .ok_or_else(|| DomainError::not_found("product"))?;
        if !current.is_active() {
            return Err(DomainError::already_retired("product").into());
        }
        fields.validate()?;
        if self
            .store
            .find_active_product_by_model(&fields.model_id, Some(id))
            .await?
            .is_some()
        {
            return Err(DomainError::duplicate("modelId").into());
        }

        let new_logo = match logo {
            Some(upload) => {
                let key = logo_key(&fields.model_id, Uuid::now_v7(), &upload.file_name);
                Some(self.store_blob(key, upload).await?)
            },
            None => None,
        };

        let updated = self
            .store
            .update_product(
                id,
                ProductChanges {
                    fields,
                    logo: new_logo.clone(),
                    updated_by: ctx.actor_id(),
                },
            )
            .await
            .map_err(ServiceError::from)
            .and_then(|row| row.ok_or_else(|| DomainError::not_found("product").into()));

        let product = match updated {
            Ok(product) => product,
            Err(err) => {
                self.discard(new_logo);
                return Err(err);
            }
        };

        if let (Some(_), Some(old)) = (&new_logo, current.logo) {
            spawn_delete(Arc::clone(&self.blobs), old);
        }
        self.product_view(product).await
    }

    pub async fn get_product(&self, id: ProductId) -> ServiceResult<ProductView> {
        let product = self
            .store
            .find_product(id)
            .await?
            .filter(|p| p.is_active())
            .ok_or_else(|| DomainError::not_found("product"))?;
        self.product_view(product).await
    }

    pub async fn list_products(
        &self,
        query: &ProductQuery,
        page: Page,
    ) -> ServiceResult<Paged<ProductView>> {
        let paged = self.store.list_products(query, page).await?;
        let ids: Vec<ProductId> = paged.rows.iter().map(|p| p.id).collect();
        let mut latest = self.store.latest_versions(&ids).await?;
        let names = self.summary_index().await?;
        Ok(paged.map(|product| {
            let latest_version = latest.remove(&product.id);
            self.decorate(product, latest_version, &names)
        }))
    }

    /// Every Active product as `{id, name}`.
    pub async fn all_products(&self) -> ServiceResult<Vec<ProductSummary>> {
        Ok(self.store.list_active_product_summaries().await?)
    }

    pub async fn create_package(
        &self,
        ctx: &ActorContext,
        fields: PackageFields,
        file: Option<Upload>,
    ) -> ServiceResult<PackageView> {
        fields.validate()?;
        let file = file.ok_or_else(|| DomainError::validation("package file is required"))?;
        let parent = self.active_parent(fields.product_id).await?;
        if self
            .store
            .find_active_package_by_version(fields.product_id, &fields.version, None)
            .await?
            .is_some()
        {
            return Err(DomainError::duplicate("version").into());
        }

        let size = file.size();
        let key = self
            .store_blob(
                package_key(&parent.model_id, &fields.version, Uuid::now_v7(), &file.file_name),
                file,
            )
            .await?;

        let inserted = self
            .store
            .insert_package(NewPackage {
                id: PackageId::new(),
                fields,
                file: PackageFile {
                    key: key.clone(),
                    size,
                },
                created_by: ctx.actor_id(),
            })
            .await;

        let package = match inserted {
            Ok(package) => package,
            Err(err) => {
                self.discard(Some(key));
                return Err(err.into());
            }
        };

        tracing::info!(
            target: "audit",
            request_id = %ctx.request_id(),
            actor = %ctx.actor_id(),
            remote_addr = ?ctx.remote_addr(),
            product = %parent.id,
            package = %package.id,
            version = %package.version,
            "package uploaded"
        );
        Ok(self.package_view(PackageListing {
            package,
            product_name: parent.name,
        }))
    }

    pub async fn update_package(
        &self,
        ctx: &ActorContext,
        id: PackageId,
        fields: PackageFields,
        file: Option<Upload>,
    ) -> ServiceResult<PackageView> {
        let current = self
            .store
            .find_package(id)
            .await?
            .ok_or_else(|| DomainError::not_found("package"))?;
        if !current.is_active() {
            return Err(DomainError::already_retired("package").into());
        }
        fields.validate()?;
        let parent = self.active_parent(fields.product_id).await?;
        if self
            .store
            .find_active_package_by_version(fields.product_id, &fields.version, Some(id))
            .await?
            .is_some()
        {
            return Err(DomainError::duplicate("version").into());
        }

        let new_file = match file {
            Some(upload) => {
                let size = upload.size();
                let key = self
                    .store_blob(
                        package_key(&parent.model_id, &fields.version, Uuid::now_v7(), &upload.file_name),
                        upload,
                    )
                    .await?;
                Some(PackageFile { key, size })
            }
            None => None,
        };
        let new_key = new_file.as_ref().map(|f| f.key.clone());

        let updated = self
            .store
            .update_package(
                id,
                PackageChanges {
                    fields,
                    file: new_file,
                    updated_by: ctx.actor_id(),
                },
            )
            .await
            .map_err(ServiceError::from)
            .and_then(|row| row.ok_or_else(|| DomainError::not_found("package").into()));

        let package = match updated {
            Ok(package) => package,
            Err(err) => {
                self.discard(new_key);
                return Err(err);
            }
        };

        if new_key.is_some() {
            spawn_delete(Arc::clone(&self.blobs), current.file_key);
        }
        Ok(self.package_view(PackageListing {
            package,
            product_name: parent.name,
        }))
    }

    pub async fn get_package(&self, id: PackageId) -> ServiceResult<PackageView> {
        let package = self
            .store
            .find_package(id)
            .await?
            .filter(|p| p.is_active())
            .ok_or_else(|| DomainError::not_found("package"))?;
        let product_name = self
            .store
            .find_product(package.product_id)
            .await?
            .map(|p| p.name)
            .unwrap_or_default();
        Ok(self.package_view(PackageListing {
            package,
            product_name,
        }))
    }

    pub async fn list_packages(
        &self,
        query: &PackageQuery,
        page: Page,
    ) -> ServiceResult<Paged<PackageView>> {
        let paged = self.store.list_packages(query, page).await?;
        Ok(paged.map(|listing| self.package_view(listing)))
    }

    /// Versions a device on `current_version` can move to, newest first.
    ///
    /// An unknown model yields an empty list rather than an error.
    pub async fn upgradable_versions(
        &self,
        model_id: &str,
        current_version: Option<&str>,
    ) -> ServiceResult<Vec<UpgradeOffer>> {
        let Some(product) = self.store.find_active_product_by_model(model_id, None).await? else {
            return Ok(Vec::new());
        };
        let packages = self.store.packages_of(product.id).await?;
        Ok(upgrades_after(&packages, current_version.unwrap_or_default())
            .into_iter()
            .map(|p| UpgradeOffer {
                version: p.version.clone(),
                url: self.file_url(&p.file_key),
            })
            .collect())
    }

    /// Record a device check-in. The device is named after its product.
    pub async fn report_device(
        &self,
        report: DeviceReport,
        remote_addr: Option<IpAddr>,
    ) -> ServiceResult<DeviceLog> {
        report.validate()?;
        let product = self
            .store
            .find_active_product_by_model(&report.model_id, None)
            .await?
            .ok_or_else(|| DomainError::not_found("product"))?;

        let device_info = report.device_info_text();
        let log = self
            .store
            .insert_device_log(NewDeviceLog {
                id: DeviceLogId::new(),
                device_id: report.device_id,
                device_name: product.name,
                version: report.version,
                device_info,
                device_status: report.device_status,
                software_ip: remote_addr.map(|ip| ip.to_string()),
            })
            .await?;
        tracing::debug!(device_id = %log.device_id, model_id = %report.model_id, "device reported");
        Ok(log)
    }

    pub async fn list_device_logs(
        &self,
        query: &DeviceLogQuery,
        page: Page,
    ) -> ServiceResult<Paged<DeviceLog>> {
        Ok(self.store.list_device_logs(query, page).await?)
    }

    async fn active_parent(&self, product_id: ProductId) -> ServiceResult<Product> {
        self.store
            .find_product(product_id)
            .await?
            .filter(|p| p.is_active())
            .ok_or_else(|| DomainError::parent_not_found("product").into())
    }

    async fn store_blob(&self, key: String, upload: Upload) -> ServiceResult<String> {
        self.blobs.put(&key, upload.content).await?;
        Ok(key)
    }

    /// Drop a blob written for a row write that did not land. Upload keys are
    /// never shared, so no live row can point at it.
    fn discard(&self, key: Option<String>) {
        if let Some(key) = key {
            spawn_delete(Arc::clone(&self.blobs), key);
        }
    }

    async fn summary_index(&self) -> ServiceResult<HashMap<ProductId, String>> {
        Ok(self
            .store
            .list_active_product_summaries()
            .await?
            .into_iter()
            .map(|s| (s.id, s.name))
            .collect())
    }

    async fn product_view(&self, product: Product) -> ServiceResult<ProductView> {
        let mut latest = self.store.latest_versions(&[product.id]).await?;
        let names = self.summary_index().await?;
        let latest_version = latest.remove(&product.id);
        Ok(self.decorate(product, latest_version, &names))
    }

    fn decorate(
        &self,
        product: Product,
        latest_version: Option<String>,
        names: &HashMap<ProductId, String>,
    ) -> ProductView {
        let compatible = product
            .fit_products
            .iter()
            .filter_map(|id| {
                names.get(id).map(|name| ProductSummary {
                    id: *id,
                    name: name.clone(),
                })
            })
            .collect();
        let logo_url = product.logo.as_deref().map(|key| self.file_url(key));
        ProductView {
            product,
            latest_version,
            compatible,
            logo_url,
        }
    }

    fn package_view(&self, listing: PackageListing) -> PackageView {
        let download_url = self.file_url(&listing.package.file_key);
        PackageView {
            listing,
            download_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use nova_core::{LifecycleStatus, UserId};
    use nova_products::{ArtifactRef, PublishStatus, Transition};

    use super::*;
    use crate::blob::InMemoryBlobStore;
    use crate::store::InMemoryCatalogStore;
    use crate::workflow::WorkflowEngine;

    struct Fixture {
        blobs: Arc<InMemoryBlobStore>,
        service: CatalogService,
        engine: WorkflowEngine,
        ctx: ActorContext,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryCatalogStore::new());
        let blobs = Arc::new(InMemoryBlobStore::new());
        Fixture {
            service: CatalogService::new(store.clone(), blobs.clone(), "http://cdn.local/"),
            engine: WorkflowEngine::new(store, blobs.clone()),
            blobs,
            ctx: ActorContext::new(UserId::new()),
        }
    }

    fn product_fields(name: &str, model_id: &str) -> ProductFields {
        ProductFields {
            name: name.into(),
            model: "NV".into(),
            model_id: model_id.into(),
            ..Default::default()
        }
    }

    fn package_fields(product_id: ProductId, version: &str) -> PackageFields {
        PackageFields {
            product_id,
            version: version.into(),
            version_log: Some("fixes".into()),
            stage: None,
        }
    }

    fn firmware() -> Option<Upload> {
        Some(Upload::new("fw.bin", Bytes::from_static(b"firmware")))
    }

    #[tokio::test]
    async fn model_id_is_unique_among_active_products() {
        let f = fixture();
        let first = f
            .service
            .create_product(&f.ctx, product_fields("Gateway", "GW-01"), None)
            .await
            .unwrap();
        let err = f
            .service
            .create_product(&f.ctx, product_fields("Other", "GW-01"), None)
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::Domain(DomainError::duplicate("modelId")));

        f.engine
            .retire(&f.ctx, ArtifactRef::Product(first.product.id))
            .await
            .unwrap();
        assert!(
            f.service
                .create_product(&f.ctx, product_fields("Other", "GW-01"), None)
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn update_may_keep_its_own_model_id() {
        let f = fixture();
        let created = f
            .service
            .create_product(&f.ctx, product_fields("Gateway", "GW-01"), None)
            .await
            .unwrap();
        let updated = f
            .service
            .update_product(&f.ctx, created.product.id, product_fields("Gateway 2", "GW-01"), None)
            .await
            .unwrap();
        assert_eq!(updated.product.name, "Gateway 2");
        assert_eq!(updated.product.updated_by, Some(f.ctx.actor_id()));

        f.service
            .create_product(&f.ctx, product_fields("Hub", "HB-01"), None)
            .await
            .unwrap();
        let err = f
            .service
            .update_product(&f.ctx, created.product.id, product_fields("Gateway", "HB-01"), None)
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::Domain(DomainError::duplicate("modelId")));
    }

    #[tokio::test]
    async fn logo_is_stored_and_replaced() {
        let f = fixture();
        let created = f
            .service
            .create_product(
                &f.ctx,
                product_fields("Gateway", "GW-01"),
                Some(Upload::new("a.png", Bytes::from_static(b"png"))),
            )
            .await
            .unwrap();
        let first_logo = created.product.logo.clone().unwrap();
        assert!(first_logo.starts_with("GW-01/logo/"));
        assert!(first_logo.ends_with("/a.png"));
        assert_eq!(
            created.logo_url,
            Some(format!("http://cdn.local/files/{first_logo}"))
        );

        let updated = f
            .service
            .update_product(
                &f.ctx,
                created.product.id,
                product_fields("Gateway", "GW-01"),
                Some(Upload::new("b.png", Bytes::from_static(b"png"))),
            )
            .await
            .unwrap();
        for _ in 0..50 {
            if f.blobs.len() == 1 {
                break;
            }
            tokio::task::yield_now().await;
        }
        let second_logo = updated.product.logo.unwrap();
        assert!(second_logo.ends_with("/b.png"));
        assert!(!f.blobs.exists(&first_logo).await.unwrap());
        assert!(f.blobs.exists(&second_logo).await.unwrap());
    }

    #[tokio::test]
    async fn package_requires_an_active_parent_and_a_file() {
        let f = fixture();
        let err = f
            .service
            .create_package(&f.ctx, package_fields(ProductId::new(), "1.0.0"), firmware())
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::Domain(DomainError::parent_not_found("product")));

        let product = f
            .service
            .create_product(&f.ctx, product_fields("Gateway", "GW-01"), None)
            .await
            .unwrap()
            .product;
        let err = f
            .service
            .create_package(&f.ctx, package_fields(product.id, "1.0.0"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn package_upload_records_size_and_key() {
        let f = fixture();
        let product = f
            .service
            .create_product(&f.ctx, product_fields("Gateway", "GW-01"), None)
            .await
            .unwrap()
            .product;
        let view = f
            .service
            .create_package(&f.ctx, package_fields(product.id, "1.0.0"), firmware())
            .await
            .unwrap();
        assert_eq!(view.listing.product_name, "Gateway");
        assert_eq!(view.listing.package.size, 8);
        let key = &view.listing.package.file_key;
        assert!(key.starts_with("GW-01/1.0.0/"));
        assert!(key.ends_with("/fw.bin"));
        assert_eq!(view.download_url, format!("http://cdn.local/files/{key}"));
        assert_eq!(
            f.service.open_file(key).await.unwrap(),
            Bytes::from_static(b"firmware")
        );
    }

    #[tokio::test]
    async fn retired_version_can_be_reused() {
        let f = fixture();
        let product = f
            .service
            .create_product(&f.ctx, product_fields("Gateway", "GW-01"), None)
            .await
            .unwrap()
            .product;
        let first = f
            .service
            .create_package(&f.ctx, package_fields(product.id, "1.0.0"), firmware())
            .await
            .unwrap();

        let err = f
            .service
            .create_package(&f.ctx, package_fields(product.id, "1.0.0"), firmware())
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::Domain(DomainError::duplicate("version")));

        f.engine
            .retire(&f.ctx, ArtifactRef::Package(first.listing.package.id))
            .await
            .unwrap();
        let again = f
            .service
            .create_package(&f.ctx, package_fields(product.id, "1.0.0"), firmware())
            .await
            .unwrap();
        assert_eq!(again.listing.package.lifecycle, LifecycleStatus::Active);
        assert_eq!(again.listing.package.publish_status, PublishStatus::Unpublished);
        assert_ne!(again.listing.package.file_key, first.listing.package.file_key);

        // Let the retire's background delete run.
        for _ in 0..50 {
            tokio::task::yield_now().await;
        }
        assert!(!f.blobs.exists(&first.listing.package.file_key).await.unwrap());
        assert_eq!(
            f.service.open_file(&again.listing.package.file_key).await.unwrap(),
            Bytes::from_static(b"firmware")
        );
    }

    #[tokio::test]
    async fn renamed_model_keeps_its_firmware() {
        let f = fixture();
        let original = f
            .service
            .create_product(&f.ctx, product_fields("Gateway", "GW-01"), None)
            .await
            .unwrap()
            .product;
        let shipped = f
            .service
            .create_package(
                &f.ctx,
                package_fields(original.id, "1.0.0"),
                Some(Upload::new("fw.bin", Bytes::from_static(b"gateway firmware"))),
            )
            .await
            .unwrap();
        f.service
            .update_product(&f.ctx, original.id, product_fields("Gateway", "GW-02"), None)
            .await
            .unwrap();

        let newcomer = f
            .service
            .create_product(&f.ctx, product_fields("Hub", "GW-01"), None)
            .await
            .unwrap()
            .product;
        f.service
            .create_package(
                &f.ctx,
                package_fields(newcomer.id, "1.0.0"),
                Some(Upload::new("fw.bin", Bytes::from_static(b"hub firmware"))),
            )
            .await
            .unwrap();

        assert_eq!(
            f.service.open_file(&shipped.listing.package.file_key).await.unwrap(),
            Bytes::from_static(b"gateway firmware")
        );
    }

    /// Retires a package while its replacement file is being written.
    struct RetireDuringPut {
        blobs: Arc<InMemoryBlobStore>,
        store: Arc<InMemoryCatalogStore>,
        target: std::sync::Mutex<Option<PackageId>>,
    }

    #[async_trait::async_trait]
    impl BlobStore for RetireDuringPut {
        async fn put(&self, key: &str, content: Bytes) -> Result<(), crate::error::BlobError> {
            let target = self.target.lock().unwrap().take();
            if let Some(id) = target {
                self.store
                    .retire(ArtifactRef::Package(id), UserId::new())
                    .await
                    .unwrap();
            }
            self.blobs.put(key, content).await
        }

        async fn get(&self, key: &str) -> Result<Bytes, crate::error::BlobError> {
            self.blobs.get(key).await
        }

        async fn exists(&self, key: &str) -> Result<bool, crate::error::BlobError> {
            self.blobs.exists(key).await
        }

        async fn delete(&self, key: &str) -> Result<(), crate::error::BlobError> {
            self.blobs.delete(key).await
        }
    }

    #[tokio::test]
    async fn failed_update_with_same_file_name_keeps_old_firmware() {
        let store = Arc::new(InMemoryCatalogStore::new());
        let blobs = Arc::new(InMemoryBlobStore::new());
        let racing = Arc::new(RetireDuringPut {
            blobs: blobs.clone(),
            store: store.clone(),
            target: std::sync::Mutex::new(None),
        });
        let service = CatalogService::new(store.clone(), racing.clone(), "http://cdn.local/");
        let ctx = ActorContext::new(UserId::new());

        let product = service
            .create_product(&ctx, product_fields("Gateway", "GW-01"), None)
            .await
            .unwrap()
            .product;
        let created = service
            .create_package(&ctx, package_fields(product.id, "1.0.0"), firmware())
            .await
            .unwrap();
        let id = created.listing.package.id;
        let old_key = created.listing.package.file_key.clone();

        *racing.target.lock().unwrap() = Some(id);
        let err = service
            .update_package(
                &ctx,
                id,
                package_fields(product.id, "1.0.0"),
                Some(Upload::new("fw.bin", Bytes::from_static(b"replacement"))),
            )
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::Domain(DomainError::not_found("package")));

        for _ in 0..50 {
            if blobs.len() == 1 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(blobs.len(), 1);
        assert_eq!(service.open_file(&old_key).await.unwrap(), Bytes::from_static(b"firmware"));
        let row = store.find_package(id).await.unwrap().unwrap();
        assert_eq!(row.file_key, old_key);
        assert_eq!(row.size, 8);
    }

    #[tokio::test]
    async fn listing_carries_latest_version_and_compatible_names() {
        let f = fixture();
        let hub = f
            .service
            .create_product(&f.ctx, product_fields("Hub", "HB-01"), None)
            .await
            .unwrap()
            .product;
        let mut fields = product_fields("Gateway", "GW-01");
        fields.fit_products = vec![hub.id, ProductId::new()];
        let gateway = f
            .service
            .create_product(&f.ctx, fields, None)
            .await
            .unwrap()
            .product;
        for version in ["1.0.0", "1.2.0", "1.1.0"] {
            f.service
                .create_package(&f.ctx, package_fields(gateway.id, version), firmware())
                .await
                .unwrap();
        }

        let listed = f
            .service
            .list_products(&ProductQuery::default(), Page::default())
            .await
            .unwrap();
        assert_eq!(listed.count, 2);
        let row = listed.rows.iter().find(|v| v.product.id == gateway.id).unwrap();
        assert_eq!(row.latest_version.as_deref(), Some("1.2.0"));
        assert_eq!(
            row.compatible,
            vec![ProductSummary {
                id: hub.id,
                name: "Hub".into()
            }]
        );
        let hub_row = listed.rows.iter().find(|v| v.product.id == hub.id).unwrap();
        assert_eq!(hub_row.latest_version, None);
    }

    #[tokio::test]
    async fn upgrades_list_newer_active_versions() {
        let f = fixture();
        let product = f
            .service
            .create_product(&f.ctx, product_fields("Gateway", "GW-01"), None)
            .await
            .unwrap()
            .product;
        let mut ids = HashMap::new();
        let mut keys = HashMap::new();
        for version in ["1.0.0", "1.1.0", "1.2.0"] {
            let view = f
                .service
                .create_package(&f.ctx, package_fields(product.id, version), firmware())
                .await
                .unwrap();
            ids.insert(version, view.listing.package.id);
            keys.insert(version, view.listing.package.file_key);
        }
        f.engine
            .retire(&f.ctx, ArtifactRef::Package(ids["1.2.0"]))
            .await
            .unwrap();

        let offers = f.service.upgradable_versions("GW-01", Some("1.0.0")).await.unwrap();
        assert_eq!(
            offers,
            vec![UpgradeOffer {
                version: "1.1.0".into(),
                url: format!("http://cdn.local/files/{}", keys["1.1.0"]),
            }]
        );
        assert_eq!(f.service.upgradable_versions("GW-01", None).await.unwrap().len(), 2);
        assert!(f.service.upgradable_versions("NOPE", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn device_report_names_the_product() {
        let f = fixture();
        f.service
            .create_product(&f.ctx, product_fields("Gateway", "GW-01"), None)
            .await
            .unwrap();
        let report = DeviceReport {
            model_id: "GW-01".into(),
            device_id: "SN0001".into(),
            version: Some("1.0.0".into()),
            device_info: Some(serde_json::json!({"uptime": 42})),
            device_status: Some("online".into()),
        };
        let log = f
            .service
            .report_device(report.clone(), Some("10.0.0.7".parse().unwrap()))
            .await
            .unwrap();
        assert_eq!(log.device_name, "Gateway");
        assert_eq!(log.device_info, r#"{"uptime":42}"#);
        assert_eq!(log.software_ip.as_deref(), Some("10.0.0.7"));

        let unknown = DeviceReport {
            model_id: "NOPE".into(),
            ..report
        };
        let err = f.service.report_device(unknown, None).await.unwrap_err();
        assert_eq!(err, ServiceError::Domain(DomainError::not_found("product")));

        let logs = f
            .service
            .list_device_logs(&DeviceLogQuery::default(), Page::default())
            .await
            .unwrap();
        assert_eq!(logs.count, 1);
    }

    #[tokio::test]
    async fn published_package_keeps_its_view_after_update() {
        let f = fixture();
        let product = f
            .service
            .create_product(&f.ctx, product_fields("Gateway", "GW-01"), None)
            .await
            .unwrap()
            .product;
        let view = f
            .service
            .create_package(&f.ctx, package_fields(product.id, "1.0.0"), firmware())
            .await
            .unwrap();
        let id = view.listing.package.id;
        f.engine
            .transition(&f.ctx, ArtifactRef::Package(id), Transition::Publish)
            .await
            .unwrap();

        let updated = f
            .service
            .update_package(&f.ctx, id, package_fields(product.id, "1.0.1"), None)
            .await
            .unwrap();
        assert_eq!(updated.listing.package.version, "1.0.1");
        assert_eq!(updated.listing.package.publish_status, PublishStatus::Published);
        assert_eq!(updated.listing.package.published_by, Some(f.ctx.actor_id()));
    }
}
