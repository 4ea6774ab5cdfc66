//! Publish workflow and soft-delete gate for products and packages.
//!
//! ## Transition flow
//!
//! ```text
//! transition(ctx, artifact, action)
//!   ↓
//! one guarded UPDATE (status = Active AND publish_status IN sources)
//!   ↓
//! { changed: 0 | 1 }
//! ```
//!
//! Nothing is read before the write, so two concurrent requests against the same
//! artifact race in the store and exactly one of a conflicting pair wins. A
//! zero-row update is reported as `changed = 0`, never as an error, and is not
//! split into "missing" and "wrong state".
//!
//! ## Retire flow
//!
//! 1. load the artifact (missing: `NotFound`)
//! 2. must be Active (`AlreadyRetired`)
//! 3. must be Unpublished (`InvalidState`)
//! 4. product only: no Active packages (`HasActiveChildren`)
//! 5. delete the attached blob in the background
//! 6. guarded `UPDATE ... SET status = Retired WHERE status = Active`

use std::sync::Arc;

use serde::Serialize;

use nova_core::{ActorContext, DomainError, Entity};
use nova_products::{ArtifactRef, PublishStatus, Transition};

use crate::blob::{BlobStore, spawn_delete};
use crate::error::ServiceResult;
use crate::store::CatalogStore;

/// Message returned when a retire request hits a published artifact.
pub const WITHDRAW_FIRST: &str = "must withdraw from publish workflow before retiring";

/// Result of a transition request. `changed` is 0 or 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransitionOutcome {
    pub changed: u64,
}

impl TransitionOutcome {
    pub fn applied(&self) -> bool {
        self.changed > 0
    }
}

/// Result of a retire request that passed every precondition.
///
/// `changed = 0` means a concurrent request retired the row first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RetireOutcome {
    pub changed: u64,
}

/// Applies workflow transitions and retirement for both artifact kinds.
#[derive(Clone)]
pub struct WorkflowEngine {
    store: Arc<dyn CatalogStore>,
    blobs: Arc<dyn BlobStore>,
}

impl WorkflowEngine {
    pub fn new(store: Arc<dyn CatalogStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { store, blobs }
    }

    pub async fn transition(
        &self,
        ctx: &ActorContext,
        target: ArtifactRef,
        transition: Transition,
    ) -> ServiceResult<TransitionOutcome> {
        let changed = self
            .store
            .apply_transition(target, transition, ctx.actor_id())
            .await?;

        if changed > 0 {
            tracing::info!(
                request_id = %ctx.request_id(),
                actor = %ctx.actor_id(),
                artifact = %target,
                action = %transition,
                to = transition.target().as_token(),
                "publish status changed"
            );
        } else {
            tracing::debug!(
                request_id = %ctx.request_id(),
                artifact = %target,
                action = %transition,
                "transition rejected (not found or invalid state)"
            );
        }

        Ok(TransitionOutcome { changed })
    }

    pub async fn retire(&self, ctx: &ActorContext, target: ArtifactRef) -> ServiceResult<RetireOutcome> {
        let blob = match target {
            ArtifactRef::Product(id) => {
                let product = self
                    .store
                    .find_product(id)
                    .await?
                    .ok_or_else(|| DomainError::not_found("product"))?;
                check_retirable("product", product.lifecycle, product.publish_status)?;

                let blocking: Vec<String> = self
                    .store
                    .packages_of(id)
                    .await?
                    .into_iter()
                    .filter(|p| p.is_active())
                    .map(|p| p.version)
                    .collect();
                if !blocking.is_empty() {
                    return Err(DomainError::HasActiveChildren(blocking).into());
                }
                product.logo
            }
            ArtifactRef::Package(id) => {
                let package = self
                    .store
                    .find_package(id)
                    .await?
                    .ok_or_else(|| DomainError::not_found("package"))?;
                check_retirable("package", package.lifecycle, package.publish_status)?;
                Some(package.file_key)
            }
        };

        if let Some(key) = blob {
            spawn_delete(Arc::clone(&self.blobs), key);
        }

        let changed = self.store.retire(target, ctx.actor_id()).await?;
        tracing::info!(
            request_id = %ctx.request_id(),
            actor = %ctx.actor_id(),
            artifact = %target,
            changed,
            "artifact retired"
        );
        Ok(RetireOutcome { changed })
    }
}

fn check_retirable(
    what: &str,
    lifecycle: nova_core::LifecycleStatus,
    publish_status: PublishStatus,
) -> Result<(), DomainError> {
    if !lifecycle.is_active() {
        return Err(DomainError::already_retired(what));
    }
    if publish_status != PublishStatus::Unpublished {
        return Err(DomainError::invalid_state(WITHDRAW_FIRST));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use nova_core::{LifecycleStatus, PackageId, ProductId, UserId};
    use nova_products::{NewPackage, NewProduct, PackageFields, PackageFile, ProductFields};

    use super::*;
    use crate::blob::InMemoryBlobStore;
    use crate::error::ServiceError;
    use crate::store::InMemoryCatalogStore;

    struct Fixture {
        store: Arc<InMemoryCatalogStore>,
        blobs: Arc<InMemoryBlobStore>,
        engine: WorkflowEngine,
        ctx: ActorContext,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryCatalogStore::new());
        let blobs = Arc::new(InMemoryBlobStore::new());
        let engine = WorkflowEngine::new(store.clone(), blobs.clone());
        Fixture {
            store,
            blobs,
            engine,
            ctx: ActorContext::new(UserId::new()),
        }
    }

    async fn product(f: &Fixture, model_id: &str) -> ProductId {
        let id = ProductId::new();
        f.store
            .insert_product(NewProduct {
                id,
                fields: ProductFields {
                    name: "Gateway".into(),
                    model_id: model_id.into(),
                    ..Default::default()
                },
                logo: None,
                created_by: f.ctx.actor_id(),
            })
            .await
            .unwrap();
        id
    }

    async fn package(f: &Fixture, product_id: ProductId, version: &str) -> PackageId {
        let id = PackageId::new();
        let key = format!("GW/{version}/fw.bin");
        f.blobs.put(&key, Bytes::from_static(b"fw")).await.unwrap();
        f.store
            .insert_package(NewPackage {
                id,
                fields: PackageFields {
                    product_id,
                    version: version.into(),
                    version_log: None,
                    stage: None,
                },
                file: PackageFile { key, size: 2 },
                created_by: f.ctx.actor_id(),
            })
            .await
            .unwrap();
        id
    }

    async fn status_of(f: &Fixture, id: ProductId) -> PublishStatus {
        f.store.find_product(id).await.unwrap().unwrap().publish_status
    }

    #[tokio::test]
    async fn trial_product_publishes_then_rejects_tryout() {
        let f = fixture();
        let id = product(&f, "GW-01").await;
        let target = ArtifactRef::Product(id);

        f.engine.transition(&f.ctx, target, Transition::Tryout).await.unwrap();
        let out = f.engine.transition(&f.ctx, target, Transition::Publish).await.unwrap();
        assert_eq!(out, TransitionOutcome { changed: 1 });
        assert_eq!(status_of(&f, id).await, PublishStatus::Published);

        let out = f.engine.transition(&f.ctx, target, Transition::Tryout).await.unwrap();
        assert_eq!(out.changed, 0);
        assert_eq!(status_of(&f, id).await, PublishStatus::Published);
    }

    #[tokio::test]
    async fn product_publish_records_the_publisher() {
        let f = fixture();
        let id = product(&f, "GW-01").await;
        f.engine
            .transition(&f.ctx, ArtifactRef::Product(id), Transition::Publish)
            .await
            .unwrap();
        let stored = f.store.find_product(id).await.unwrap().unwrap();
        assert_eq!(stored.published_by, Some(f.ctx.actor_id()));
    }

    #[tokio::test]
    async fn unknown_artifact_reports_zero_changes() {
        let f = fixture();
        let out = f
            .engine
            .transition(&f.ctx, ArtifactRef::Package(PackageId::new()), Transition::Publish)
            .await
            .unwrap();
        assert!(!out.applied());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_publishes_have_exactly_one_winner() {
        let f = fixture();
        let id = product(&f, "GW-01").await;
        let target = ArtifactRef::Product(id);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let engine = f.engine.clone();
            let ctx = ActorContext::new(UserId::new());
            handles.push(tokio::spawn(async move {
                engine.transition(&ctx, target, Transition::Publish).await
            }));
        }

        let mut winners = 0;
        for handle in handles {
            winners += handle.await.unwrap().unwrap().changed;
        }
        assert_eq!(winners, 1);
        assert_eq!(status_of(&f, id).await, PublishStatus::Published);
    }

    #[tokio::test]
    async fn retire_is_blocked_by_active_packages() {
        let f = fixture();
        let product_id = product(&f, "GW-01").await;
        let package_id = package(&f, product_id, "1.0.0").await;
        package(&f, product_id, "1.1.0").await;

        let err = f
            .engine
            .retire(&f.ctx, ArtifactRef::Product(product_id))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ServiceError::Domain(DomainError::HasActiveChildren(vec![
                "1.0.0".into(),
                "1.1.0".into()
            ]))
        );

        f.engine.retire(&f.ctx, ArtifactRef::Package(package_id)).await.unwrap();
        let remaining = f.store.packages_of(product_id).await.unwrap();
        let other = remaining.iter().find(|p| p.id != package_id).unwrap().id;
        f.engine.retire(&f.ctx, ArtifactRef::Package(other)).await.unwrap();

        let out = f
            .engine
            .retire(&f.ctx, ArtifactRef::Product(product_id))
            .await
            .unwrap();
        assert_eq!(out.changed, 1);
        let stored = f.store.find_product(product_id).await.unwrap().unwrap();
        assert_eq!(stored.lifecycle, LifecycleStatus::Retired);
    }

    #[tokio::test]
    async fn retire_requires_unpublished() {
        let f = fixture();
        let id = product(&f, "GW-01").await;
        let target = ArtifactRef::Product(id);
        f.engine.transition(&f.ctx, target, Transition::Tryout).await.unwrap();

        let err = f.engine.retire(&f.ctx, target).await.unwrap_err();
        assert_eq!(
            err,
            ServiceError::Domain(DomainError::invalid_state(WITHDRAW_FIRST))
        );

        f.engine.transition(&f.ctx, target, Transition::Withdraw).await.unwrap();
        assert_eq!(f.engine.retire(&f.ctx, target).await.unwrap().changed, 1);
    }

    #[tokio::test]
    async fn retire_distinguishes_missing_and_already_retired() {
        let f = fixture();
        let err = f
            .engine
            .retire(&f.ctx, ArtifactRef::Product(ProductId::new()))
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::Domain(DomainError::not_found("product")));

        let id = product(&f, "GW-01").await;
        f.engine.retire(&f.ctx, ArtifactRef::Product(id)).await.unwrap();
        let err = f
            .engine
            .retire(&f.ctx, ArtifactRef::Product(id))
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::Domain(DomainError::already_retired("product")));
    }

    #[tokio::test]
    async fn retiring_a_package_deletes_its_binary() {
        let f = fixture();
        let product_id = product(&f, "GW-01").await;
        let package_id = package(&f, product_id, "1.0.0").await;
        assert_eq!(f.blobs.len(), 1);

        f.engine.retire(&f.ctx, ArtifactRef::Package(package_id)).await.unwrap();
        // Deletion runs on a spawned task.
        for _ in 0..50 {
            if f.blobs.is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(f.blobs.is_empty());
    }

    #[tokio::test]
    async fn missing_blob_does_not_block_retirement() {
        let f = fixture();
        let product_id = product(&f, "GW-01").await;
        let package_id = package(&f, product_id, "1.0.0").await;
        f.blobs.delete("GW/1.0.0/fw.bin").await.unwrap();

        let out = f
            .engine
            .retire(&f.ctx, ArtifactRef::Package(package_id))
            .await
            .unwrap();
        assert_eq!(out.changed, 1);
    }
}
