use std::sync::Arc;

use anyhow::Context;
use chrono::Duration;

use nova_auth::{Hs256Jwt, PasswordHasher};
use nova_infra::{
    AccessService, CatalogService, Config, WorkflowEngine,
    blob::{BlobStore, FilesystemBlobStore, InMemoryBlobStore},
    store::{
        AccessStore, CatalogStore, InMemoryAccessStore, InMemoryCatalogStore, PostgresAccessStore,
        PostgresCatalogStore, postgres,
    },
};

/// Everything handlers need, shared behind an `Arc`.
#[derive(Clone)]
pub struct AppServices {
    pub catalog: CatalogService,
    pub workflow: WorkflowEngine,
    pub access: AccessService,
    pub page_size: u32,
}

pub async fn build_services(config: &Config) -> anyhow::Result<AppServices> {
    let (catalog_store, access_store) = match &config.database_url {
        Some(url) => build_persistent_stores(url, config.max_db_connections).await?,
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory stores");
            build_in_memory_stores()
        }
    };

    let blobs: Arc<dyn BlobStore> = match &config.storage_path {
        Some(path) => {
            tokio::fs::create_dir_all(path)
                .await
                .with_context(|| format!("failed to create storage directory {path}"))?;
            Arc::new(FilesystemBlobStore::new(path))
        }
        None => {
            tracing::warn!("STORAGE_PATH not set; uploads are kept in memory");
            Arc::new(InMemoryBlobStore::new())
        }
    };

    let hasher = config
        .bcrypt_cost
        .map(PasswordHasher::with_cost)
        .unwrap_or_default();
    let jwt = Arc::new(Hs256Jwt::new(
        config.jwt_secret.as_bytes(),
        Duration::seconds(config.jwt_ttl_secs),
    ));

    let access = AccessService::new(access_store, hasher, jwt);
    access
        .ensure_superuser(&config.root_username, &config.root_password)
        .await
        .context("failed to bootstrap the superuser")?;

    Ok(AppServices {
        catalog: CatalogService::new(
            catalog_store.clone(),
            blobs.clone(),
            config.public_base_url.clone(),
        ),
        workflow: WorkflowEngine::new(catalog_store, blobs),
        access,
        page_size: config.page_size,
    })
}

fn build_in_memory_stores() -> (Arc<dyn CatalogStore>, Arc<dyn AccessStore>) {
    (
        Arc::new(InMemoryCatalogStore::new()),
        Arc::new(InMemoryAccessStore::new()),
    )
}

async fn build_persistent_stores(
    database_url: &str,
    max_connections: u32,
) -> anyhow::Result<(Arc<dyn CatalogStore>, Arc<dyn AccessStore>)> {
    let pool = postgres::connect(database_url, max_connections)
        .await
        .context("failed to connect to Postgres")?;
    postgres::apply_schema(&pool)
        .await
        .context("failed to apply schema")?;
    tracing::info!("using Postgres stores");

    Ok((
        Arc::new(PostgresCatalogStore::new(pool.clone())),
        Arc::new(PostgresAccessStore::new(pool)),
    ))
}
