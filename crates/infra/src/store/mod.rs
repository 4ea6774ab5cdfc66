//! Persistence ports and their adapters.
//!
//! Services talk to [`CatalogStore`] and [`AccessStore`] only. Each port has an
//! in-memory adapter (dev/tests) and a Postgres adapter.

use std::collections::HashMap;

use async_trait::async_trait;

use nova_auth::{AclEntry, AclFields, NewAcl, NewRole, NewUser, Role, RoleFields, UserAccount, UserChanges, UserQuery};
use nova_core::{AclId, LifecycleStatus, Page, Paged, PackageId, ProductId, RoleId, UserId};
use nova_products::{
    ArtifactRef, DeviceLog, DeviceLogQuery, NewDeviceLog, NewPackage, NewProduct, PackageChanges,
    PackageListing, PackageQuery, Product, ProductChanges, ProductPackage, ProductQuery,
    ProductSummary, Transition,
};

use crate::error::StoreError;

pub mod memory;
pub mod postgres;

pub use memory::{InMemoryAccessStore, InMemoryCatalogStore};
pub use postgres::{PostgresAccessStore, PostgresCatalogStore};

pub type StoreResult<T> = Result<T, StoreError>;

/// Products, packages and device logs.
///
/// `apply_transition` and `retire` are single guarded conditional updates: the
/// returned row count (0 or 1) is the only success signal.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn insert_product(&self, new: NewProduct) -> StoreResult<Product>;

    async fn find_product(&self, id: ProductId) -> StoreResult<Option<Product>>;

    /// Active product with this model id, other than `excluding`.
    async fn find_active_product_by_model(
        &self,
        model_id: &str,
        excluding: Option<ProductId>,
    ) -> StoreResult<Option<Product>>;

    /// Active products matching `query`, newest first.
    async fn list_products(&self, query: &ProductQuery, page: Page) -> StoreResult<Paged<Product>>;

    async fn list_active_product_summaries(&self) -> StoreResult<Vec<ProductSummary>>;

    /// Lexicographically latest Active package version per product.
    async fn latest_versions(&self, ids: &[ProductId]) -> StoreResult<HashMap<ProductId, String>>;

    /// Updates an Active product; `None` when no Active row has this id.
    async fn update_product(
        &self,
        id: ProductId,
        changes: ProductChanges,
    ) -> StoreResult<Option<Product>>;

    async fn insert_package(&self, new: NewPackage) -> StoreResult<ProductPackage>;

    async fn find_package(&self, id: PackageId) -> StoreResult<Option<ProductPackage>>;

    async fn find_active_package_by_version(
        &self,
        product_id: ProductId,
        version: &str,
        excluding: Option<PackageId>,
    ) -> StoreResult<Option<ProductPackage>>;

    /// Packages matching `query` joined with their product name, oldest update first.
    async fn list_packages(
        &self,
        query: &PackageQuery,
        page: Page,
    ) -> StoreResult<Paged<PackageListing>>;

    async fn update_package(
        &self,
        id: PackageId,
        changes: PackageChanges,
    ) -> StoreResult<Option<ProductPackage>>;

    /// Every package of a product, whatever its lifecycle.
    async fn packages_of(&self, product_id: ProductId) -> StoreResult<Vec<ProductPackage>>;

    /// `SET publish_status = target, updated_by = actor [, published_by = actor]
    /// WHERE id = ? AND status = Active AND publish_status IN sources`.
    async fn apply_transition(
        &self,
        target: ArtifactRef,
        transition: Transition,
        actor: UserId,
    ) -> StoreResult<u64>;

    /// `SET status = Retired WHERE id = ? AND status = Active`.
    async fn retire(&self, target: ArtifactRef, actor: UserId) -> StoreResult<u64>;

    async fn insert_device_log(&self, new: NewDeviceLog) -> StoreResult<DeviceLog>;

    /// Newest first.
    async fn list_device_logs(
        &self,
        query: &DeviceLogQuery,
        page: Page,
    ) -> StoreResult<Paged<DeviceLog>>;
}

/// Users, roles and ACL entries.
///
/// "Live" below means any lifecycle other than `Retired`.
#[async_trait]
pub trait AccessStore: Send + Sync {
    async fn insert_user(&self, new: NewUser) -> StoreResult<UserAccount>;

    async fn find_user(&self, id: UserId) -> StoreResult<Option<UserAccount>>;

    /// Live user with this username.
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<UserAccount>>;

    async fn find_superuser(&self) -> StoreResult<Option<UserAccount>>;

    async fn list_users(&self, query: &UserQuery, page: Page) -> StoreResult<Paged<UserAccount>>;

    /// Updates a live, non-superuser account.
    async fn update_user(&self, id: UserId, changes: UserChanges)
    -> StoreResult<Option<UserAccount>>;

    /// Toggles a live, non-superuser account between Active and Inactive.
    async fn set_user_status(
        &self,
        id: UserId,
        status: LifecycleStatus,
        actor: UserId,
    ) -> StoreResult<u64>;

    /// `SET status = Retired WHERE id = ? AND status = Inactive AND NOT superuser`.
    async fn retire_user(&self, id: UserId, actor: UserId) -> StoreResult<u64>;

    async fn insert_role(&self, new: NewRole) -> StoreResult<Role>;

    async fn find_role(&self, id: RoleId) -> StoreResult<Option<Role>>;

    /// Live role with this name, other than `excluding`.
    async fn find_role_by_name(
        &self,
        name: &str,
        excluding: Option<RoleId>,
    ) -> StoreResult<Option<Role>>;

    /// Live roles, by name.
    async fn list_roles(&self) -> StoreResult<Vec<Role>>;

    async fn update_role(
        &self,
        id: RoleId,
        fields: RoleFields,
        actor: UserId,
    ) -> StoreResult<Option<Role>>;

    async fn retire_role(&self, id: RoleId, actor: UserId) -> StoreResult<u64>;

    /// Replace the set of users holding a role.
    async fn set_role_users(&self, id: RoleId, users: &[UserId]) -> StoreResult<()>;

    /// Replace the set of ACL entries a role grants.
    async fn set_role_acls(&self, id: RoleId, acls: &[AclId]) -> StoreResult<()>;

    async fn insert_acl(&self, new: NewAcl) -> StoreResult<AclEntry>;

    async fn find_acl(&self, id: AclId) -> StoreResult<Option<AclEntry>>;

    /// Live entry sharing the code or the name, other than `excluding`.
    async fn find_acl_conflict(
        &self,
        code: &str,
        name: &str,
        excluding: Option<AclId>,
    ) -> StoreResult<Option<AclEntry>>;

    /// Live entries, by code.
    async fn list_acls(&self) -> StoreResult<Vec<AclEntry>>;

    async fn update_acl(
        &self,
        id: AclId,
        fields: AclFields,
        actor: UserId,
    ) -> StoreResult<Option<AclEntry>>;

    async fn retire_acl(&self, id: AclId, actor: UserId) -> StoreResult<u64>;
}
