//! In-memory store adapters for tests/dev.
//!
//! Each store keeps its state behind one `RwLock`; a conditional update takes the
//! write lock for the whole check-and-set, which gives the same single-row
//! atomicity the Postgres adapters get from `UPDATE ... WHERE`.

use std::collections::{BTreeSet, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use nova_auth::{
    AclEntry, AclFields, NewAcl, NewRole, NewUser, Role, RoleFields, UserAccount, UserChanges,
    UserQuery,
};
use nova_core::{
    AclId, Entity, LifecycleStatus, Page, Paged, PackageId, ProductId, RoleId, UserId,
};
use nova_products::{
    ArtifactRef, DeviceLog, DeviceLogQuery, NewDeviceLog, NewPackage, NewProduct, PackageChanges,
    PackageListing, PackageQuery, Product, ProductChanges, ProductPackage, ProductQuery,
    ProductSummary, PublishStatus, Transition,
};

use super::{AccessStore, CatalogStore, StoreResult};
use crate::error::StoreError;

fn poisoned() -> StoreError {
    StoreError::Backend("in-memory store lock poisoned".to_string())
}

fn paged<T: Clone>(rows: Vec<T>, page: Page) -> Paged<T> {
    Paged {
        count: rows.len() as u64,
        rows: page.slice(&rows),
    }
}

#[derive(Debug, Default)]
struct CatalogState {
    products: HashMap<ProductId, Product>,
    packages: HashMap<PackageId, ProductPackage>,
    device_logs: Vec<DeviceLog>,
}

impl CatalogState {
    fn model_taken(&self, model_id: &str, excluding: Option<ProductId>) -> Option<&Product> {
        self.products
            .values()
            .find(|p| p.is_active() && p.model_id == model_id && Some(p.id) != excluding)
    }

    fn version_taken(
        &self,
        product_id: ProductId,
        version: &str,
        excluding: Option<PackageId>,
    ) -> Option<&ProductPackage> {
        self.packages.values().find(|p| {
            p.is_active()
                && p.product_id == product_id
                && p.version == version
                && Some(p.id) != excluding
        })
    }
}

/// In-memory [`CatalogStore`].
#[derive(Debug, Default)]
pub struct InMemoryCatalogStore {
    inner: RwLock<CatalogState>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, CatalogState>> {
        self.inner.read().map_err(|_| poisoned())
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, CatalogState>> {
        self.inner.write().map_err(|_| poisoned())
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn insert_product(&self, new: NewProduct) -> StoreResult<Product> {
        let mut state = self.write()?;
        if state.model_taken(&new.fields.model_id, None).is_some() {
            return Err(StoreError::Duplicate("modelId".into()));
        }
        let now = Utc::now();
        let f = new.fields;
        let product = Product {
            id: new.id,
            name: f.name,
            model: f.model,
            model_id: f.model_id,
            kind: f.kind,
            stage: f.stage,
            fit_products: f.fit_products,
            area: f.area,
            dept: f.dept,
            project_manager: f.project_manager,
            description: f.description,
            logo: new.logo,
            publish_status: PublishStatus::Unpublished,
            published_by: None,
            lifecycle: LifecycleStatus::Active,
            created_by: Some(new.created_by),
            updated_by: Some(new.created_by),
            created_at: now,
            updated_at: now,
        };
        state.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn find_product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        Ok(self.read()?.products.get(&id).cloned())
    }

    async fn find_active_product_by_model(
        &self,
        model_id: &str,
        excluding: Option<ProductId>,
    ) -> StoreResult<Option<Product>> {
        Ok(self.read()?.model_taken(model_id, excluding).cloned())
    }

    async fn list_products(&self, query: &ProductQuery, page: Page) -> StoreResult<Paged<Product>> {
        let state = self.read()?;
        let mut rows: Vec<Product> = state
            .products
            .values()
            .filter(|p| query.matches(p))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(paged(rows, page))
    }

    async fn list_active_product_summaries(&self) -> StoreResult<Vec<ProductSummary>> {
        let state = self.read()?;
        let mut rows: Vec<ProductSummary> = state
            .products
            .values()
            .filter(|p| p.is_active())
            .map(ProductSummary::from)
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn latest_versions(&self, ids: &[ProductId]) -> StoreResult<HashMap<ProductId, String>> {
        let state = self.read()?;
        let mut latest: HashMap<ProductId, String> = HashMap::new();
        for package in state.packages.values() {
            if !package.is_active() || !ids.contains(&package.product_id) {
                continue;
            }
            let entry = latest.entry(package.product_id).or_default();
            if package.version > *entry {
                *entry = package.version.clone();
            }
        }
        Ok(latest)
    }

    async fn update_product(
        &self,
        id: ProductId,
        changes: ProductChanges,
    ) -> StoreResult<Option<Product>> {
        let mut state = self.write()?;
        if state.model_taken(&changes.fields.model_id, Some(id)).is_some() {
            return Err(StoreError::Duplicate("modelId".into()));
        }
        let Some(product) = state.products.get_mut(&id).filter(|p| p.is_active()) else {
            return Ok(None);
        };
        let f = changes.fields;
        product.name = f.name;
        product.model = f.model;
        product.model_id = f.model_id;
        product.kind = f.kind;
        product.stage = f.stage;
        product.fit_products = f.fit_products;
        product.area = f.area;
        product.dept = f.dept;
        product.project_manager = f.project_manager;
        product.description = f.description;
        if let Some(logo) = changes.logo {
            product.logo = Some(logo);
        }
        product.updated_by = Some(changes.updated_by);
        product.updated_at = Utc::now();
        Ok(Some(product.clone()))
    }

    async fn insert_package(&self, new: NewPackage) -> StoreResult<ProductPackage> {
        let mut state = self.write()?;
        if state
            .version_taken(new.fields.product_id, &new.fields.version, None)
            .is_some()
        {
            return Err(StoreError::Duplicate("version".into()));
        }
        let now = Utc::now();
        let package = ProductPackage {
            id: new.id,
            product_id: new.fields.product_id,
            version: new.fields.version,
            version_log: new.fields.version_log,
            stage: new.fields.stage,
            size: new.file.size,
            file_key: new.file.key,
            publish_status: PublishStatus::Unpublished,
            published_by: None,
            lifecycle: LifecycleStatus::Active,
            created_by: Some(new.created_by),
            updated_by: Some(new.created_by),
            created_at: now,
            updated_at: now,
        };
        state.packages.insert(package.id, package.clone());
        Ok(package)
    }

    async fn find_package(&self, id: PackageId) -> StoreResult<Option<ProductPackage>> {
        Ok(self.read()?.packages.get(&id).cloned())
    }

    async fn find_active_package_by_version(
        &self,
        product_id: ProductId,
        version: &str,
        excluding: Option<PackageId>,
    ) -> StoreResult<Option<ProductPackage>> {
        Ok(self
            .read()?
            .version_taken(product_id, version, excluding)
            .cloned())
    }

    async fn list_packages(
        &self,
        query: &PackageQuery,
        page: Page,
    ) -> StoreResult<Paged<PackageListing>> {
        let state = self.read()?;
        let mut rows: Vec<PackageListing> = state
            .packages
            .values()
            .filter(|p| query.matches(p))
            .map(|p| PackageListing {
                package: p.clone(),
                product_name: state
                    .products
                    .get(&p.product_id)
                    .map(|product| product.name.clone())
                    .unwrap_or_default(),
            })
            .collect();
        rows.sort_by(|a, b| {
            a.package
                .updated_at
                .cmp(&b.package.updated_at)
                .then(a.package.id.cmp(&b.package.id))
        });
        Ok(paged(rows, page))
    }

    async fn update_package(
        &self,
        id: PackageId,
        changes: PackageChanges,
    ) -> StoreResult<Option<ProductPackage>> {
        let mut state = self.write()?;
        if state
            .version_taken(changes.fields.product_id, &changes.fields.version, Some(id))
            .is_some()
        {
            return Err(StoreError::Duplicate("version".into()));
        }
        let Some(package) = state.packages.get_mut(&id).filter(|p| p.is_active()) else {
            return Ok(None);
        };
        package.product_id = changes.fields.product_id;
        package.version = changes.fields.version;
        package.version_log = changes.fields.version_log;
        package.stage = changes.fields.stage;
        if let Some(file) = changes.file {
            package.file_key = file.key;
            package.size = file.size;
        }
        package.updated_by = Some(changes.updated_by);
        package.updated_at = Utc::now();
        Ok(Some(package.clone()))
    }

    async fn packages_of(&self, product_id: ProductId) -> StoreResult<Vec<ProductPackage>> {
        let state = self.read()?;
        let mut rows: Vec<ProductPackage> = state
            .packages
            .values()
            .filter(|p| p.product_id == product_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.version.cmp(&b.version));
        Ok(rows)
    }

    async fn apply_transition(
        &self,
        target: ArtifactRef,
        transition: Transition,
        actor: UserId,
    ) -> StoreResult<u64> {
        let mut state = self.write()?;
        let now = Utc::now();
        let (lifecycle, status, updated_by, published_by, updated_at) = match target {
            ArtifactRef::Product(id) => match state.products.get_mut(&id) {
                Some(p) => (
                    p.lifecycle,
                    &mut p.publish_status,
                    &mut p.updated_by,
                    &mut p.published_by,
                    &mut p.updated_at,
                ),
                None => return Ok(0),
            },
            ArtifactRef::Package(id) => match state.packages.get_mut(&id) {
                Some(p) => (
                    p.lifecycle,
                    &mut p.publish_status,
                    &mut p.updated_by,
                    &mut p.published_by,
                    &mut p.updated_at,
                ),
                None => return Ok(0),
            },
        };
        if !lifecycle.is_active() {
            return Ok(0);
        }
        let Some(next) = transition.apply(*status) else {
            return Ok(0);
        };
        *status = next;
        *updated_by = Some(actor);
        *updated_at = now;
        if transition.records_publisher() {
            *published_by = Some(actor);
        }
        Ok(1)
    }

    async fn retire(&self, target: ArtifactRef, actor: UserId) -> StoreResult<u64> {
        let mut state = self.write()?;
        let row = match target {
            ArtifactRef::Product(id) => state
                .products
                .get_mut(&id)
                .map(|p| (&mut p.lifecycle, &mut p.updated_by, &mut p.updated_at)),
            ArtifactRef::Package(id) => state
                .packages
                .get_mut(&id)
                .map(|p| (&mut p.lifecycle, &mut p.updated_by, &mut p.updated_at)),
        };
        match row {
            Some((lifecycle, updated_by, updated_at)) if lifecycle.is_active() => {
                *lifecycle = LifecycleStatus::Retired;
                *updated_by = Some(actor);
                *updated_at = Utc::now();
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn insert_device_log(&self, new: NewDeviceLog) -> StoreResult<DeviceLog> {
        let log = DeviceLog {
            id: new.id,
            device_id: new.device_id,
            device_name: new.device_name,
            version: new.version,
            device_info: new.device_info,
            device_status: new.device_status,
            software_ip: new.software_ip,
            lifecycle: LifecycleStatus::Active,
            created_at: Utc::now(),
        };
        self.write()?.device_logs.push(log.clone());
        Ok(log)
    }

    async fn list_device_logs(
        &self,
        query: &DeviceLogQuery,
        page: Page,
    ) -> StoreResult<Paged<DeviceLog>> {
        let state = self.read()?;
        // Insertion order is chronological.
        let rows: Vec<DeviceLog> = state
            .device_logs
            .iter()
            .rev()
            .filter(|l| query.matches(l))
            .cloned()
            .collect();
        Ok(paged(rows, page))
    }
}

#[derive(Debug, Default)]
struct AccessState {
    users: HashMap<UserId, UserAccount>,
    roles: HashMap<RoleId, Role>,
    acls: HashMap<AclId, AclEntry>,
}

fn is_live(lifecycle: LifecycleStatus) -> bool {
    lifecycle != LifecycleStatus::Retired
}

impl AccessState {
    fn username_taken(&self, username: &str) -> bool {
        self.users
            .values()
            .any(|u| is_live(u.lifecycle) && u.username == username)
    }

    fn role_name_taken(&self, name: &str, excluding: Option<RoleId>) -> Option<&Role> {
        self.roles
            .values()
            .find(|r| is_live(r.lifecycle) && r.name == name && Some(r.id) != excluding)
    }

    fn acl_conflict(&self, code: &str, name: &str, excluding: Option<AclId>) -> Option<&AclEntry> {
        self.acls.values().find(|a| {
            is_live(a.lifecycle) && (a.code == code || a.name == name) && Some(a.id) != excluding
        })
    }
}

/// In-memory [`AccessStore`].
#[derive(Debug, Default)]
pub struct InMemoryAccessStore {
    inner: RwLock<AccessState>,
}

impl InMemoryAccessStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, AccessState>> {
        self.inner.read().map_err(|_| poisoned())
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, AccessState>> {
        self.inner.write().map_err(|_| poisoned())
    }
}

#[async_trait]
impl AccessStore for InMemoryAccessStore {
    async fn insert_user(&self, new: NewUser) -> StoreResult<UserAccount> {
        let mut state = self.write()?;
        if state.username_taken(&new.username) {
            return Err(StoreError::Duplicate("username".into()));
        }
        let now = Utc::now();
        let user = UserAccount {
            id: new.id,
            username: new.username,
            name: new.profile.name,
            code: new.profile.code,
            phone: new.profile.phone,
            email: new.profile.email,
            password_hash: new.password_hash,
            superuser: new.superuser,
            role_ids: dedup(new.role_ids),
            lifecycle: LifecycleStatus::Active,
            created_by: new.created_by,
            updated_by: new.created_by,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: UserId) -> StoreResult<Option<UserAccount>> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<UserAccount>> {
        Ok(self
            .read()?
            .users
            .values()
            .find(|u| is_live(u.lifecycle) && u.username == username)
            .cloned())
    }

    async fn find_superuser(&self) -> StoreResult<Option<UserAccount>> {
        Ok(self
            .read()?
            .users
            .values()
            .find(|u| u.superuser)
            .cloned())
    }

    async fn list_users(&self, query: &UserQuery, page: Page) -> StoreResult<Paged<UserAccount>> {
        let state = self.read()?;
        let mut rows: Vec<UserAccount> = state
            .users
            .values()
            .filter(|u| query.matches(u))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(paged(rows, page))
    }

    async fn update_user(
        &self,
        id: UserId,
        changes: UserChanges,
    ) -> StoreResult<Option<UserAccount>> {
        let mut state = self.write()?;
        let Some(user) = state
            .users
            .get_mut(&id)
            .filter(|u| is_live(u.lifecycle) && !u.superuser)
        else {
            return Ok(None);
        };
        user.name = changes.profile.name;
        user.code = changes.profile.code;
        user.phone = changes.profile.phone;
        user.email = changes.profile.email;
        if let Some(hash) = changes.password_hash {
            user.password_hash = hash;
        }
        user.role_ids = dedup(changes.role_ids);
        user.updated_by = Some(changes.updated_by);
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn set_user_status(
        &self,
        id: UserId,
        status: LifecycleStatus,
        actor: UserId,
    ) -> StoreResult<u64> {
        if !is_live(status) {
            return Ok(0);
        }
        let mut state = self.write()?;
        match state.users.get_mut(&id) {
            Some(user) if is_live(user.lifecycle) && !user.superuser => {
                user.lifecycle = status;
                user.updated_by = Some(actor);
                user.updated_at = Utc::now();
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn retire_user(&self, id: UserId, actor: UserId) -> StoreResult<u64> {
        let mut state = self.write()?;
        match state.users.get_mut(&id) {
            Some(user) if user.lifecycle == LifecycleStatus::Inactive && !user.superuser => {
                user.lifecycle = LifecycleStatus::Retired;
                user.updated_by = Some(actor);
                user.updated_at = Utc::now();
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn insert_role(&self, new: NewRole) -> StoreResult<Role> {
        let mut state = self.write()?;
        if state.role_name_taken(&new.fields.name, None).is_some() {
            return Err(StoreError::Duplicate("role name".into()));
        }
        let now = Utc::now();
        let role = Role {
            id: new.id,
            name: new.fields.name,
            remark: new.fields.remark,
            acl_ids: Vec::new(),
            lifecycle: LifecycleStatus::Active,
            created_by: Some(new.created_by),
            updated_by: Some(new.created_by),
            created_at: now,
            updated_at: now,
        };
        state.roles.insert(role.id, role.clone());
        Ok(role)
    }

    async fn find_role(&self, id: RoleId) -> StoreResult<Option<Role>> {
        Ok(self.read()?.roles.get(&id).cloned())
    }

    async fn find_role_by_name(
        &self,
        name: &str,
        excluding: Option<RoleId>,
    ) -> StoreResult<Option<Role>> {
        Ok(self.read()?.role_name_taken(name, excluding).cloned())
    }

    async fn list_roles(&self) -> StoreResult<Vec<Role>> {
        let state = self.read()?;
        let mut rows: Vec<Role> = state
            .roles
            .values()
            .filter(|r| is_live(r.lifecycle))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn update_role(
        &self,
        id: RoleId,
        fields: RoleFields,
        actor: UserId,
    ) -> StoreResult<Option<Role>> {
        let mut state = self.write()?;
        if state.role_name_taken(&fields.name, Some(id)).is_some() {
            return Err(StoreError::Duplicate("role name".into()));
        }
        let Some(role) = state.roles.get_mut(&id).filter(|r| is_live(r.lifecycle)) else {
            return Ok(None);
        };
        role.name = fields.name;
        role.remark = fields.remark;
        role.updated_by = Some(actor);
        role.updated_at = Utc::now();
        Ok(Some(role.clone()))
    }

    async fn retire_role(&self, id: RoleId, actor: UserId) -> StoreResult<u64> {
        let mut state = self.write()?;
        let retired = match state.roles.get_mut(&id) {
            Some(role) if is_live(role.lifecycle) => {
                role.lifecycle = LifecycleStatus::Retired;
                role.updated_by = Some(actor);
                role.updated_at = Utc::now();
                true
            }
            _ => false,
        };
        if retired {
            for user in state.users.values_mut() {
                user.role_ids.retain(|r| *r != id);
            }
        }
        Ok(u64::from(retired))
    }

    async fn set_role_users(&self, id: RoleId, users: &[UserId]) -> StoreResult<()> {
        let mut state = self.write()?;
        for user in state.users.values_mut() {
            let holds = users.contains(&user.id);
            user.role_ids.retain(|r| *r != id);
            if holds {
                user.role_ids.push(id);
            }
        }
        Ok(())
    }

    async fn set_role_acls(&self, id: RoleId, acls: &[AclId]) -> StoreResult<()> {
        let mut state = self.write()?;
        if let Some(role) = state.roles.get_mut(&id) {
            role.acl_ids = dedup(acls.to_vec());
        }
        Ok(())
    }

    async fn insert_acl(&self, new: NewAcl) -> StoreResult<AclEntry> {
        let mut state = self.write()?;
        if state
            .acl_conflict(&new.fields.code, &new.fields.name, None)
            .is_some()
        {
            return Err(StoreError::Duplicate("acl code or name".into()));
        }
        let now = Utc::now();
        let acl = AclEntry {
            id: new.id,
            parent_id: new.fields.parent_id,
            code: new.fields.code,
            name: new.fields.name,
            remark: new.fields.remark,
            lifecycle: LifecycleStatus::Active,
            created_by: Some(new.created_by),
            updated_by: Some(new.created_by),
            created_at: now,
            updated_at: now,
        };
        state.acls.insert(acl.id, acl.clone());
        Ok(acl)
    }

    async fn find_acl(&self, id: AclId) -> StoreResult<Option<AclEntry>> {
        Ok(self.read()?.acls.get(&id).cloned())
    }

    async fn find_acl_conflict(
        &self,
        code: &str,
        name: &str,
        excluding: Option<AclId>,
    ) -> StoreResult<Option<AclEntry>> {
        Ok(self.read()?.acl_conflict(code, name, excluding).cloned())
    }

    async fn list_acls(&self) -> StoreResult<Vec<AclEntry>> {
        let state = self.read()?;
        let mut rows: Vec<AclEntry> = state
            .acls
            .values()
            .filter(|a| is_live(a.lifecycle))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(rows)
    }

    async fn update_acl(
        &self,
        id: AclId,
        fields: AclFields,
        actor: UserId,
    ) -> StoreResult<Option<AclEntry>> {
        let mut state = self.write()?;
        if state.acl_conflict(&fields.code, &fields.name, Some(id)).is_some() {
            return Err(StoreError::Duplicate("acl code or name".into()));
        }
        let Some(acl) = state.acls.get_mut(&id).filter(|a| is_live(a.lifecycle)) else {
            return Ok(None);
        };
        acl.parent_id = fields.parent_id;
        acl.code = fields.code;
        acl.name = fields.name;
        acl.remark = fields.remark;
        acl.updated_by = Some(actor);
        acl.updated_at = Utc::now();
        Ok(Some(acl.clone()))
    }

    async fn retire_acl(&self, id: AclId, actor: UserId) -> StoreResult<u64> {
        let mut state = self.write()?;
        let retired = match state.acls.get_mut(&id) {
            Some(acl) if is_live(acl.lifecycle) => {
                acl.lifecycle = LifecycleStatus::Retired;
                acl.updated_by = Some(actor);
                acl.updated_at = Utc::now();
                true
            }
            _ => false,
        };
        if retired {
            for role in state.roles.values_mut() {
                role.acl_ids.retain(|a| *a != id);
            }
        }
        Ok(u64::from(retired))
    }
}

fn dedup<T: Ord + Copy>(ids: Vec<T>) -> Vec<T> {
    ids.into_iter().collect::<BTreeSet<_>>().into_iter().collect()
}

#[cfg(test)]
mod tests {
    use nova_products::{PackageFields, PackageFile, ProductFields};

    use super::*;

    fn new_product(model_id: &str) -> NewProduct {
        NewProduct {
            id: ProductId::new(),
            fields: ProductFields {
                name: format!("Product {model_id}"),
                model_id: model_id.to_string(),
                ..Default::default()
            },
            logo: None,
            created_by: UserId::new(),
        }
    }

    fn new_package(product_id: ProductId, version: &str) -> NewPackage {
        NewPackage {
            id: PackageId::new(),
            fields: PackageFields {
                product_id,
                version: version.to_string(),
                version_log: None,
                stage: None,
            },
            file: PackageFile {
                key: format!("m/{version}/fw.bin"),
                size: 3,
            },
            created_by: UserId::new(),
        }
    }

    #[tokio::test]
    async fn transition_is_guarded_by_lifecycle_and_source() {
        let store = InMemoryCatalogStore::new();
        let product = store.insert_product(new_product("GW-01")).await.unwrap();
        let target = ArtifactRef::Product(product.id);
        let actor = UserId::new();

        assert_eq!(store.apply_transition(target, Transition::Withdraw, actor).await.unwrap(), 0);
        assert_eq!(store.apply_transition(target, Transition::Tryout, actor).await.unwrap(), 1);
        assert_eq!(store.apply_transition(target, Transition::Tryout, actor).await.unwrap(), 0);

        let stored = store.find_product(product.id).await.unwrap().unwrap();
        assert_eq!(stored.publish_status, PublishStatus::Trial);
        assert_eq!(stored.updated_by, Some(actor));
        assert_eq!(stored.published_by, None);
    }

    #[tokio::test]
    async fn publish_stamps_the_publisher() {
        let store = InMemoryCatalogStore::new();
        let product = store.insert_product(new_product("GW-01")).await.unwrap();
        let package = store.insert_package(new_package(product.id, "1.0.0")).await.unwrap();
        let actor = UserId::new();

        let changed = store
            .apply_transition(ArtifactRef::Package(package.id), Transition::Publish, actor)
            .await
            .unwrap();
        assert_eq!(changed, 1);
        let stored = store.find_package(package.id).await.unwrap().unwrap();
        assert_eq!(stored.published_by, Some(actor));
    }

    #[tokio::test]
    async fn retired_rows_ignore_transitions_and_second_retire() {
        let store = InMemoryCatalogStore::new();
        let product = store.insert_product(new_product("GW-01")).await.unwrap();
        let target = ArtifactRef::Product(product.id);
        let actor = UserId::new();

        assert_eq!(store.retire(target, actor).await.unwrap(), 1);
        assert_eq!(store.retire(target, actor).await.unwrap(), 0);
        assert_eq!(store.apply_transition(target, Transition::Publish, actor).await.unwrap(), 0);
        assert_eq!(
            store
                .apply_transition(ArtifactRef::Product(ProductId::new()), Transition::Publish, actor)
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn version_uniqueness_only_covers_active_rows() {
        let store = InMemoryCatalogStore::new();
        let product = store.insert_product(new_product("GW-01")).await.unwrap();
        let first = store.insert_package(new_package(product.id, "1.0.0")).await.unwrap();

        let err = store
            .insert_package(new_package(product.id, "1.0.0"))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::Duplicate("version".into()));

        store.retire(ArtifactRef::Package(first.id), UserId::new()).await.unwrap();
        assert!(store.insert_package(new_package(product.id, "1.0.0")).await.is_ok());
    }

    #[tokio::test]
    async fn latest_versions_skip_retired_packages() {
        let store = InMemoryCatalogStore::new();
        let product = store.insert_product(new_product("GW-01")).await.unwrap();
        store.insert_package(new_package(product.id, "1.0.0")).await.unwrap();
        let newest = store.insert_package(new_package(product.id, "1.2.0")).await.unwrap();
        store.retire(ArtifactRef::Package(newest.id), UserId::new()).await.unwrap();

        let latest = store.latest_versions(&[product.id]).await.unwrap();
        assert_eq!(latest.get(&product.id).map(String::as_str), Some("1.0.0"));
    }

    #[tokio::test]
    async fn only_disabled_users_can_be_retired() {
        let store = InMemoryAccessStore::new();
        let actor = UserId::new();
        let user = store
            .insert_user(NewUser {
                id: UserId::new(),
                username: "alice".into(),
                profile: nova_auth::UserProfile {
                    name: None,
                    code: None,
                    phone: None,
                    email: None,
                },
                password_hash: "x".into(),
                superuser: false,
                role_ids: Vec::new(),
                created_by: None,
            })
            .await
            .unwrap();

        assert_eq!(store.retire_user(user.id, actor).await.unwrap(), 0);
        assert_eq!(
            store
                .set_user_status(user.id, LifecycleStatus::Inactive, actor)
                .await
                .unwrap(),
            1
        );
        assert_eq!(store.retire_user(user.id, actor).await.unwrap(), 1);
        assert!(store.find_user_by_username("alice").await.unwrap().is_none());
    }
}
