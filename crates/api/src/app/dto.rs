//! Request/response DTOs and their mapping to domain types.
//!
//! The wire format is camelCase; publish statuses travel as `pro_status_0N`
//! tokens and lifecycle statuses as their numeric codes.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use nova_auth::{AclEntry, AclFields, Role, RoleFields, UserAccount, UserProfile, UserQuery};
use nova_core::{AclId, DomainError, LifecycleStatus, Page, ProductId, RoleId, UserId};
use nova_infra::{PackageView, ProductView, UpgradeOffer, UserInput, UserUpdate};
use nova_products::{
    DeviceLog, DeviceLogQuery, PackageFields, PackageQuery, ProductFields, ProductQuery,
    ProductSummary, PublishStatus, Stage,
};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListQuery {
    pub username: Option<String>,
    pub name: Option<String>,
    pub code: Option<String>,
    pub role_id: Option<RoleId>,
    pub status: Option<LifecycleStatus>,
    pub page_num: Option<u32>,
    pub page_size: Option<u32>,
}

impl UserListQuery {
    pub fn query(&self) -> UserQuery {
        UserQuery {
            username: self.username.clone(),
            name: self.name.clone(),
            code: self.code.clone(),
            role_id: self.role_id,
            lifecycle: self.status.unwrap_or_default(),
            exclude: Vec::new(),
        }
    }

    pub fn page(&self, default_size: u32) -> Page {
        Page::new(self.page_num, self.page_size, default_size)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub name: Option<String>,
    pub code: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub role_ids: Vec<RoleId>,
}

impl From<CreateUserRequest> for UserInput {
    fn from(body: CreateUserRequest) -> Self {
        UserInput {
            username: body.username,
            password: body.password,
            profile: UserProfile {
                name: body.name,
                code: body.code,
                phone: body.phone,
                email: body.email,
            },
            role_ids: body.role_ids,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub password: Option<String>,
    pub name: Option<String>,
    pub code: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub role_ids: Vec<RoleId>,
}

impl From<UpdateUserRequest> for UserUpdate {
    fn from(body: UpdateUserRequest) -> Self {
        UserUpdate {
            profile: UserProfile {
                name: body.name,
                code: body.code,
                phone: body.phone,
                email: body.email,
            },
            password: body.password,
            role_ids: body.role_ids,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: LifecycleStatus,
}

#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    pub name: String,
    pub remark: Option<String>,
}

impl From<RoleRequest> for RoleFields {
    fn from(body: RoleRequest) -> Self {
        RoleFields {
            name: body.name,
            remark: body.remark,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleUsersRequest {
    pub user_ids: Vec<UserId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleAclsRequest {
    pub acl_ids: Vec<AclId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AclRequest {
    pub parent_id: Option<AclId>,
    pub code: String,
    pub name: String,
    pub remark: Option<String>,
}

impl From<AclRequest> for AclFields {
    fn from(body: AclRequest) -> Self {
        AclFields {
            parent_id: body.parent_id,
            code: body.code,
            name: body.name,
            remark: body.remark,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListQuery {
    pub publish_status: Option<PublishStatus>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub name: Option<String>,
    pub page_num: Option<u32>,
    pub page_size: Option<u32>,
}

impl ProductListQuery {
    pub fn query(&self) -> ProductQuery {
        ProductQuery {
            publish_status: self.publish_status,
            kind: self.kind.clone(),
            name: self.name.clone(),
        }
    }

    pub fn page(&self, default_size: u32) -> Page {
        Page::new(self.page_num, self.page_size, default_size)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageListQuery {
    pub product_id: Option<ProductId>,
    pub version: Option<String>,
    pub status: Option<LifecycleStatus>,
    pub stage: Option<Stage>,
    pub publish_status: Option<PublishStatus>,
    pub updated_from: Option<DateTime<Utc>>,
    pub updated_to: Option<DateTime<Utc>>,
    pub page_num: Option<u32>,
    pub page_size: Option<u32>,
}

impl PackageListQuery {
    pub fn query(&self) -> PackageQuery {
        PackageQuery {
            product_id: self.product_id,
            version: self.version.clone(),
            lifecycle: self.status.unwrap_or_default(),
            stage: self.stage,
            publish_status: self.publish_status,
            updated_from: self.updated_from,
            updated_to: self.updated_to,
        }
    }

    pub fn page(&self, default_size: u32) -> Page {
        Page::new(self.page_num, self.page_size, default_size)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeQuery {
    pub model_id: String,
    pub version: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceLogListQuery {
    pub device_id: Option<String>,
    pub device_name: Option<String>,
    pub version: Option<String>,
    pub page_num: Option<u32>,
    pub page_size: Option<u32>,
}

impl DeviceLogListQuery {
    pub fn query(&self) -> DeviceLogQuery {
        DeviceLogQuery {
            device_id: self.device_id.clone(),
            device_name: self.device_name.clone(),
            version: self.version.clone(),
        }
    }

    pub fn page(&self, default_size: u32) -> Page {
        Page::new(self.page_num, self.page_size, default_size)
    }
}

// -------------------------
// Multipart form fields
// -------------------------

fn text(fields: &HashMap<String, String>, name: &str) -> Option<String> {
    fields
        .get(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn stage(fields: &HashMap<String, String>) -> Result<Option<Stage>, DomainError> {
    text(fields, "stage")
        .map(|raw| {
            raw.parse::<i16>()
                .map_err(|_| DomainError::validation(format!("invalid stage '{raw}'")))
                .and_then(Stage::try_from)
        })
        .transpose()
}

/// Product form: `fitPro` is a comma separated list of product ids.
pub fn product_fields(fields: &HashMap<String, String>) -> Result<ProductFields, DomainError> {
    let fit_products = text(fields, "fitPro")
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| s.parse::<ProductId>())
                .collect::<Result<Vec<_>, _>>()
        })
        .transpose()?
        .unwrap_or_default();

    Ok(ProductFields {
        name: text(fields, "name").unwrap_or_default(),
        model: text(fields, "model").unwrap_or_default(),
        model_id: text(fields, "modelId").unwrap_or_default(),
        kind: text(fields, "type"),
        stage: text(fields, "stage"),
        fit_products,
        area: text(fields, "area"),
        dept: text(fields, "dept"),
        project_manager: text(fields, "projectManager"),
        description: text(fields, "productDesc"),
    })
}

pub fn package_fields(fields: &HashMap<String, String>) -> Result<PackageFields, DomainError> {
    let product_id = text(fields, "productId")
        .ok_or_else(|| DomainError::validation("productId is required"))?
        .parse::<ProductId>()?;
    Ok(PackageFields {
        product_id,
        version: text(fields, "version").unwrap_or_default(),
        version_log: text(fields, "versionLog"),
        stage: stage(fields)?,
    })
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct PageResponse<T> {
    pub count: u64,
    pub rows: Vec<T>,
}

impl<T> PageResponse<T> {
    pub fn from_paged<U>(paged: nova_core::Paged<U>, f: impl FnMut(U) -> T) -> Self {
        let paged = paged.map(f);
        Self {
            count: paged.count,
            rows: paged.rows,
        }
    }
}

/// Success envelope for guarded updates.
#[derive(Debug, Serialize)]
pub struct ChangedResponse {
    pub changed: u64,
    pub length: u64,
}

impl ChangedResponse {
    pub fn new(changed: u64) -> Self {
        Self {
            changed,
            length: changed,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProductSummaryResponse {
    pub id: ProductId,
    pub name: String,
}

impl From<ProductSummary> for ProductSummaryResponse {
    fn from(s: ProductSummary) -> Self {
        Self { id: s.id, name: s.name }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: ProductId,
    pub name: String,
    pub model: String,
    pub model_id: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub stage: Option<String>,
    pub fit_pro: Vec<ProductSummaryResponse>,
    pub area: Option<String>,
    pub dept: Option<String>,
    pub project_manager: Option<String>,
    pub product_desc: Option<String>,
    /// Public logo URL, empty without a logo.
    pub logo: String,
    /// Latest Active package version, empty without packages.
    pub version: String,
    pub publish_status: PublishStatus,
    pub publish_by: Option<UserId>,
    pub status: LifecycleStatus,
    pub created_by: Option<UserId>,
    pub updated_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProductView> for ProductResponse {
    fn from(view: ProductView) -> Self {
        let p = view.product;
        Self {
            id: p.id,
            name: p.name,
            model: p.model,
            model_id: p.model_id,
            kind: p.kind,
            stage: p.stage,
            fit_pro: view.compatible.into_iter().map(Into::into).collect(),
            area: p.area,
            dept: p.dept,
            project_manager: p.project_manager,
            product_desc: p.description,
            logo: view.logo_url.unwrap_or_default(),
            version: view.latest_version.unwrap_or_default(),
            publish_status: p.publish_status,
            publish_by: p.published_by,
            status: p.lifecycle,
            created_by: p.created_by,
            updated_by: p.updated_by,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageResponse {
    pub id: nova_core::PackageId,
    pub product_id: ProductId,
    pub product_name: String,
    pub version: String,
    pub version_log: Option<String>,
    pub stage: Option<Stage>,
    pub size: u64,
    pub url: String,
    pub publish_status: PublishStatus,
    pub publish_by: Option<UserId>,
    pub status: LifecycleStatus,
    pub created_by: Option<UserId>,
    pub updated_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PackageView> for PackageResponse {
    fn from(view: PackageView) -> Self {
        let p = view.listing.package;
        Self {
            id: p.id,
            product_id: p.product_id,
            product_name: view.listing.product_name,
            version: p.version,
            version_log: p.version_log,
            stage: p.stage,
            size: p.size,
            url: view.download_url,
            publish_status: p.publish_status,
            publish_by: p.published_by,
            status: p.lifecycle,
            created_by: p.created_by,
            updated_by: p.updated_by,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UpgradeResponse {
    pub version: String,
    pub url: String,
}

impl From<UpgradeOffer> for UpgradeResponse {
    fn from(offer: UpgradeOffer) -> Self {
        Self {
            version: offer.version,
            url: offer.url,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceLogResponse {
    pub id: nova_core::DeviceLogId,
    pub device_id: String,
    pub device_name: String,
    pub version: Option<String>,
    pub device_info: String,
    pub device_status: Option<String>,
    pub software_ip: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<DeviceLog> for DeviceLogResponse {
    fn from(log: DeviceLog) -> Self {
        Self {
            id: log.id,
            device_id: log.device_id,
            device_name: log.device_name,
            version: log.version,
            device_info: log.device_info,
            device_status: log.device_status,
            software_ip: log.software_ip,
            created_at: log.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: UserId,
    pub username: String,
    pub name: Option<String>,
    pub code: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub role_ids: Vec<RoleId>,
    pub status: LifecycleStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserAccount> for UserResponse {
    fn from(u: UserAccount) -> Self {
        Self {
            id: u.id,
            username: u.username,
            name: u.name,
            code: u.code,
            phone: u.phone,
            email: u.email,
            role_ids: u.role_ids,
            status: u.lifecycle,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleResponse {
    pub id: RoleId,
    pub name: String,
    pub remark: Option<String>,
    pub acl_ids: Vec<AclId>,
    pub status: LifecycleStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Role> for RoleResponse {
    fn from(r: Role) -> Self {
        Self {
            id: r.id,
            name: r.name,
            remark: r.remark,
            acl_ids: r.acl_ids,
            status: r.lifecycle,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AclResponse {
    pub id: AclId,
    pub parent_id: Option<AclId>,
    pub code: String,
    pub name: String,
    pub remark: Option<String>,
    pub status: LifecycleStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AclEntry> for AclResponse {
    fn from(a: AclEntry) -> Self {
        Self {
            id: a.id,
            parent_id: a.parent_id,
            code: a.code,
            name: a.name,
            remark: a.remark,
            status: a.lifecycle,
            created_at: a.created_at,
            updated_at: a.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub expires_in: i64,
    pub user: UserResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn product_form_splits_compatible_ids() {
        let a = ProductId::new();
        let b = ProductId::new();
        let fit = format!("{a}, {b},");
        let fields = product_fields(&form(&[
            ("name", "Gateway"),
            ("modelId", "GW-01"),
            ("type", "pro_type_01"),
            ("fitPro", &fit),
        ]))
        .unwrap();
        assert_eq!(fields.fit_products, vec![a, b]);
        assert_eq!(fields.kind.as_deref(), Some("pro_type_01"));
        assert_eq!(fields.area, None);
    }

    #[test]
    fn package_form_requires_a_product() {
        let err = package_fields(&form(&[("version", "1.0.0")])).unwrap_err();
        assert_eq!(err, DomainError::validation("productId is required"));

        let id = ProductId::new().to_string();
        let fields = package_fields(&form(&[("productId", &id), ("version", "1.0.0"), ("stage", "11")]))
            .unwrap();
        assert_eq!(fields.stage, Some(Stage::Prototype));

        let err = package_fields(&form(&[("productId", &id), ("stage", "99")])).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn changed_response_mirrors_length() {
        let body = serde_json::to_value(ChangedResponse::new(1)).unwrap();
        assert_eq!(body, serde_json::json!({"changed": 1, "length": 1}));
    }
}
