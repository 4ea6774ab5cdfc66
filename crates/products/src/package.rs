//! Product packages: one uploaded firmware/software version of a product.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use nova_core::{DomainError, DomainResult, Entity, LifecycleStatus, PackageId, ProductId, UserId};

use crate::publish::PublishStatus;

/// Release stage of a package. Software and hardware use disjoint code ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub enum Stage {
    Development,
    Beta,
    Release,
    Prototype,
    EngineeringSample,
    TrialProduction,
    SalesSample,
    MassProduction,
    Discontinued,
}

impl Stage {
    pub const fn code(self) -> i16 {
        match self {
            Stage::Development => 1,
            Stage::Beta => 2,
            Stage::Release => 3,
            Stage::Prototype => 11,
            Stage::EngineeringSample => 12,
            Stage::TrialProduction => 13,
            Stage::SalesSample => 14,
            Stage::MassProduction => 15,
            Stage::Discontinued => 16,
        }
    }

    pub fn from_code(code: i16) -> Option<Self> {
        let stage = match code {
            1 => Stage::Development,
            2 => Stage::Beta,
            3 => Stage::Release,
            11 => Stage::Prototype,
            12 => Stage::EngineeringSample,
            13 => Stage::TrialProduction,
            14 => Stage::SalesSample,
            15 => Stage::MassProduction,
            16 => Stage::Discontinued,
            _ => return None,
        };
        Some(stage)
    }

    pub fn is_hardware(self) -> bool {
        self.code() > 10
    }
}

impl TryFrom<i16> for Stage {
    type Error = DomainError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        Self::from_code(value).ok_or_else(|| DomainError::validation(format!("unknown stage {value}")))
    }
}

impl From<Stage> for i16 {
    fn from(value: Stage) -> Self {
        value.code()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPackage {
    pub id: PackageId,
    pub product_id: ProductId,
    pub version: String,
    pub version_log: Option<String>,
    pub stage: Option<Stage>,
    /// Size of the uploaded binary in bytes.
    pub size: u64,
    /// Blob key of the uploaded binary.
    pub file_key: String,
    pub publish_status: PublishStatus,
    pub published_by: Option<UserId>,
    pub lifecycle: LifecycleStatus,
    pub created_by: Option<UserId>,
    pub updated_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for ProductPackage {
    type Id = PackageId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn lifecycle(&self) -> LifecycleStatus {
        self.lifecycle
    }
}

/// Editable package attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageFields {
    pub product_id: ProductId,
    pub version: String,
    pub version_log: Option<String>,
    pub stage: Option<Stage>,
}

impl PackageFields {
    pub fn validate(&self) -> DomainResult<()> {
        if self.version.trim().is_empty() {
            return Err(DomainError::validation("version cannot be empty"));
        }
        Ok(())
    }
}

/// Stored binary backing a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageFile {
    pub key: String,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPackage {
    pub id: PackageId,
    pub fields: PackageFields,
    pub file: PackageFile,
    pub created_by: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageChanges {
    pub fields: PackageFields,
    /// `Some` replaces the stored binary.
    pub file: Option<PackageFile>,
    pub updated_by: UserId,
}

/// Filters for package listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageQuery {
    pub product_id: Option<ProductId>,
    pub version: Option<String>,
    pub lifecycle: LifecycleStatus,
    pub stage: Option<Stage>,
    pub publish_status: Option<PublishStatus>,
    pub updated_from: Option<DateTime<Utc>>,
    pub updated_to: Option<DateTime<Utc>>,
}

impl Default for PackageQuery {
    fn default() -> Self {
        Self {
            product_id: None,
            version: None,
            lifecycle: LifecycleStatus::Active,
            stage: None,
            publish_status: None,
            updated_from: None,
            updated_to: None,
        }
    }
}

impl PackageQuery {
    pub fn matches(&self, package: &ProductPackage) -> bool {
        package.lifecycle == self.lifecycle
            && self.product_id.is_none_or(|id| package.product_id == id)
            && self.version.as_deref().is_none_or(|v| package.version == v)
            && self.stage.is_none_or(|s| package.stage == Some(s))
            && self.publish_status.is_none_or(|s| package.publish_status == s)
            && self.updated_from.is_none_or(|from| package.updated_at >= from)
            && self.updated_to.is_none_or(|to| package.updated_at <= to)
    }
}

/// Package row joined with its product's display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageListing {
    pub package: ProductPackage,
    pub product_name: String,
}

/// Versions compare as plain strings; "latest" is the lexicographic maximum.
pub fn is_newer(candidate: &str, than: &str) -> bool {
    candidate > than
}

/// Lexicographically latest version among the active packages given.
pub fn latest_active_version<'a>(
    packages: impl IntoIterator<Item = &'a ProductPackage>,
) -> Option<&'a str> {
    packages
        .into_iter()
        .filter(|p| p.is_active())
        .map(|p| p.version.as_str())
        .max()
}

/// Active packages newer than `current`, newest first.
pub fn upgrades_after<'a>(
    packages: impl IntoIterator<Item = &'a ProductPackage>,
    current: &str,
) -> Vec<&'a ProductPackage> {
    let mut newer: Vec<&ProductPackage> = packages
        .into_iter()
        .filter(|p| p.is_active() && is_newer(&p.version, current))
        .collect();
    newer.sort_by(|a, b| b.version.cmp(&a.version));
    newer
}
