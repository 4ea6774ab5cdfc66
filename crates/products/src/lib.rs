//! Product catalog domain: products, packages, the publish workflow table, and
//! device check-in logs.
//!
//! Pure domain logic (no IO, no HTTP, no storage).

pub mod device_log;
pub mod package;
pub mod product;
pub mod publish;

pub use device_log::{DeviceLog, DeviceLogQuery, DeviceReport, NewDeviceLog};
pub use package::{
    NewPackage, PackageChanges, PackageFields, PackageFile, PackageListing, PackageQuery,
    ProductPackage, Stage, is_newer, latest_active_version, upgrades_after,
};
pub use product::{NewProduct, Product, ProductChanges, ProductFields, ProductQuery, ProductSummary};
pub use publish::{ArtifactKind, ArtifactRef, PublishStatus, Transition};
