//! Infrastructure layer: stores, blob storage, services and configuration.

pub mod access;
pub mod blob;
pub mod catalog;
pub mod config;
pub mod error;
pub mod store;
pub mod workflow;

pub use access::{AccessService, Session, UserInput, UserUpdate};
pub use catalog::{CatalogService, PackageView, ProductView, UpgradeOffer, Upload};
pub use config::{Config, ConfigError};
pub use error::{BlobError, ServiceError, ServiceResult, StoreError};
pub use workflow::{RetireOutcome, TransitionOutcome, WorkflowEngine};
