//! `nova-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod context;
pub mod entity;
pub mod error;
pub mod id;
pub mod lifecycle;
pub mod page;

pub use context::ActorContext;
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{AclId, DeviceLogId, PackageId, ProductId, RoleId, UserId};
pub use lifecycle::LifecycleStatus;
pub use page::{Page, Paged, DEFAULT_PAGE_SIZE};
