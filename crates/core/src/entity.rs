//! Entity trait: identity + continuity across state changes.

use crate::lifecycle::LifecycleStatus;

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;

    /// Soft-delete lifecycle of the persisted row.
    fn lifecycle(&self) -> LifecycleStatus;

    fn is_active(&self) -> bool {
        self.lifecycle().is_active()
    }
}
