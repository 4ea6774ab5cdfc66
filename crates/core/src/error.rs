//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Every variant is a rejected operation, never a crash. The `Display` output is
/// meant to be forwarded verbatim to the end user.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A referenced record does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// The record exists but is not in a state that allows the operation.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The record was already soft-deleted.
    #[error("{0} is already retired")]
    AlreadyRetired(String),

    /// Natural-key collision within the active partition.
    #[error("duplicate {0}")]
    Duplicate(String),

    /// The referenced parent record is missing or not active.
    #[error("parent {0} not found")]
    ParentNotFound(String),

    /// Retirement is blocked by live children.
    #[error("remove packages [{}] before deleting the product", .0.join(", "))]
    HasActiveChildren(Vec<String>),

    /// Authentication failure at the domain boundary.
    #[error("unauthorized")]
    Unauthorized,

    /// The operation is never allowed on this record.
    #[error("forbidden: {0}")]
    Forbidden(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn already_retired(what: impl Into<String>) -> Self {
        Self::AlreadyRetired(what.into())
    }

    pub fn duplicate(what: impl Into<String>) -> Self {
        Self::Duplicate(what.into())
    }

    pub fn parent_not_found(what: impl Into<String>) -> Self {
        Self::ParentNotFound(what.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_active_children_names_blocking_versions() {
        let err = DomainError::HasActiveChildren(vec!["1.0.0".into(), "1.1.0".into()]);
        assert_eq!(
            err.to_string(),
            "remove packages [1.0.0, 1.1.0] before deleting the product"
        );
    }

    #[test]
    fn duplicate_message_names_the_key() {
        assert_eq!(DomainError::duplicate("version").to_string(), "duplicate version");
    }
}
