//! Infrastructure error model.

use thiserror::Error;

use nova_auth::AuthError;
use nova_core::DomainError;

/// Storage adapter failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write (SQLSTATE 23505).
    #[error("duplicate {0}")]
    Duplicate(String),

    /// A persisted value could not be mapped back into the domain.
    #[error("corrupt row: {0}")]
    Corrupt(String),

    /// Connection, pool or query failure.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Blob storage failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BlobError {
    #[error("blob not found: {0}")]
    NotFound(String),

    #[error("invalid blob key: {0}")]
    InvalidKey(String),

    #[error("blob io error: {0}")]
    Io(String),
}

/// Everything a service call can fail with.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Store(StoreError),

    #[error(transparent)]
    Blob(#[from] BlobError),
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            // The storage-level uniqueness backstop surfaces like the fast-path check.
            StoreError::Duplicate(what) => ServiceError::Domain(DomainError::Duplicate(what)),
            other => ServiceError::Store(other),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
