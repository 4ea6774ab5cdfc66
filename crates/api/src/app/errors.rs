use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use nova_auth::AuthError;
use nova_core::DomainError;
use nova_infra::{BlobError, ServiceError, StoreError};

/// Message for a guarded update that matched no row.
pub const NOT_FOUND_OR_INVALID_STATE: &str = "not found or invalid state";

pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    match err {
        ServiceError::Domain(e) => domain_error_to_response(e),
        ServiceError::Auth(e) => match e {
            AuthError::InvalidCredentials => {
                json_error(StatusCode::UNAUTHORIZED, "invalid_credentials", e.to_string())
            }
            AuthError::AccountDisabled => {
                json_error(StatusCode::FORBIDDEN, "account_disabled", e.to_string())
            }
            AuthError::WeakPassword => {
                json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string())
            }
            AuthError::Token(_) => json_error(StatusCode::UNAUTHORIZED, "unauthorized", e.to_string()),
            AuthError::Hashing(_) => internal("auth_error", &e),
        },
        ServiceError::Store(e) => match e {
            // Duplicates are mapped to `Domain` before they get here.
            StoreError::Duplicate(_) => json_error(StatusCode::CONFLICT, "duplicate", e.to_string()),
            StoreError::Corrupt(_) | StoreError::Backend(_) => internal("store_error", &e),
        },
        ServiceError::Blob(e) => match e {
            BlobError::NotFound(_) => json_error(StatusCode::NOT_FOUND, "not_found", e.to_string()),
            BlobError::InvalidKey(_) => json_error(StatusCode::BAD_REQUEST, "invalid_key", e.to_string()),
            BlobError::Io(_) => internal("blob_error", &e),
        },
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    let msg = err.to_string();
    match err {
        DomainError::Validation(_) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidId(_) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::NotFound(_) => json_error(StatusCode::NOT_FOUND, "not_found", msg),
        DomainError::InvalidState(_) => json_error(StatusCode::CONFLICT, "invalid_state", msg),
        DomainError::AlreadyRetired(_) => json_error(StatusCode::CONFLICT, "already_retired", msg),
        DomainError::Duplicate(_) => json_error(StatusCode::CONFLICT, "duplicate", msg),
        DomainError::ParentNotFound(_) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "parent_not_found", msg)
        }
        DomainError::HasActiveChildren(_) => {
            json_error(StatusCode::CONFLICT, "has_active_children", msg)
        }
        DomainError::Unauthorized => json_error(StatusCode::UNAUTHORIZED, "unauthorized", msg),
        DomainError::Forbidden(_) => json_error(StatusCode::FORBIDDEN, "forbidden", msg),
    }
}

/// A transition or retirement that changed no row.
pub fn not_applied() -> axum::response::Response {
    json_error(
        StatusCode::CONFLICT,
        "not_found_or_invalid_state",
        NOT_FOUND_OR_INVALID_STATE,
    )
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "msg": message.into(),
        })),
    )
        .into_response()
}

fn internal(code: &'static str, err: &dyn std::error::Error) -> axum::response::Response {
    tracing::error!(error = %err, "request failed");
    json_error(StatusCode::INTERNAL_SERVER_ERROR, code, "internal error")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_client_statuses() {
        let cases = [
            (DomainError::validation("x"), StatusCode::BAD_REQUEST),
            (DomainError::not_found("product"), StatusCode::NOT_FOUND),
            (DomainError::duplicate("version"), StatusCode::CONFLICT),
            (DomainError::parent_not_found("product"), StatusCode::UNPROCESSABLE_ENTITY),
            (DomainError::HasActiveChildren(vec!["1.0".into()]), StatusCode::CONFLICT),
            (DomainError::forbidden("x"), StatusCode::FORBIDDEN),
        ];
        for (err, status) in cases {
            assert_eq!(domain_error_to_response(err).status(), status);
        }
    }

    #[test]
    fn backend_failures_are_internal() {
        let res = service_error_to_response(ServiceError::Store(StoreError::Backend("down".into())));
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
