//! API-side authorization guard.
//!
//! Every protected handler checks one ACL permission code before touching a
//! service. Services and domain crates stay authorization-agnostic.

use axum::http::StatusCode;
use axum::response::Response;

use nova_auth::{Permission, authorize};

use crate::app::errors;
use crate::context::PrincipalContext;

/// Reject the request with 403 unless the principal holds `permission`.
pub fn require(principal: &PrincipalContext, permission: &Permission) -> Result<(), Response> {
    authorize(principal.principal(), permission).map_err(|e| {
        tracing::debug!(
            user = %principal.user_id(),
            permission = %permission,
            "permission denied"
        );
        errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string())
    })
}
