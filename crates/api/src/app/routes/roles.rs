use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
};

use nova_auth::codes;
use nova_core::{ActorContext, RoleId};

use crate::app::routes::common::{changed_response, parse_id};
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_roles).post(create_role))
        .route("/:id", get(get_role).put(update_role).delete(delete_role))
        .route("/:id/users", put(set_users))
        .route("/:id/acls", put(set_acls))
}

pub async fn list_roles(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(res) = authz::require(&principal, &codes::ROLES_READ) {
        return res;
    }

    match services.access.list_roles().await {
        Ok(roles) => Json(
            roles
                .into_iter()
                .map(dto::RoleResponse::from)
                .collect::<Vec<_>>(),
        )
        .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(res) = authz::require(&principal, &codes::ROLES_READ) {
        return res;
    }
    let id: RoleId = match parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.access.get_role(id).await {
        Ok(role) => Json(dto::RoleResponse::from(role)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Extension(actor): Extension<ActorContext>,
    Json(body): Json<dto::RoleRequest>,
) -> Response {
    if let Err(res) = authz::require(&principal, &codes::ROLES_WRITE) {
        return res;
    }

    match services.access.create_role(&actor, body.into()).await {
        Ok(role) => (StatusCode::CREATED, Json(dto::RoleResponse::from(role))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::RoleRequest>,
) -> Response {
    if let Err(res) = authz::require(&principal, &codes::ROLES_WRITE) {
        return res;
    }
    let id: RoleId = match parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.access.update_role(&actor, id, body.into()).await {
        Ok(role) => Json(dto::RoleResponse::from(role)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(res) = authz::require(&principal, &codes::ROLES_WRITE) {
        return res;
    }
    let id: RoleId = match parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    changed_response(services.access.delete_role(&actor, id).await)
}

/// PUT /roles/:id/users replaces the member list.
pub async fn set_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::RoleUsersRequest>,
) -> Response {
    if let Err(res) = authz::require(&principal, &codes::ROLES_WRITE) {
        return res;
    }
    let id: RoleId = match parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.access.set_role_users(&actor, id, body.user_ids).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// PUT /roles/:id/acls replaces the granted ACL entries.
pub async fn set_acls(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::RoleAclsRequest>,
) -> Response {
    if let Err(res) = authz::require(&principal, &codes::ROLES_WRITE) {
        return res;
    }
    let id: RoleId = match parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.access.set_role_acls(&actor, id, body.acl_ids).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
