use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};

use nova_auth::codes;
use nova_core::{AclId, ActorContext};

use crate::app::routes::common::{changed_response, parse_id};
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_acls).post(create_acl))
        .route("/:id", get(get_acl).put(update_acl).delete(delete_acl))
}

pub async fn list_acls(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(res) = authz::require(&principal, &codes::ACLS_READ) {
        return res;
    }

    match services.access.list_acls().await {
        Ok(acls) => Json(
            acls.into_iter()
                .map(dto::AclResponse::from)
                .collect::<Vec<_>>(),
        )
        .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_acl(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(res) = authz::require(&principal, &codes::ACLS_READ) {
        return res;
    }
    let id: AclId = match parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.access.get_acl(id).await {
        Ok(acl) => Json(dto::AclResponse::from(acl)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_acl(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Extension(actor): Extension<ActorContext>,
    Json(body): Json<dto::AclRequest>,
) -> Response {
    if let Err(res) = authz::require(&principal, &codes::ACLS_WRITE) {
        return res;
    }

    match services.access.create_acl(&actor, body.into()).await {
        Ok(acl) => (StatusCode::CREATED, Json(dto::AclResponse::from(acl))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_acl(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::AclRequest>,
) -> Response {
    if let Err(res) = authz::require(&principal, &codes::ACLS_WRITE) {
        return res;
    }
    let id: AclId = match parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.access.update_acl(&actor, id, body.into()).await {
        Ok(acl) => Json(dto::AclResponse::from(acl)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_acl(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(res) = authz::require(&principal, &codes::ACLS_WRITE) {
        return res;
    }
    let id: AclId = match parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    changed_response(services.access.delete_acl(&actor, id).await)
}
