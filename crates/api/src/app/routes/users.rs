use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
};

use nova_auth::codes;
use nova_core::{ActorContext, UserId};

use crate::app::routes::common::{changed_response, parse_id};
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", get(get_user).put(update_user).delete(delete_user))
        .route("/:id/status", put(set_status))
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Extension(actor): Extension<ActorContext>,
    Query(query): Query<dto::UserListQuery>,
) -> Response {
    if let Err(res) = authz::require(&principal, &codes::USERS_READ) {
        return res;
    }

    match services
        .access
        .list_users(&actor, query.query(), query.page(services.page_size))
        .await
    {
        Ok(page) => Json(dto::PageResponse::from_paged(page, dto::UserResponse::from)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(res) = authz::require(&principal, &codes::USERS_READ) {
        return res;
    }
    let id: UserId = match parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.access.get_user(id).await {
        Ok(user) => Json(dto::UserResponse::from(user)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Extension(actor): Extension<ActorContext>,
    Json(body): Json<dto::CreateUserRequest>,
) -> Response {
    if let Err(res) = authz::require(&principal, &codes::USERS_WRITE) {
        return res;
    }

    match services.access.create_user(&actor, body.into()).await {
        Ok(user) => (StatusCode::CREATED, Json(dto::UserResponse::from(user))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateUserRequest>,
) -> Response {
    if let Err(res) = authz::require(&principal, &codes::USERS_WRITE) {
        return res;
    }
    let id: UserId = match parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.access.update_user(&actor, id, body.into()).await {
        Ok(user) => Json(dto::UserResponse::from(user)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(res) = authz::require(&principal, &codes::USERS_WRITE) {
        return res;
    }
    let id: UserId = match parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    changed_response(services.access.delete_user(&actor, id).await)
}

/// PUT /users/:id/status with `{"status": 0|1}`.
pub async fn set_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::StatusRequest>,
) -> Response {
    if let Err(res) = authz::require(&principal, &codes::USERS_WRITE) {
        return res;
    }
    let id: UserId = match parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    changed_response(services.access.set_user_status(&actor, id, body.status).await)
}
