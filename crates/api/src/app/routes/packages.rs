use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Multipart, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};

use nova_auth::codes;
use nova_core::{ActorContext, PackageId};
use nova_products::ArtifactRef;

use crate::app::routes::common::{parse_id, read_multipart, run_retire, run_transition};
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz;
use crate::context::PrincipalContext;

/// Multipart part carrying the package binary.
const FILE_FIELD: &str = "package";

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_packages).post(create_package))
        .route(
            "/:id",
            get(get_package).put(update_package).delete(delete_package),
        )
        .route("/:id/:action", post(transition_package))
}

pub async fn list_packages(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<dto::PackageListQuery>,
) -> Response {
    if let Err(res) = authz::require(&principal, &codes::PACKAGES_READ) {
        return res;
    }

    match services
        .catalog
        .list_packages(&query.query(), query.page(services.page_size))
        .await
    {
        Ok(page) => Json(dto::PageResponse::from_paged(page, dto::PackageResponse::from)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_package(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(res) = authz::require(&principal, &codes::PACKAGES_READ) {
        return res;
    }
    let id: PackageId = match parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.catalog.get_package(id).await {
        Ok(view) => Json(dto::PackageResponse::from(view)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_package(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Extension(actor): Extension<ActorContext>,
    multipart: Multipart,
) -> Response {
    if let Err(res) = authz::require(&principal, &codes::PACKAGES_WRITE) {
        return res;
    }
    let (fields, file) = match read_multipart(multipart, FILE_FIELD).await {
        Ok(v) => v,
        Err(res) => return res,
    };
    let fields = match dto::package_fields(&fields) {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.catalog.create_package(&actor, fields, file).await {
        Ok(view) => (StatusCode::CREATED, Json(dto::PackageResponse::from(view))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_package(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Response {
    if let Err(res) = authz::require(&principal, &codes::PACKAGES_WRITE) {
        return res;
    }
    let id: PackageId = match parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    let (fields, file) = match read_multipart(multipart, FILE_FIELD).await {
        Ok(v) => v,
        Err(res) => return res,
    };
    let fields = match dto::package_fields(&fields) {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.catalog.update_package(&actor, id, fields, file).await {
        Ok(view) => Json(dto::PackageResponse::from(view)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_package(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(res) = authz::require(&principal, &codes::PACKAGES_WRITE) {
        return res;
    }
    let id: PackageId = match parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    run_retire(&services.workflow, &actor, ArtifactRef::Package(id)).await
}

/// POST /packages/:id/{tryout,withdraw,publish,obtained}
pub async fn transition_package(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Extension(actor): Extension<ActorContext>,
    Path((id, action)): Path<(String, String)>,
) -> Response {
    if let Err(res) = authz::require(&principal, &codes::PACKAGES_PUBLISH) {
        return res;
    }
    let id: PackageId = match parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    run_transition(&services.workflow, &actor, ArtifactRef::Package(id), &action).await
}
