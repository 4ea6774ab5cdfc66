use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Multipart, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};

use nova_auth::codes;
use nova_core::{ActorContext, ProductId};
use nova_products::ArtifactRef;

use crate::app::routes::common::{parse_id, read_multipart, run_retire, run_transition};
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/all", get(all_products))
        .route(
            "/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/:id/:action", post(transition_product))
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<dto::ProductListQuery>,
) -> Response {
    if let Err(res) = authz::require(&principal, &codes::PRODUCTS_READ) {
        return res;
    }

    match services
        .catalog
        .list_products(&query.query(), query.page(services.page_size))
        .await
    {
        Ok(page) => Json(dto::PageResponse::from_paged(page, dto::ProductResponse::from)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn all_products(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(res) = authz::require(&principal, &codes::PRODUCTS_READ) {
        return res;
    }

    match services.catalog.all_products().await {
        Ok(rows) => Json(
            rows.into_iter()
                .map(dto::ProductSummaryResponse::from)
                .collect::<Vec<_>>(),
        )
        .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(res) = authz::require(&principal, &codes::PRODUCTS_READ) {
        return res;
    }
    let id: ProductId = match parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.catalog.get_product(id).await {
        Ok(view) => Json(dto::ProductResponse::from(view)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Extension(actor): Extension<ActorContext>,
    multipart: Multipart,
) -> Response {
    if let Err(res) = authz::require(&principal, &codes::PRODUCTS_WRITE) {
        return res;
    }
    let (fields, logo) = match read_multipart(multipart, "logo").await {
        Ok(v) => v,
        Err(res) => return res,
    };
    let fields = match dto::product_fields(&fields) {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.catalog.create_product(&actor, fields, logo).await {
        Ok(view) => (StatusCode::CREATED, Json(dto::ProductResponse::from(view))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Response {
    if let Err(res) = authz::require(&principal, &codes::PRODUCTS_WRITE) {
        return res;
    }
    let id: ProductId = match parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    let (fields, logo) = match read_multipart(multipart, "logo").await {
        Ok(v) => v,
        Err(res) => return res,
    };
    let fields = match dto::product_fields(&fields) {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.catalog.update_product(&actor, id, fields, logo).await {
        Ok(view) => Json(dto::ProductResponse::from(view)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(res) = authz::require(&principal, &codes::PRODUCTS_WRITE) {
        return res;
    }
    let id: ProductId = match parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    run_retire(&services.workflow, &actor, ArtifactRef::Product(id)).await
}

/// POST /products/:id/{tryout,withdraw,publish,obtained}
pub async fn transition_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Extension(actor): Extension<ActorContext>,
    Path((id, action)): Path<(String, String)>,
) -> Response {
    if let Err(res) = authz::require(&principal, &codes::PRODUCTS_PUBLISH) {
        return res;
    }
    let id: ProductId = match parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    run_transition(&services.workflow, &actor, ArtifactRef::Product(id), &action).await
}
