use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, FromRequest, Query, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use nova_auth::codes;
use nova_products::DeviceReport;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz;
use crate::context::{PrincipalContext, client_addr};

/// POST /devices/report: device check-in, unauthenticated.
pub async fn report(Extension(services): Extension<Arc<AppServices>>, req: Request) -> Response {
    let remote = client_addr(req.headers(), req.extensions());
    let Json(body) = match Json::<DeviceReport>::from_request(req, &()).await {
        Ok(v) => v,
        Err(rejection) => return rejection.into_response(),
    };

    match services.catalog.report_device(body, remote).await {
        Ok(log) => (StatusCode::CREATED, Json(dto::DeviceLogResponse::from(log))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// GET /devices/upgrades?modelId=..&version=..
pub async fn upgrades(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::UpgradeQuery>,
) -> Response {
    match services
        .catalog
        .upgradable_versions(&query.model_id, query.version.as_deref())
        .await
    {
        Ok(offers) => Json(
            offers
                .into_iter()
                .map(dto::UpgradeResponse::from)
                .collect::<Vec<_>>(),
        )
        .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_logs(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<dto::DeviceLogListQuery>,
) -> Response {
    if let Err(res) = authz::require(&principal, &codes::DEVICES_READ) {
        return res;
    }

    match services
        .catalog
        .list_device_logs(&query.query(), query.page(services.page_size))
        .await
    {
        Ok(page) => Json(dto::PageResponse::from_paged(page, dto::DeviceLogResponse::from)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
