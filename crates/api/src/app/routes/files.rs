use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::header,
    response::{IntoResponse, Response},
};

use crate::app::errors;
use crate::app::services::AppServices;

/// GET /files/*key: raw bytes of a stored logo or package file.
pub async fn download(
    Extension(services): Extension<Arc<AppServices>>,
    Path(key): Path<String>,
) -> Response {
    match services.catalog.open_file(&key).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, "application/octet-stream")], bytes).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
