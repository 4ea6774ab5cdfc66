use std::collections::HashMap;
use std::str::FromStr;

use axum::{
    Json,
    extract::Multipart,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use nova_core::{ActorContext, DomainError};
use nova_infra::{ServiceResult, Upload, WorkflowEngine};
use nova_products::{ArtifactRef, Transition};

use crate::app::{dto, errors};

/// Parse a path id, answering 400 with the parse message on failure.
pub fn parse_id<T>(raw: &str) -> Result<T, Response>
where
    T: FromStr<Err = DomainError>,
{
    raw.parse().map_err(errors::domain_error_to_response)
}

/// Text fields plus the optional file part named `file_field`.
///
/// A file part without a name or content counts as absent.
pub async fn read_multipart(
    mut multipart: Multipart,
    file_field: &str,
) -> Result<(HashMap<String, String>, Option<Upload>), Response> {
    let bad_form = |e: axum::extract::multipart::MultipartError| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_form", e.to_string())
    };

    let mut fields = HashMap::new();
    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(bad_form)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        if name == file_field {
            let file_name = field.file_name().map(str::to_string).unwrap_or_default();
            let content = field.bytes().await.map_err(bad_form)?;
            if !file_name.is_empty() && !content.is_empty() {
                upload = Some(Upload::new(file_name, content));
            }
        } else {
            let value = field.text().await.map_err(bad_form)?;
            fields.insert(name, value);
        }
    }
    Ok((fields, upload))
}

/// Run a publish-workflow action named by the last path segment.
pub async fn run_transition(
    workflow: &WorkflowEngine,
    ctx: &ActorContext,
    target: ArtifactRef,
    action: &str,
) -> Response {
    let transition: Transition = match action.parse() {
        Ok(t) => t,
        Err(_) => return errors::json_error(StatusCode::NOT_FOUND, "not_found", "unknown action"),
    };
    match workflow.transition(ctx, target, transition).await {
        Ok(outcome) if outcome.applied() => {
            (StatusCode::OK, Json(dto::ChangedResponse::new(outcome.changed))).into_response()
        }
        Ok(_) => errors::not_applied(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn run_retire(workflow: &WorkflowEngine, ctx: &ActorContext, target: ArtifactRef) -> Response {
    changed_response(workflow.retire(ctx, target).await.map(|outcome| outcome.changed))
}

/// 200 with the changed count, or 409 when nothing changed.
pub fn changed_response(result: ServiceResult<u64>) -> Response {
    match result {
        Ok(changed) if changed > 0 => {
            (StatusCode::OK, Json(dto::ChangedResponse::new(changed))).into_response()
        }
        Ok(_) => errors::not_applied(),
        Err(e) => errors::service_error_to_response(e),
    }
}
