use std::str::FromStr;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use freezer_core::InventoryItemId;
use freezer_infra::ServiceError;

pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    match err {
        ServiceError::NotFound(resource) => {
            json_error(StatusCode::NOT_FOUND, "not_found", format!("{resource} not found"))
        }
        ServiceError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        ServiceError::InvariantViolation(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", msg)
        }
        ServiceError::NoItemsAvailable(e) => json_error_with(
            StatusCode::UNPROCESSABLE_ENTITY,
            "no_items_available",
            e.to_string(),
            json!({
                "component": e.component,
                "required": e.required,
                "available": e.available,
            }),
        ),
        ServiceError::NoItemsSelected => json_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "no_items_selected",
            "item_ids must name at least one item",
        ),
        ServiceError::ItemsUnavailable(ids) => json_error_with(
            StatusCode::UNPROCESSABLE_ENTITY,
            "items_unavailable",
            "some items do not exist or were already taken out",
            json!({ "item_ids": ids_to_json(&ids) }),
        ),
        ServiceError::ItemNotInSet(ids) => json_error_with(
            StatusCode::UNPROCESSABLE_ENTITY,
            "item_not_in_set",
            "some items do not belong to this meal set",
            json!({ "item_ids": ids_to_json(&ids) }),
        ),
        ServiceError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        ServiceError::Store(e) => {
            tracing::error!(error = %e, "store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string())
        }
    }
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
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Like [`json_error`], with extra fields merged into the body.
pub fn json_error_with(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
    details: serde_json::Value,
) -> axum::response::Response {
    let mut body = json!({
        "error": code,
        "message": message.into(),
    });
    if let (Some(body), serde_json::Value::Object(extra)) = (body.as_object_mut(), details) {
        body.extend(extra);
    }
    (status, axum::Json(body)).into_response()
}

pub fn invalid_json(message: impl Into<String>) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_json", message)
}

/// Path ids that are not positive integers never match a record.
pub fn parse_id<T: FromStr>(raw: &str, resource: &'static str) -> Result<T, axum::response::Response> {
    raw.parse()
        .map_err(|_| json_error(StatusCode::NOT_FOUND, "not_found", format!("{resource} not found")))
}

fn ids_to_json(ids: &[InventoryItemId]) -> Vec<i64> {
    ids.iter().map(|id| id.get()).collect()
}
