use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new().route("/", get(list_container_types).post(create_container_type))
}

pub async fn list_container_types(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.freezer.list_container_types().await {
        Ok(types) => Json(json!({
            "ok": true,
            "items": types.iter().map(dto::container_type_to_json).collect::<Vec<_>>(),
        }))
        .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_container_type(
    Extension(services): Extension<Arc<AppServices>>,
    body: Bytes,
) -> axum::response::Response {
    let body: dto::CreateContainerTypeRequest = match dto::parse_body(&body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.freezer.create_container_type(body.into()).await {
        Ok(created) => (
            StatusCode::CREATED,
            Json(json!({ "ok": true, "id": created.id.get() })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
