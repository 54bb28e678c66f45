use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
    Json, Router,
};
use serde_json::json;

use freezer_core::ContainerId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_containers).post(create_container))
        .route("/:id", patch(update_container))
}

pub async fn list_containers(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ContainerQuery>,
) -> axum::response::Response {
    match services.freezer.list_containers(query.active()).await {
        Ok(containers) => Json(json!({
            "ok": true,
            "items": containers.iter().map(dto::container_to_json).collect::<Vec<_>>(),
        }))
        .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_container(
    Extension(services): Extension<Arc<AppServices>>,
    body: Bytes,
) -> axum::response::Response {
    let body: dto::CreateContainerRequest = match dto::parse_body(&body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.freezer.create_container(body.into()).await {
        Ok(container) => (
            StatusCode::CREATED,
            Json(json!({ "ok": true, "id": container.id.get() })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_container(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Bytes,
) -> axum::response::Response {
    let id: ContainerId = match errors::parse_id(&id, "container") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let body: dto::PatchContainerRequest = match dto::parse_body(&body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.freezer.update_container(id, body.into()).await {
        Ok(_) => Json(json!({ "ok": true })).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
