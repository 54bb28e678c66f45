use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use freezer_core::InventoryItemId;

use crate::app::routes::meal_sets::takeout_response;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_items).post(create_item))
        .route("/takeout", post(take_out_items))
        .route("/:id", get(get_item))
}

/// `?view=meals|single|ingredient` plus the shared list filters.
pub async fn list_items(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ListQuery>,
) -> axum::response::Response {
    let view = query.view();
    match services
        .freezer
        .list_items(view, &query.filters(), query.page())
        .await
    {
        Ok(items) => Json(json!({
            "view": view.item_type().as_str(),
            "items": items.iter().map(dto::item_to_json).collect::<Vec<_>>(),
        }))
        .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: InventoryItemId = match errors::parse_id(&id, "item") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.freezer.get_item(id).await {
        Ok(item) => Json(dto::item_to_json(&item)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_item(
    Extension(services): Extension<Arc<AppServices>>,
    body: Bytes,
) -> axum::response::Response {
    let body: dto::CreateItemRequest = match dto::parse_body(&body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.freezer.create_item(body.into()).await {
        Ok(item) => (StatusCode::CREATED, Json(dto::item_to_json(&item))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn take_out_items(
    Extension(services): Extension<Arc<AppServices>>,
    body: Bytes,
) -> axum::response::Response {
    let body: dto::TakeoutRequest = match dto::parse_body(&body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let ids = body
        .item_ids
        .unwrap_or_default()
        .into_iter()
        .map(InventoryItemId::new)
        .collect();

    match services.freezer.take_out_items(ids).await {
        Ok(taken) => takeout_response(&taken),
        Err(e) => errors::service_error_to_response(e),
    }
}
