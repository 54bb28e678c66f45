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

use freezer_core::{InventoryItemId, MealSetId};

use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_meal_sets).post(create_meal_set))
        .route("/:id", get(get_meal_set))
        .route("/:id/takeout", post(take_out_meal_set))
}

pub async fn list_meal_sets(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ListQuery>,
) -> axum::response::Response {
    match services.freezer.list_meal_sets(&query.filters(), query.page()).await {
        Ok(sets) => Json(json!({
            "items": sets.iter().map(dto::meal_set_summary_to_json).collect::<Vec<_>>(),
        }))
        .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_meal_set(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: MealSetId = match errors::parse_id(&id, "meal set") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.freezer.meal_set_detail(id).await {
        Ok(detail) => Json(dto::meal_set_detail_to_json(&detail)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_meal_set(
    Extension(services): Extension<Arc<AppServices>>,
    body: Bytes,
) -> axum::response::Response {
    let body: dto::CreateMealSetRequest = match dto::parse_body(&body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.freezer.create_meal_set(body.into()).await {
        Ok(set) => (StatusCode::CREATED, Json(dto::meal_set_to_json(&set))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Without `item_ids` (or with an empty list) the FIFO selection is taken out.
pub async fn take_out_meal_set(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Bytes,
) -> axum::response::Response {
    let id: MealSetId = match errors::parse_id(&id, "meal set") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let body: dto::TakeoutRequest = match dto::parse_body(&body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let explicit = body
        .item_ids
        .map(|ids| ids.into_iter().map(InventoryItemId::new).collect::<Vec<_>>());

    match services.freezer.take_out_meal_set(id, explicit).await {
        Ok(taken) => takeout_response(&taken),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub(crate) fn takeout_response(taken: &[InventoryItemId]) -> axum::response::Response {
    Json(json!({
        "ok": true,
        "item_ids": taken.iter().map(|id| id.get()).collect::<Vec<_>>(),
    }))
    .into_response()
}
