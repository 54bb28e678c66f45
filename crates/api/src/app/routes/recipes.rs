use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;

use freezer_core::RecipeId;
use freezer_inventory::Recipe;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_recipes).post(create_recipe))
        .route("/:id", get(get_recipe).patch(update_recipe))
}

/// Query parameters: `q` (or `search`), `type`, `veggie`, `vegan`,
/// `sort=name|updated|created|kcal`, `limit`, `offset`.
pub async fn list_recipes(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::RecipeListQuery>,
) -> axum::response::Response {
    match services.freezer.list_recipes(&query.to_query()).await {
        Ok(recipes) => Json(json!({
            "ok": true,
            "data": recipes.iter().map(dto::recipe_to_json).collect::<Vec<_>>(),
        }))
        .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_recipe(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: RecipeId = match errors::parse_id(&id, "recipe") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.freezer.get_recipe(id).await {
        Ok(recipe) => recipe_response(StatusCode::OK, &recipe),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_recipe(
    Extension(services): Extension<Arc<AppServices>>,
    body: Bytes,
) -> axum::response::Response {
    let body: dto::CreateRecipeRequest = match dto::parse_body(&body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.freezer.create_recipe(body.into()).await {
        Ok(recipe) => recipe_response(StatusCode::CREATED, &recipe),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_recipe(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Bytes,
) -> axum::response::Response {
    let id: RecipeId = match errors::parse_id(&id, "recipe") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let body: dto::PatchRecipeRequest = match dto::parse_body(&body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.freezer.update_recipe(id, body.into()).await {
        Ok(recipe) => recipe_response(StatusCode::OK, &recipe),
        Err(e) => errors::service_error_to_response(e),
    }
}

fn recipe_response(status: StatusCode, recipe: &Recipe) -> axum::response::Response {
    (
        status,
        Json(json!({ "ok": true, "data": dto::recipe_to_json(recipe) })),
    )
        .into_response()
}
