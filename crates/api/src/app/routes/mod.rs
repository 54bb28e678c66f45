use axum::{routing::get, Router};

pub mod container_types;
pub mod containers;
pub mod inventory;
pub mod meal_sets;
pub mod recipes;
pub mod system;

/// Router for everything under `/api`.
pub fn router() -> Router {
    Router::new()
        .route("/storage-standards", get(system::storage_standards))
        .nest("/meal_sets", meal_sets::router())
        .nest("/inventory", inventory::router())
        .nest("/container-types", container_types::router())
        .nest("/containers", containers::router())
        .nest("/recipes", recipes::router())
}
