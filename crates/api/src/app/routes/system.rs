use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde_json::json;

use crate::app::errors;
use crate::app::services::AppServices;

/// Liveness plus a store round-trip; 503 when the store is unreachable.
pub async fn health(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    let started = Instant::now();
    let report = services.freezer.health().await;
    let latency_ms = started.elapsed().as_millis() as u64;

    let status = if report.ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "ok": report.ok,
            "service": "freezer-inventory",
            "env": services.app_env,
            "time": Utc::now().to_rfc3339(),
            "store": {
                "ok": report.ok,
                "backend": report.backend,
                "error": report.error,
            },
            "latency_ms": latency_ms,
        })),
    )
        .into_response()
}

pub async fn storage_standards(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let items: Vec<&str> = services
        .freezer
        .storage_standards()
        .iter()
        .map(|s| s.as_str())
        .collect();
    Json(json!({ "ok": true, "items": items })).into_response()
}

pub async fn not_found() -> axum::response::Response {
    errors::json_error(StatusCode::NOT_FOUND, "not_found", "route not found")
}
