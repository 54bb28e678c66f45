use freezer_api::config::AppConfig;
use reqwest::StatusCode;
use serde_json::{json, Value};

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, in-memory store, ephemeral port.
        let app = freezer_api::app::build_app(&AppConfig::default())
            .await
            .expect("failed to build app");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        let res = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .unwrap();
        let status = res.status();
        (status, res.json().await.unwrap())
    }

    async fn send(&self, method: reqwest::Method, path: &str, body: Value) -> (StatusCode, Value) {
        let res = self
            .client
            .request(method, format!("{}{}", self.base_url, path))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = res.status();
        (status, res.json().await.unwrap())
    }

    async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        self.send(reqwest::Method::POST, path, body).await
    }

    async fn patch(&self, path: &str, body: Value) -> (StatusCode, Value) {
        self.send(reqwest::Method::PATCH, path, body).await
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn create_set(srv: &TestServer, name: &str, components: Value) -> i64 {
    let (status, body) = srv
        .post("/api/meal_sets", json!({ "name": name, "components": components }))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_i64().unwrap()
}

async fn stock(srv: &TestServer, set_id: i64, component: &str, frozen_at: &str) -> i64 {
    let (status, body) = srv
        .post(
            "/api/inventory",
            json!({
                "name": format!("{component} portion"),
                "meal_set_id": set_id,
                "component": component,
                "frozen_at": frozen_at,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_i64().unwrap()
}

fn ids(body: &Value, key: &str) -> Vec<i64> {
    body[key]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn health_reports_in_memory_store() {
    let srv = TestServer::spawn().await;

    let (status, body) = srv.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["service"], "freezer-inventory");
    assert_eq!(body["store"]["backend"], "memory");
}

#[tokio::test]
async fn unknown_routes_and_ids_are_not_found() {
    let srv = TestServer::spawn().await;

    let (status, body) = srv.get("/api/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (status, body) = srv.get("/api/meal_sets/42").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (status, _) = srv.get("/api/meal_sets/abc").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn meal_set_takeout_follows_fifo_and_is_all_or_nothing() {
    let srv = TestServer::spawn().await;
    let set_id = create_set(&srv, "Chili", json!([{ "key": "chili", "quantity": 2 }])).await;

    let a = stock(&srv, set_id, "chili", "2024-01-01").await;
    let b = stock(&srv, set_id, "chili", "2024-01-01").await;
    let c = stock(&srv, set_id, "chili", "2024-01-03").await;

    let (status, list) = srv.get("/api/meal_sets").await;
    assert_eq!(status, StatusCode::OK);
    let entry = &list["items"][0];
    assert_eq!(entry["complete_count"], 1);
    assert_eq!(ids(entry, "fifo_ids"), vec![a, b]);

    let (status, body) = srv
        .post(&format!("/api/meal_sets/{set_id}/takeout"), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(ids(&body, "item_ids"), vec![a, b]);

    // Only C remains: a second set cannot be completed and nothing changes.
    let (status, body) = srv
        .post(&format!("/api/meal_sets/{set_id}/takeout"), json!({}))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "no_items_available");
    assert_eq!(body["required"], 2);
    assert_eq!(body["available"], 1);

    let (_, detail) = srv.get(&format!("/api/meal_sets/{set_id}")).await;
    let remaining: Vec<i64> = detail["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["id"].as_i64().unwrap())
        .collect();
    assert_eq!(remaining, vec![c]);
}

#[tokio::test]
async fn explicit_takeout_rejects_foreign_and_spent_items() {
    let srv = TestServer::spawn().await;
    let soup = create_set(&srv, "Soup", json!([{ "key": "soup", "quantity": 1 }])).await;
    let stew = create_set(&srv, "Stew", json!([{ "key": "stew", "quantity": 1 }])).await;
    let soup_item = stock(&srv, soup, "soup", "2024-02-01").await;
    let stew_item = stock(&srv, stew, "stew", "2024-02-01").await;

    let (status, body) = srv
        .post(
            &format!("/api/meal_sets/{soup}/takeout"),
            json!({ "item_ids": [soup_item, stew_item] }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "item_not_in_set");
    assert_eq!(ids(&body, "item_ids"), vec![stew_item]);

    let (status, _) = srv
        .post("/api/inventory/takeout", json!({ "item_ids": [soup_item] }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = srv
        .post(
            "/api/inventory/takeout",
            json!({ "item_ids": [stew_item, soup_item] }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "items_unavailable");

    // The batch failed as a whole: the stew portion is still active.
    let (_, item) = srv.get(&format!("/api/inventory/{stew_item}")).await;
    assert_eq!(item["is_active"], true);
}

#[tokio::test]
async fn inventory_takeout_requires_ids_and_valid_json() {
    let srv = TestServer::spawn().await;

    let (status, body) = srv
        .post("/api/inventory/takeout", json!({ "item_ids": [] }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "no_items_selected");

    let res = srv
        .client
        .post(format!("{}/api/inventory/takeout", srv.base_url))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_json");
}

#[tokio::test]
async fn intake_validates_and_lists_by_view() {
    let srv = TestServer::spawn().await;

    let (status, body) = srv.post("/api/inventory", json!({ "name": "  " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, item) = srv
        .post(
            "/api/inventory",
            json!({ "name": "Peas", "item_type": "INGREDIENT", "frozen_at": "2024-03-01" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(item["best_before_days"], 90);
    assert_eq!(item["best_before"], "2024-05-30");
    assert_eq!(item["computed_best_before"], "2024-05-30");
    assert_eq!(item["storage_type"], "FREE");

    let (_, singles) = srv.get("/api/inventory").await;
    assert!(singles["items"].as_array().unwrap().is_empty());

    let (_, ingredients) = srv.get("/api/inventory?view=ingredient&q=pea").await;
    assert_eq!(ingredients["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn containers_enforce_unique_codes_and_filter_by_active() {
    let srv = TestServer::spawn().await;

    let (status, body) = srv
        .post(
            "/api/container-types",
            json!({ "shape": "RECT", "volume_ml": 750, "material": "GLASS" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let type_id = body["id"].as_i64().unwrap();

    let (status, body) = srv
        .post(
            "/api/containers",
            json!({ "container_code": "B-01", "container_type_id": type_id }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let container_id = body["id"].as_i64().unwrap();

    let (status, body) = srv
        .post("/api/containers", json!({ "container_code": "B-01" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    let (status, body) = srv
        .patch(
            &format!("/api/containers/{container_id}"),
            json!({ "is_active": false }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);

    let (_, active) = srv.get("/api/containers").await;
    assert!(active["items"].as_array().unwrap().is_empty());

    let (_, all) = srv.get("/api/containers?active=all").await;
    assert_eq!(all["items"][0]["container_type"]["volume_ml"], 750);
}

#[tokio::test]
async fn recipes_create_patch_and_search() {
    let srv = TestServer::spawn().await;

    let (status, recipe) = srv
        .post(
            "/api/recipes",
            json!({ "name": "Lentil dal", "is_vegan": true, "kcal_per_portion": 420 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(recipe["ok"], true);
    assert_eq!(recipe["data"]["is_veggie"], true);
    let id = recipe["data"]["id"].as_i64().unwrap();

    let (status, patched) = srv
        .patch(
            &format!("/api/recipes/{id}"),
            json!({ "kcal_per_portion": null, "name": "Red lentil dal" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["ok"], true);
    assert_eq!(patched["data"]["name"], "Red lentil dal");
    assert!(patched["data"]["kcal_per_portion"].is_null());

    let (_, found) = srv.get("/api/recipes?search=LENTIL&vegan=1").await;
    assert_eq!(found["ok"], true);
    assert_eq!(found["data"].as_array().unwrap().len(), 1);

    let (status, _) = srv.get("/api/recipes/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn storage_standards_are_fixed() {
    let srv = TestServer::spawn().await;

    let (status, body) = srv.get("/api/storage-standards").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"], json!(["FREE", "FREEZER_BAG", "VACUUM_BAG"]));
}

#[tokio::test]
async fn oversized_quantities_and_shelf_lives_are_rejected() {
    let srv = TestServer::spawn().await;

    let (status, body) = srv
        .post(
            "/api/meal_sets",
            json!({ "name": "Huge", "components": [{ "key": "x", "quantity": 4000000000u64 }] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(body["error"], "validation_error");

    let (status, body) = srv
        .post(
            "/api/inventory",
            json!({ "name": "Ancient peas", "best_before_days": 4000000000u64 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(body["error"], "validation_error");

    let (status, body) = srv
        .post(
            "/api/recipes",
            json!({ "name": "Forever stew", "default_best_before_days": 4000000000u64 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    // Nothing was stored, so the listings still render.
    let (status, sets) = srv.get("/api/meal_sets").await;
    assert_eq!(status, StatusCode::OK);
    assert!(sets["items"].as_array().unwrap().is_empty());

    let (status, _) = srv.get("/api/inventory?view=meals").await;
    assert_eq!(status, StatusCode::OK);
}
