//! HTTP tests for the table routes against the in-memory dao.

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use common::{body_json, build_test_app, delete, get, post, put, TEST_BODY_LIMIT};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn create_app(app: &Router, name: &str, owner_id: u64) -> Value {
    let res = post(
        app,
        "/apps",
        json!({ "name": name, "slug": name.to_lowercase(), "owner_id": owner_id }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    body_json(res).await
}

async fn assert_error(res: axum::http::Response<axum::body::Body>, message: &str) {
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(res).await, json!({ "code": 400, "message": message }));
}

async fn assert_bad_params(res: axum::http::Response<axum::body::Body>) {
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = body_json(res).await;
    assert_eq!(body["code"], 400);
    assert!(body["message"].as_str().unwrap().starts_with("bad params:"), "{}", body);
}

#[tokio::test]
async fn common_routes_respond() {
    let app = build_test_app();
    let res = get(&app, "/health").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await, json!({ "status": "ok" }));

    let res = get(&app, "/ready").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["database"], "ok");

    let res = get(&app, "/version").await;
    assert_eq!(body_json(res).await["name"], "laravel-crud");
}

#[tokio::test]
async fn create_then_get_returns_the_same_record() {
    let app = build_test_app();
    let created = create_app(&app, "Blog", 7).await;
    assert_eq!(created["id"], 1);
    assert_eq!(created["name"], "Blog");
    assert_eq!(created["is_active"], true);
    assert_eq!(created["description"], Value::Null);
    assert!(created["created_at"].is_string());
    assert!(created["updated_at"].is_string());

    let res = get(&app, "/apps/1").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await, created);
}

#[tokio::test]
async fn create_drops_unknown_fields_and_checks_types() {
    let app = build_test_app();
    let res = post(&app, "/apps", json!({ "name": "A", "slug": "a", "nickname": "x" })).await;
    let row = body_json(res).await;
    assert!(row.get("nickname").is_none());

    let res = post(&app, "/apps", json!({ "name": 5, "slug": "a" })).await;
    assert_error(res, "validation: name must be a valid string").await;

    let res = post(&app, "/apps", json!({ "slug": "a" })).await;
    assert_error(res, "validation: name is required").await;

    let res = post(&app, "/apps", json!(["not", "an", "object"])).await;
    assert_error(res, "bad params: body must be a JSON object").await;
}

#[tokio::test]
async fn list_pages_and_counts_all_rows() {
    let app = build_test_app();
    for name in ["Alpha", "Bravo", "Charlie", "Delta", "Echo"] {
        create_app(&app, name, 1).await;
    }

    let page = body_json(get(&app, "/apps?page=0&pagesize=2").await).await;
    assert_eq!(page["page"], 0);
    assert_eq!(page["page_size"], 2);
    assert_eq!(page["total_records"], 5);
    assert_eq!(page["data"].as_array().unwrap().len(), 2);
    assert_eq!(page["data"][0]["name"], "Alpha");

    let last = body_json(get(&app, "/apps?page=2&pagesize=2").await).await;
    assert_eq!(last["data"].as_array().unwrap().len(), 1);
    assert_eq!(last["data"][0]["name"], "Echo");

    let beyond = body_json(get(&app, "/apps?page=9&pagesize=2").await).await;
    assert_eq!(beyond["data"], json!([]));
    assert_eq!(beyond["total_records"], 5);

    let defaults = body_json(get(&app, "/apps").await).await;
    assert_eq!(defaults["page_size"], 20);
    assert_eq!(defaults["data"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn list_filters_and_orders() {
    let app = build_test_app();
    create_app(&app, "Alpha", 1).await;
    create_app(&app, "Bravo", 2).await;
    create_app(&app, "Charlie", 1).await;

    let page = body_json(get(&app, "/apps?owner_id=1&order=-name&unknown=x").await).await;
    assert_eq!(page["total_records"], 2);
    let names: Vec<&str> = page["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Charlie", "Alpha"]);

    let res = get(&app, "/apps?order=password").await;
    assert_error(res, "bad params: invalid order: password").await;
}

#[tokio::test]
async fn invalid_paging_params_are_rejected() {
    let app = build_test_app();
    for uri in ["/apps?page=-1", "/apps?pagesize=0", "/apps?pagesize=abc", "/apps?page=x"] {
        let res = get(&app, uri).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{}", uri);
        let body = body_json(res).await;
        assert_eq!(body["code"], 400);
        assert!(body["message"].as_str().unwrap().starts_with("bad params:"), "{}", uri);
    }
}

#[tokio::test]
async fn page_size_is_clamped() {
    let app = build_test_app();
    let page = body_json(get(&app, "/apps?pagesize=5000").await).await;
    assert_eq!(page["page_size"], 100);
}

#[tokio::test]
async fn put_replaces_the_whole_record() {
    let app = build_test_app();
    let created = create_app(&app, "Blog", 7).await;
    assert_eq!(created["owner_id"], 7);

    let res = put(
        &app,
        "/apps/1",
        json!({ "id": 99, "name": "Shop", "slug": "shop", "is_active": false }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let updated = body_json(res).await;
    assert_eq!(updated["id"], 1);
    assert_eq!(updated["name"], "Shop");
    assert_eq!(updated["owner_id"], Value::Null);

    let fetched = body_json(get(&app, "/apps/1").await).await;
    assert_eq!(fetched, updated);
    assert_eq!(fetched["is_active"], false);

    let res = put(&app, "/apps/1", json!({ "name": "Shop", "is_active": true })).await;
    assert_error(res, "validation: slug is required").await;

    let res = put(&app, "/apps/42", json!({ "name": "X", "slug": "x", "is_active": true })).await;
    assert_error(res, "record not found").await;
}

#[tokio::test]
async fn delete_then_get_is_not_found() {
    let app = build_test_app();
    create_app(&app, "Blog", 7).await;

    let res = delete(&app, "/apps/1").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await, json!(1));

    assert_error(get(&app, "/apps/1").await, "record not found").await;
    assert_error(delete(&app, "/apps/1").await, "record not found").await;
}

#[tokio::test]
async fn ids_are_parsed_by_key_type() {
    let app = build_test_app();
    assert_error(get(&app, "/apps/abc").await, "bad params: invalid id 'abc'").await;
    assert_error(get(&app, "/apps/-1").await, "bad params: invalid id '-1'").await;

    let res = post(&app, "/cache", json!({ "key": "greeting", "value": "hi", "expiration": 60 })).await;
    assert_eq!(res.status(), StatusCode::OK);
    let row = body_json(get(&app, "/cache/greeting").await).await;
    assert_eq!(row, json!({ "key": "greeting", "value": "hi", "expiration": 60 }));

    let res = post(&app, "/cache", json!({ "value": "hi", "expiration": 60 })).await;
    assert_error(res, "validation: key is required").await;
}

#[tokio::test]
async fn ddl_describes_compiled_in_tables() {
    let app = build_test_app();
    let doc = laravel_crud::builtin_document().unwrap();

    let all = body_json(get(&app, "/ddl").await).await;
    let all = all.as_object().unwrap();
    assert_eq!(all.len(), doc.tables.len());

    let pages = body_json(get(&app, "/ddl/pages").await).await;
    assert_eq!(pages["name"], "pages");
    let columns: Vec<&str> = pages["columns"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    let declared = doc.tables.iter().find(|t| t.name == "pages").unwrap();
    let expected: Vec<&str> = declared.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(columns, expected);

    let id = &pages["columns"][0];
    assert_eq!(id["is_primary_key"], true);
    assert_eq!(id["is_auto_increment"], true);
    assert_eq!(id["column_type"], "uint64");
    assert_eq!(id["database_type_name"], "BIGINT UNSIGNED");
    assert_eq!(pages["columns"][6]["default_value"], "draft");

    assert_error(get(&app, "/ddl/unknown").await, "record not found").await;
}

#[tokio::test]
async fn oversized_body_is_a_json_400() {
    let app = build_test_app();
    let payload = format!(r#"{{"name":"{}","slug":"a"}}"#, "x".repeat(TEST_BODY_LIMIT + 10));
    let req = Request::builder()
        .method("POST")
        .uri("/apps")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CONTENT_LENGTH, payload.len())
        .body(Body::from(payload))
        .unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    assert_bad_params(res).await;

    let res = get(&app, "/apps").await;
    assert_eq!(body_json(res).await["total_records"], 0);
}

#[tokio::test]
async fn undecodable_path_segments_are_json_400s() {
    let app = build_test_app();
    assert_bad_params(get(&app, "/cache/%FF").await).await;
    assert_bad_params(delete(&app, "/cache/%FF").await).await;
    assert_bad_params(get(&app, "/ddl/%FF").await).await;
}

#[tokio::test]
async fn stored_values_take_the_column_form() {
    let app = build_test_app();
    let res = post(
        &app,
        "/apps",
        json!({ "name": "A", "slug": "a", "is_active": 0, "created_at": "2024-05-01T10:00:00Z" }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let created = body_json(res).await;
    assert_eq!(created["is_active"], false);
    assert_eq!(created["created_at"], "2024-05-01 10:00:00");

    let page = body_json(get(&app, "/apps?is_active=0").await).await;
    assert_eq!(page["total_records"], 1);
    let page = body_json(get(&app, "/apps?is_active=false").await).await;
    assert_eq!(page["total_records"], 1);
    let page = body_json(get(&app, "/apps?created_at=2024-05-01T12:00:00%2B02:00").await).await;
    assert_eq!(page["total_records"], 1);

    let res = put(&app, "/apps/1", json!({ "name": "A", "slug": "a", "is_active": 1 })).await;
    assert_eq!(body_json(res).await["is_active"], true);
}

#[tokio::test]
async fn filter_values_must_fit_their_column() {
    let app = build_test_app();
    create_app(&app, "Alpha", 1).await;
    assert_error(get(&app, "/apps?owner_id=x").await, "bad params: invalid value for owner_id: x").await;
    assert_error(get(&app, "/apps?is_active=maybe").await, "bad params: invalid value for is_active: maybe").await;
    let page = body_json(get(&app, "/apps?owner_id=null").await).await;
    assert_eq!(page["total_records"], 0);
}
