//! Tag and folder CRUD: validation, duplicate names, 404 fall-throughs,
//! and owner-scoped listings.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{as_alice, send, test_app, BOB_TOKEN};

#[tokio::test]
async fn test_folder_crud_happy_path() {
    let app = test_app();

    let (status, folder) = as_alice(
        &app.router,
        "POST",
        "/api/v1/folders",
        Some(json!({"name": "recipes"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(folder["name"], "recipes");
    assert!(folder["noteIds"].as_array().unwrap().is_empty());

    let id = folder["id"].as_str().unwrap();
    let (status, fetched) = as_alice(&app.router, "GET", &format!("/api/v1/folders/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["id"], folder["id"]);

    let (status, renamed) = as_alice(
        &app.router,
        "PUT",
        &format!("/api/v1/folders/{id}"),
        Some(json!({"name": "cookbook"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renamed["name"], "cookbook");

    let (status, _) = as_alice(&app.router, "DELETE", &format!("/api/v1/folders/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_folder_create_without_name_is_400() {
    let app = test_app();

    let (status, body) = as_alice(&app.router, "POST", "/api/v1/folders", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing `name` in request body");

    let (status, _) = as_alice(
        &app.router,
        "POST",
        "/api/v1/folders",
        Some(json!({"name": "   "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_duplicate_folder_name_is_400_per_owner() {
    let app = test_app();

    as_alice(
        &app.router,
        "POST",
        "/api/v1/folders",
        Some(json!({"name": "inbox"})),
    )
    .await;

    let (status, body) = as_alice(
        &app.router,
        "POST",
        "/api/v1/folders",
        Some(json!({"name": "inbox"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("already exists"));

    // Bob is a different namespace.
    let (status, _) = send(
        &app.router,
        "POST",
        "/api/v1/folders",
        Some(BOB_TOKEN),
        Some(json!({"name": "inbox"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_rename_onto_taken_name_is_400() {
    let app = test_app();

    as_alice(
        &app.router,
        "POST",
        "/api/v1/tags",
        Some(json!({"name": "a"})),
    )
    .await;
    let (_, tag_b) = as_alice(
        &app.router,
        "POST",
        "/api/v1/tags",
        Some(json!({"name": "b"})),
    )
    .await;

    let (status, _) = as_alice(
        &app.router,
        "PUT",
        &format!("/api/v1/tags/{}", tag_b["id"].as_str().unwrap()),
        Some(json!({"name": "a"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_tag_listing_is_owner_scoped_and_name_ordered() {
    let app = test_app();

    for name in ["zeta", "alpha", "midway"] {
        as_alice(
            &app.router,
            "POST",
            "/api/v1/tags",
            Some(json!({"name": name})),
        )
        .await;
    }
    send(
        &app.router,
        "POST",
        "/api/v1/tags",
        Some(BOB_TOKEN),
        Some(json!({"name": "bobs-only"})),
    )
    .await;

    let (_, tags) = as_alice(&app.router, "GET", "/api/v1/tags", None).await;
    let names: Vec<&str> = tags
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["alpha", "midway", "zeta"]);
}

#[tokio::test]
async fn test_tag_operations_on_missing_or_malformed_ids() {
    let app = test_app();

    let (status, _) = as_alice(&app.router, "GET", "/api/v1/tags/garbage", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = as_alice(
        &app.router,
        "GET",
        "/api/v1/tags/0191a0b0-0000-7000-8000-000000000001",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = as_alice(
        &app.router,
        "DELETE",
        "/api/v1/tags/0191a0b0-0000-7000-8000-000000000001",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cross_owner_tag_access_is_404() {
    let app = test_app();

    let (_, tag) = as_alice(
        &app.router,
        "POST",
        "/api/v1/tags",
        Some(json!({"name": "private"})),
    )
    .await;
    let uri = format!("/api/v1/tags/{}", tag["id"].as_str().unwrap());

    let (status, _) = send(&app.router, "GET", &uri, Some(BOB_TOKEN), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app.router,
        "PUT",
        &uri,
        Some(BOB_TOKEN),
        Some(json!({"name": "stolen"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
