//! Shared helpers for API integration tests: an in-process router over the
//! in-memory store, driven with `tower::ServiceExt::oneshot` — no port, no
//! external database.
#![allow(dead_code)] // not every test binary uses every helper

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use grimoire_api::auth::StaticTokenVerifier;
use grimoire_api::{app, AppState};
use grimoire_db::Database;

pub const ALICE_TOKEN: &str = "test-token-alice";
pub const BOB_TOKEN: &str = "test-token-bob";

pub struct TestApp {
    pub router: axum::Router,
    pub db: Database,
    pub alice: Uuid,
    pub bob: Uuid,
}

pub fn test_app() -> TestApp {
    let db = Database::in_memory();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let verifier = StaticTokenVerifier::new()
        .with_token(ALICE_TOKEN, alice)
        .with_token(BOB_TOKEN, bob);
    let state = AppState::new(db.clone(), Arc::new(verifier));

    TestApp {
        router: app(state),
        db,
        alice,
        bob,
    }
}

/// Send one request through the router and decode the JSON body (Null for
/// empty bodies such as 204 responses).
pub async fn send(
    router: &axum::Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .expect("request builds"),
        None => builder.body(Body::empty()).expect("request builds"),
    };

    let response = router.clone().oneshot(request).await.expect("router runs");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body reads");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("body is JSON")
    };

    (status, value)
}

/// Shorthand for an authorized request as Alice.
pub async fn as_alice(
    router: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    send(router, method, uri, Some(ALICE_TOKEN), body).await
}
