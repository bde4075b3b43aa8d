//! Integration tests for the HTTP layer's error taxonomy.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use agora_integration_tests::{MockBackend, MockResponse};
use agora_storefront::api::ApiError;
use agora_storefront::config::StorefrontConfig;
use agora_storefront::state::AppState;
use agora_storefront::storage::{MemoryStorage, Storage, keys};

fn signed_in(backend: &MockBackend) -> AppState {
    let app = backend.app();
    app.storage().set(keys::TOKEN, "tok").unwrap();
    app
}

#[tokio::test]
async fn test_missing_token_fails_before_network() {
    let backend = MockBackend::start().await;
    let app = backend.app();

    assert!(matches!(
        app.account().orders().await,
        Err(ApiError::MissingCredentials)
    ));
    assert!(backend.requests().is_empty());

    // A blank token counts as missing
    app.storage().set(keys::TOKEN, "").unwrap();
    assert!(matches!(
        app.account().profile().await,
        Err(ApiError::MissingCredentials)
    ));
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_server_message_is_surfaced() {
    let backend = MockBackend::start().await;
    backend.on(
        "GET",
        "/profile",
        MockResponse::error(401, "Unauthenticated."),
    );
    let app = signed_in(&backend);

    let err = app.account().profile().await.unwrap_err();
    assert!(matches!(err, ApiError::Http { status: 401, .. }));
    assert_eq!(err.to_string(), "Unauthenticated.");
}

#[tokio::test]
async fn test_validation_errors_use_first_field_message() {
    let backend = MockBackend::start().await;
    backend.on(
        "PUT",
        "/change-password",
        MockResponse::json(
            422,
            json!({ "errors": { "password": ["The password must be at least 8 characters."] } }),
        ),
    );
    let app = signed_in(&backend);

    let form = agora_storefront::api::PasswordChange {
        current_password: "old".to_string().into(),
        password: "short".to_string().into(),
        password_confirmation: "short".to_string().into(),
    };
    let err = app.account().change_password(&form).await.unwrap_err();
    assert_eq!(err.status(), Some(422));
    assert_eq!(
        err.to_string(),
        "The password must be at least 8 characters."
    );

    let body = backend.requests_to("/change-password")[0].body.clone().unwrap();
    assert_eq!(body["current_password"], "old");
    assert_eq!(body["password_confirmation"], "short");
}

#[tokio::test]
async fn test_error_without_message_falls_back_to_status() {
    let backend = MockBackend::start().await;
    backend.on(
        "GET",
        "/user/orders",
        MockResponse::raw(502, "<html>Bad gateway</html>"),
    );
    let app = signed_in(&backend);

    let err = app.account().orders().await.unwrap_err();
    assert_eq!(err.status(), Some(502));
    assert_eq!(err.to_string(), "HTTP error 502");
}

#[tokio::test]
async fn test_malformed_success_body_is_invalid_response() {
    let backend = MockBackend::start().await;
    backend.on("GET", "/profile", MockResponse::raw(200, "not json"));
    backend.on(
        "GET",
        "/user/orders",
        MockResponse::ok(json!({ "data": { "unexpected": true } })),
    );
    let app = signed_in(&backend);

    assert!(matches!(
        app.account().profile().await,
        Err(ApiError::InvalidResponse(_))
    ));
    assert!(matches!(
        app.account().orders().await,
        Err(ApiError::InvalidResponse(_))
    ));
}

#[tokio::test]
async fn test_empty_success_body_is_accepted() {
    let backend = MockBackend::start().await;
    backend.on("POST", "/logout", MockResponse::raw(204, ""));
    let app = signed_in(&backend);

    app.api().logout().await.unwrap();
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    let backend = MockBackend::start().await;
    let url = backend.url();
    drop(backend);
    // Give the aborted server task a moment to release the listener
    tokio::time::sleep(Duration::from_millis(50)).await;

    let app = AppState::new(StorefrontConfig::new(url), Arc::new(MemoryStorage::new())).unwrap();
    let result = app.catalog().main_categories(None).await;
    assert!(matches!(result, Err(ApiError::Transport(_))));
}
