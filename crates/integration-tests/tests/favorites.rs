//! Integration tests for optimistic favorite toggling.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use serde_json::json;

use agora_core::{FavoriteId, ProductId};
use agora_integration_tests::{MockBackend, MockResponse, product_json};
use agora_storefront::api::{ApiError, Product};
use agora_storefront::favorites::ToggleOutcome;
use agora_storefront::state::AppState;
use agora_storefront::storage::{Storage, keys};

fn product(id: u64) -> Product {
    serde_json::from_value(product_json(id, &format!("Product {id}"), "19.90")).unwrap()
}

fn signed_in(backend: &MockBackend) -> AppState {
    let app = backend.app();
    app.storage().set(keys::TOKEN, "tok").unwrap();
    app
}

#[tokio::test]
async fn test_add_is_visible_before_server_answers() {
    let backend = MockBackend::start().await;
    backend.on(
        "POST",
        "/favorites",
        MockResponse::ok(json!({ "data": { "id": 90 } })).with_delay(Duration::from_millis(300)),
    );
    let app = signed_in(&backend);
    let id = ProductId::new(5);

    let toggle = {
        let app = app.clone();
        tokio::spawn(async move { app.favorites().toggle(product(5)).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;

    let state = app.favorites().state();
    assert!(state.is_favorite(id));
    assert!(state.is_pending(id));
    assert!(state.confirmed().is_empty());
    assert_eq!(state.items()[0].id, id);

    // A second toggle while the first is in flight is dropped
    let again = app.favorites().toggle(product(5)).await.unwrap();
    assert_eq!(again, ToggleOutcome::Ignored);

    assert_eq!(toggle.await.unwrap().unwrap(), ToggleOutcome::Added);

    let state = app.favorites().state();
    assert!(state.is_favorite(id));
    assert!(!state.is_pending(id));
    assert_eq!(state.confirmed()[0].id, Some(FavoriteId::new(90)));
    assert_eq!(backend.requests_to("/favorites").len(), 1);

    let request = &backend.requests_to("/favorites")[0];
    assert_eq!(request.body, Some(json!({ "product_id": 5 })));
    assert_eq!(request.authorization.as_deref(), Some("Bearer tok"));
}

#[tokio::test]
async fn test_already_favorited_counts_as_success() {
    let backend = MockBackend::start().await;
    backend.on(
        "POST",
        "/favorites",
        MockResponse::error(409, "Product already in favorites"),
    );
    let app = signed_in(&backend);

    let outcome = app.favorites().toggle(product(5)).await.unwrap();
    assert_eq!(outcome, ToggleOutcome::Added);

    let state = app.favorites().state();
    assert!(state.is_favorite(ProductId::new(5)));
    assert!(state.error.is_none());
    assert_eq!(state.confirmed()[0].id, None);
}

#[tokio::test]
async fn test_rejected_add_reverts() {
    let backend = MockBackend::start().await;
    backend.on("POST", "/favorites", MockResponse::error(500, "Database error"));
    let app = signed_in(&backend);

    let err = app.favorites().toggle(product(5)).await.unwrap_err();
    assert_eq!(err.status(), Some(500));

    let state = app.favorites().state();
    assert!(!state.is_favorite(ProductId::new(5)));
    assert!(state.pending().is_empty());
    assert!(state.items().is_empty());
    assert_eq!(state.error.as_deref(), Some("Database error"));
}

#[tokio::test]
async fn test_remove_after_load() {
    let backend = MockBackend::start().await;
    backend.on(
        "GET",
        "/favorites",
        MockResponse::ok(json!({
            "data": [
                { "id": 1, "product": product_json(5, "Bag", "20.00") },
                { "id": 2, "product": product_json(6, "Hat", "8.00") },
            ]
        })),
    );
    backend.once("DELETE", "/favorites/5", MockResponse::ok(json!({})));
    backend.on("DELETE", "/favorites/6", MockResponse::error(500, "Nope"));
    let app = signed_in(&backend);

    app.favorites().load().await.unwrap();
    assert_eq!(app.favorites().state().items().len(), 2);

    let outcome = app.favorites().toggle(product(5)).await.unwrap();
    assert_eq!(outcome, ToggleOutcome::Removed);
    let state = app.favorites().state();
    assert!(!state.is_favorite(ProductId::new(5)));
    assert!(state.is_favorite(ProductId::new(6)));

    // A failed removal puts the product back
    assert!(app.favorites().toggle(product(6)).await.is_err());
    let state = app.favorites().state();
    assert!(state.is_favorite(ProductId::new(6)));
    assert_eq!(state.confirmed().len(), 1);
}

#[tokio::test]
async fn test_toggle_without_token_fails_locally() {
    let backend = MockBackend::start().await;
    let app = backend.app();

    let result = app.favorites().toggle(product(5)).await;
    assert!(matches!(result, Err(ApiError::MissingCredentials)));
    assert!(!app.favorites().state().is_favorite(ProductId::new(5)));
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_logout_forgets_favorites() {
    let backend = MockBackend::start().await;
    backend.on(
        "GET",
        "/favorites",
        MockResponse::ok(json!([{ "id": 1, "product": product_json(5, "Bag", "20.00") }])),
    );
    backend.on("POST", "/logout", MockResponse::ok(json!({})));
    let app = signed_in(&backend);

    app.favorites().load().await.unwrap();
    assert!(app.favorites().state().is_favorite(ProductId::new(5)));

    app.logout().await;
    assert!(app.favorites().state().items().is_empty());
}
