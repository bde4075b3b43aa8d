//! Integration tests for account management and cached category listings.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use serde_json::json;

use agora_core::{CategoryId, OrderId};
use agora_integration_tests::{MockBackend, MockResponse, user_json};
use agora_storefront::api::{ProfileUpdate, User};
use agora_storefront::storage::{self, MemoryStorage, Storage, keys};

fn stored_session() -> Arc<MemoryStorage> {
    let storage = Arc::new(MemoryStorage::new());
    let user: User = serde_json::from_value(user_json(7, "Ana", "ana@example.com")).unwrap();
    storage::write_json(storage.as_ref(), keys::USER, &user).unwrap();
    storage.set(keys::TOKEN, "tok").unwrap();
    storage
}

// ============================================================================
// Account
// ============================================================================

#[tokio::test]
async fn test_profile_refreshes_session_and_storage() {
    let backend = MockBackend::start().await;
    backend.on(
        "GET",
        "/profile",
        MockResponse::ok(json!({ "data": user_json(7, "Ana Maria", "ana@example.com") })),
    );
    let storage = stored_session();
    let app = backend.app_with(backend.config(), storage.clone());
    app.start();

    let user = app.account().profile().await.unwrap();
    assert_eq!(user.name, "Ana Maria");
    assert_eq!(app.session().state().user().unwrap().name, "Ana Maria");

    let stored: User = storage::read_json(storage.as_ref(), keys::USER)
        .unwrap()
        .unwrap();
    assert_eq!(stored.name, "Ana Maria");
}

#[tokio::test]
async fn test_update_without_echo_refetches_profile() {
    let backend = MockBackend::start().await;
    backend.on(
        "PUT",
        "/edit-profile",
        MockResponse::ok(json!({ "message": "Profile updated" })),
    );
    backend.on(
        "GET",
        "/profile",
        MockResponse::ok(user_json(7, "Ana", "ana@example.com")),
    );
    let app = backend.app_with(backend.config(), stored_session());
    app.start();

    let update = ProfileUpdate {
        address: Some("Elm St 2".to_string()),
        ..ProfileUpdate::default()
    };
    let user = app.account().update_profile(&update).await.unwrap();
    assert_eq!(user.id.as_u64(), 7);

    assert_eq!(
        backend.requests_to("/edit-profile")[0].body,
        Some(json!({ "address": "Elm St 2" }))
    );
    assert_eq!(backend.requests_to("/profile").len(), 1);
}

#[tokio::test]
async fn test_orders_and_order_detail() {
    let backend = MockBackend::start().await;
    let order = json!({
        "id": 31,
        "status": "shipped",
        "total_price": "45.50",
        "created_at": "2026-03-01",
        "products": [
            { "product_id": 5, "product_name": "Bag", "quantity": 1, "price": "25.50" },
            { "product_name": "Hat", "quantity": 2, "price": "10.00" },
        ]
    });
    backend.on(
        "GET",
        "/user/orders",
        MockResponse::ok(json!({ "data": [order.clone()] })),
    );
    backend.on("GET", "/user/orders/31", MockResponse::ok(order));
    let app = backend.app_with(backend.config(), stored_session());

    let orders = app.account().orders().await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].total.to_string(), "45.50");
    assert_eq!(orders[0].items.len(), 2);
    assert_eq!(orders[0].items[1].product_id, None);

    let detail = app.account().order(OrderId::new(31)).await.unwrap();
    assert_eq!(detail.status, "shipped");
    assert_eq!(
        backend.requests_to("/user/orders/31")[0].authorization.as_deref(),
        Some("Bearer tok")
    );
}

// ============================================================================
// Catalog
// ============================================================================

#[tokio::test]
async fn test_category_listings_are_cached_per_locale() {
    let backend = MockBackend::start().await;
    backend.on(
        "GET",
        "/public/home-page/main-categorical/en",
        MockResponse::ok(json!({ "data": [{ "id": 1, "name": "Shoes" }] })),
    );
    backend.on(
        "GET",
        "/public/home-page/main-categorical/ro",
        MockResponse::ok(json!([{ "id": 1, "title": "Pantofi" }])),
    );
    let app = backend.app();

    let first = app.catalog().main_categories(None).await.unwrap();
    let second = app.catalog().main_categories(Some("en")).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first[0].name, "Shoes");
    assert_eq!(
        backend
            .requests_to("/public/home-page/main-categorical/en")
            .len(),
        1
    );

    let localized = app.catalog().main_categories(Some("ro")).await.unwrap();
    assert_eq!(localized[0].name, "Pantofi");

    app.catalog().invalidate_all().await;
    app.catalog().main_categories(None).await.unwrap();
    assert_eq!(
        backend
            .requests_to("/public/home-page/main-categorical/en")
            .len(),
        2
    );
}

#[tokio::test]
async fn test_sub_categories_by_parent() {
    let backend = MockBackend::start().await;
    backend.on(
        "GET",
        "/public/home-page/sub-categorical/en/4",
        MockResponse::ok(json!({ "data": [{ "id": 40, "name": "Boots", "parent_id": 4 }] })),
    );
    let app = backend.app();

    let children = app
        .catalog()
        .sub_categories(CategoryId::new(4), None)
        .await
        .unwrap();
    assert_eq!(children[0].parent_id, Some(CategoryId::new(4)));

    app.catalog()
        .sub_categories(CategoryId::new(4), None)
        .await
        .unwrap();
    assert_eq!(backend.requests().len(), 1);
}

#[tokio::test]
async fn test_failed_listing_is_not_cached() {
    let backend = MockBackend::start().await;
    backend.once(
        "GET",
        "/public/home-page/main-categorical/en",
        MockResponse::error(500, "Down"),
    );
    backend.on(
        "GET",
        "/public/home-page/main-categorical/en",
        MockResponse::ok(json!([{ "id": 2, "name": "Bags" }])),
    );
    let app = backend.app();

    assert!(app.catalog().main_categories(None).await.is_err());
    let categories = app.catalog().main_categories(None).await.unwrap();
    assert_eq!(categories[0].id, CategoryId::new(2));
}
