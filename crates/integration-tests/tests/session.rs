//! Integration tests for the session lifecycle and auth operations.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use chrono::NaiveDate;
use secrecy::SecretString;
use serde_json::json;

use agora_core::{Email, UserId};
use agora_integration_tests::{MockBackend, MockResponse, user_json};
use agora_storefront::api::{ApiError, PasswordReset, Registration, User};
use agora_storefront::services::LoginOutcome;
use agora_storefront::storage::{self, MemoryStorage, Storage, keys};

fn email() -> Email {
    Email::parse("ana@example.com").unwrap()
}

fn password() -> SecretString {
    SecretString::from("correct horse")
}

fn session_json() -> serde_json::Value {
    json!({
        "data": {
            "user": user_json(7, "Ana", "ana@example.com"),
            "access_token": "tok-123",
        }
    })
}

// ============================================================================
// Startup
// ============================================================================

#[tokio::test]
async fn test_startup_with_stored_session_makes_no_request() {
    let backend = MockBackend::start().await;
    let storage = Arc::new(MemoryStorage::new());
    let user: User = serde_json::from_value(user_json(7, "Ana", "ana@example.com")).unwrap();
    storage::write_json(storage.as_ref(), keys::USER, &user).unwrap();
    storage.set(keys::TOKEN, "tok-123").unwrap();

    let app = backend.app_with(backend.config(), storage);
    let state = app.start();

    assert!(state.is_initialized());
    assert!(state.is_authenticated());
    assert_eq!(state.user().unwrap().id, UserId::new(7));
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_startup_with_token_but_no_user_is_anonymous() {
    let backend = MockBackend::start().await;
    let storage = Arc::new(MemoryStorage::new());
    storage.set(keys::TOKEN, "tok-123").unwrap();

    let app = backend.app_with(backend.config(), storage);
    let state = app.start();

    assert!(state.is_initialized());
    assert!(!state.is_authenticated());
    assert!(backend.requests().is_empty());
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn test_login_success_persists_session_and_authorizes_later_calls() {
    let backend = MockBackend::start().await;
    backend.on("POST", "/login", MockResponse::ok(session_json()));
    backend.on(
        "GET",
        "/favorites",
        MockResponse::ok(json!({ "data": [] })),
    );

    let app = backend.app();
    app.start();

    let outcome = app.auth().login(&email(), &password()).await.unwrap();
    assert!(matches!(outcome, LoginOutcome::Authenticated(ref u) if u.name == "Ana"));

    let state = app.session().state();
    assert!(state.is_authenticated());
    assert!(!state.loading);
    assert!(state.error.is_none());
    assert_eq!(app.storage().get(keys::TOKEN).unwrap().as_deref(), Some("tok-123"));

    let login = &backend.requests_to("/login")[0];
    assert_eq!(
        login.body,
        Some(json!({ "email": "ana@example.com", "password": "correct horse" }))
    );
    assert_eq!(login.authorization, None);

    app.favorites().load().await.unwrap();
    let favorites = &backend.requests_to("/favorites")[0];
    assert_eq!(favorites.authorization.as_deref(), Some("Bearer tok-123"));
}

#[tokio::test]
async fn test_login_requiring_verification_is_not_a_failure() {
    let backend = MockBackend::start().await;
    backend.on(
        "POST",
        "/login",
        MockResponse::error(403, "Please complete account verification first."),
    );

    let app = backend.app();
    app.start();

    let outcome = app.auth().login(&email(), &password()).await.unwrap();
    assert_eq!(
        outcome,
        LoginOutcome::VerificationRequired {
            email: "ana@example.com".to_string()
        }
    );

    let state = app.session().state();
    assert!(state.needs_verification());
    assert_eq!(state.verification_email(), Some("ana@example.com"));
    assert!(state.user().is_none());
    assert!(state.error.is_none());
}

#[tokio::test]
async fn test_login_rejected_sets_error() {
    let backend = MockBackend::start().await;
    backend.on("POST", "/login", MockResponse::error(401, "Invalid credentials"));

    let app = backend.app();
    app.start();

    let err = app.auth().login(&email(), &password()).await.unwrap_err();
    assert_eq!(err.status(), Some(401));

    let state = app.session().state();
    assert!(!state.is_authenticated());
    assert_eq!(state.error.as_deref(), Some("Invalid credentials"));
    assert!(app.storage().get(keys::TOKEN).unwrap().is_none());
}

// ============================================================================
// Registration & Verification
// ============================================================================

#[tokio::test]
async fn test_register_then_verify() {
    let backend = MockBackend::start().await;
    backend.on(
        "POST",
        "/register",
        MockResponse::ok(json!({ "message": "Code sent" })),
    );
    backend.once(
        "POST",
        "/account-verification",
        MockResponse::error(422, "Invalid code"),
    );
    backend.on(
        "POST",
        "/account-verification",
        MockResponse::ok(session_json()),
    );

    let app = backend.app();
    app.start();

    let form = Registration {
        name: "Ana".to_string(),
        mobile: "0700000000".to_string(),
        birth_date: NaiveDate::from_ymd_opt(1990, 4, 1).unwrap(),
        email: email(),
        password: password(),
        password_confirmation: password(),
        gender: "female".to_string(),
        address: "Main St 1".to_string(),
    };
    app.auth().register(&form).await.unwrap();

    let state = app.session().state();
    assert!(state.needs_verification());
    assert!(app.storage().get(keys::TOKEN).unwrap().is_none());

    let body = backend.requests_to("/register")[0].body.clone().unwrap();
    assert_eq!(body["birth_date"], "1990-04-01");
    assert_eq!(body["password_confirmation"], "correct horse");

    // Wrong code keeps the pending state
    assert!(app.auth().verify(&email(), "000000").await.is_err());
    let state = app.session().state();
    assert!(state.needs_verification());
    assert_eq!(state.error.as_deref(), Some("Invalid code"));

    let user = app.auth().verify(&email(), "123456").await.unwrap();
    assert_eq!(user.id, UserId::new(7));

    let state = app.session().state();
    assert!(state.is_authenticated());
    assert!(!state.needs_verification());
    assert_eq!(
        backend.requests_to("/account-verification")[1].body,
        Some(json!({ "email": "ana@example.com", "recovery_code": "123456" }))
    );
}

// ============================================================================
// Password Recovery
// ============================================================================

#[tokio::test]
async fn test_password_recovery_round_trips() {
    let backend = MockBackend::start().await;
    backend.on("POST", "/find-email", MockResponse::ok(json!({})));
    backend.on(
        "PUT",
        "/update-password",
        MockResponse::error(422, "The recovery code is invalid."),
    );

    let app = backend.app();
    app.start();

    app.auth().forgot_password(&email()).await.unwrap();
    let state = app.session().state();
    assert!(!state.loading);
    assert!(state.error.is_none());
    assert!(!state.is_authenticated());

    let form = PasswordReset {
        email: email(),
        recovery_code: "999".to_string(),
        password: password(),
        confirm_password: password(),
    };
    assert!(app.auth().reset_password(&form).await.is_err());
    assert_eq!(
        app.session().state().error.as_deref(),
        Some("The recovery code is invalid.")
    );

    let body = backend.requests_to("/update-password")[0].body.clone().unwrap();
    assert_eq!(body["confirm_password"], "correct horse");
}

// ============================================================================
// Logout
// ============================================================================

#[tokio::test]
async fn test_logout_clears_local_state_even_when_remote_fails() {
    let backend = MockBackend::start().await;
    backend.on("POST", "/login", MockResponse::ok(session_json()));
    backend.on("POST", "/logout", MockResponse::error(500, "Server exploded"));

    let app = backend.app();
    app.start();
    app.auth().login(&email(), &password()).await.unwrap();

    app.logout().await;

    let state = app.session().state();
    assert!(!state.is_authenticated());
    assert!(state.user().is_none());
    assert!(state.is_initialized());
    assert!(state.error.is_none());
    assert!(app.storage().get(keys::TOKEN).unwrap().is_none());
    assert!(app.storage().get(keys::USER).unwrap().is_none());

    let logout = &backend.requests_to("/logout")[0];
    assert_eq!(logout.authorization.as_deref(), Some("Bearer tok-123"));

    // Later authenticated calls fail locally
    assert!(matches!(
        app.account().profile().await,
        Err(ApiError::MissingCredentials)
    ));
}
