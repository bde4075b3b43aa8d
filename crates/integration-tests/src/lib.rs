//! Integration test harness for Agora.
//!
//! Runs the storefront library against an in-process mock of the remote
//! REST API. The mock serves canned responses by method and path and
//! records every request it receives.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p agora-integration-tests
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! let backend = MockBackend::start().await;
//! backend.on("GET", "/profile", MockResponse::ok(json!({"data": user_json()})));
//!
//! let app = backend.app();
//! app.storage().set("token", "tok").unwrap();
//! let user = app.account().profile().await.unwrap();
//!
//! assert_eq!(backend.requests_to("/profile").len(), 1);
//! ```

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use url::{Url, form_urlencoded};

use agora_storefront::config::StorefrontConfig;
use agora_storefront::state::AppState;
use agora_storefront::storage::{MemoryStorage, Storage};

// =============================================================================
// Requests & Responses
// =============================================================================

/// A request received by the mock backend.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub authorization: Option<String>,
    pub body: Option<Value>,
}

impl RecordedRequest {
    /// First value of a query parameter.
    #[must_use]
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// All values of a repeated query parameter.
    #[must_use]
    pub fn query_values(&self, key: &str) -> Vec<&str> {
        self.query
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }
}

/// A canned response.
#[derive(Debug, Clone)]
pub struct MockResponse {
    status: StatusCode,
    body: String,
    delay: Option<Duration>,
}

impl MockResponse {
    /// JSON response with `status`.
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body: body.to_string(),
            delay: None,
        }
    }

    /// 200 with a JSON body.
    #[must_use]
    pub fn ok(body: Value) -> Self {
        Self::json(200, body)
    }

    /// Error status with `{"message": message}`.
    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(status, json!({ "message": message }))
    }

    /// Response with a body that is sent verbatim.
    #[must_use]
    pub fn raw(status: u16, body: &str) -> Self {
        Self {
            body: body.to_string(),
            ..Self::json(status, Value::Null)
        }
    }

    /// Hold the response back for `delay`.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

// =============================================================================
// Mock Backend
// =============================================================================

struct Route {
    method: Method,
    path: String,
    response: MockResponse,
    once: bool,
}

#[derive(Default)]
struct Shared {
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Shared {
    /// One-shot routes win over sticky ones; among sticky routes the latest wins.
    fn respond_to(&self, method: &Method, path: &str) -> Option<MockResponse> {
        let mut routes = lock(&self.routes);
        let matches = |r: &Route| r.method == *method && r.path == path;

        if let Some(index) = routes.iter().position(|r| r.once && matches(r)) {
            return Some(routes.remove(index).response);
        }
        routes
            .iter()
            .rev()
            .find(|r| !r.once && matches(r))
            .map(|r| r.response.clone())
    }
}

/// In-process HTTP server standing in for the storefront API.
pub struct MockBackend {
    addr: SocketAddr,
    shared: Arc<Shared>,
    task: JoinHandle<()>,
}

impl MockBackend {
    /// Bind to an ephemeral local port and start serving.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start() -> Self {
        let shared = Arc::new(Shared::default());
        let app = Router::new()
            .fallback(handle)
            .with_state(Arc::clone(&shared));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock backend");
        let addr = listener.local_addr().expect("Mock backend has no address");

        let task = tokio::spawn(async move {
            // Serving only stops when the test drops the backend
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, shared, task }
    }

    /// Base URL of the mock API.
    ///
    /// # Panics
    ///
    /// Never in practice; the address always forms a valid URL.
    #[must_use]
    pub fn url(&self) -> Url {
        format!("http://{}", self.addr)
            .parse()
            .expect("Mock backend address is a valid URL")
    }

    /// Serve `response` for every `method` request to `path`.
    pub fn on(&self, method: &str, path: &str, response: MockResponse) {
        self.add_route(method, path, response, false);
    }

    /// Serve `response` for the next `method` request to `path` only.
    pub fn once(&self, method: &str, path: &str, response: MockResponse) {
        self.add_route(method, path, response, true);
    }

    fn add_route(&self, method: &str, path: &str, response: MockResponse, once: bool) {
        let method = Method::from_bytes(method.as_bytes()).unwrap_or(Method::GET);
        lock(&self.shared.routes).push(Route {
            method,
            path: path.to_string(),
            response,
            once,
        });
    }

    /// Every request received so far, in arrival order.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.shared.requests).clone()
    }

    /// Requests received for `path`.
    #[must_use]
    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }

    /// Storefront configuration pointing at this backend.
    #[must_use]
    pub fn config(&self) -> StorefrontConfig {
        StorefrontConfig::new(self.url())
    }

    /// Application state over fresh in-memory storage.
    #[must_use]
    pub fn app(&self) -> AppState {
        self.app_with(self.config(), Arc::new(MemoryStorage::new()))
    }

    /// Application state with custom configuration and storage.
    ///
    /// # Panics
    ///
    /// Panics if the state cannot be built.
    #[must_use]
    pub fn app_with(&self, config: StorefrontConfig, storage: Arc<dyn Storage>) -> AppState {
        AppState::new(config, storage).expect("Failed to build application state")
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn handle(
    State(shared): State<Arc<Shared>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    let query = uri
        .query()
        .map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default();
    let authorization = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    let body = serde_json::from_slice(&body).ok();

    lock(&shared.requests).push(RecordedRequest {
        method: method.clone(),
        path: path.clone(),
        query,
        authorization,
        body,
    });

    let Some(response) = shared.respond_to(&method, &path) else {
        return (
            StatusCode::NOT_FOUND,
            [(CONTENT_TYPE, "application/json")],
            json!({ "message": format!("No route for {method} {path}") }).to_string(),
        )
            .into_response();
    };

    if let Some(delay) = response.delay {
        tokio::time::sleep(delay).await;
    }

    (
        response.status,
        [(CONTENT_TYPE, "application/json")],
        response.body,
    )
        .into_response()
}

// =============================================================================
// Fixtures
// =============================================================================

/// A user as the API returns it.
#[must_use]
pub fn user_json(id: u64, name: &str, email: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "email": email,
        "mobile": "0700000000",
        "unknown_field": true,
    })
}

/// A product as the API returns it.
#[must_use]
pub fn product_json(id: u64, name: &str, price: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "price": price,
        "image_url": format!("https://cdn.example.com/{id}.jpg"),
    })
}

/// A page of products `ids` with a reported total.
#[must_use]
pub fn product_page(ids: &[u64], total: u64) -> Value {
    let items: Vec<Value> = ids
        .iter()
        .map(|&id| product_json(id, &format!("Product {id}"), "10.00"))
        .collect();
    json!({ "data": items, "total": total })
}

/// A review as the API returns it.
#[must_use]
pub fn comment_json(id: u64, author: &str, rating: &str, own: bool) -> Value {
    json!({
        "rating_id": id,
        "user_name": author,
        "rating": rating,
        "comment": format!("Review {id}"),
        "is_owner": own,
    })
}
