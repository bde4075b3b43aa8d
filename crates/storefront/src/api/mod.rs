//! HTTP client for the remote storefront REST API.
//!
//! # Architecture
//!
//! - Uses `reqwest` with JSON bodies and `Accept: application/json`
//! - The backend is the source of truth - no local sync, direct API calls
//! - Bearer tokens are read from durable storage on every authenticated call;
//!   a missing token fails locally without touching the network
//!
//! Endpoint methods live in per-area files as additional `impl ApiClient`
//! blocks:
//!
//! - `auth` - register, verify, login, password recovery, logout
//! - `account` - profile, password change, orders
//! - `products` - search, filter, categories
//! - `favorites` - favorite list and mutations
//! - `comments` - product reviews

mod account;
mod auth;
mod classify;
mod comments;
mod favorites;
mod products;
pub mod types;

use std::sync::Arc;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use crate::config::StorefrontConfig;
use crate::storage::{Storage, StorageError, keys};

pub use account::{PasswordChange, ProfileUpdate};
pub use auth::{IssuedSession, PasswordReset, Registration};
pub use classify::{
    DEFAULT_ALREADY_FAVORITED_MARKERS, DEFAULT_VERIFICATION_MARKERS, ErrorClassifier, ErrorKind,
};
pub use comments::CommentDraft;
pub use types::*;

/// Maximum number of response body characters written to logs.
const LOG_BODY_LIMIT: usize = 500;

/// Errors that can occur when talking to the storefront API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a non-success status.
    ///
    /// `message` is the server-provided message when present, otherwise
    /// `HTTP error <status>`.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// The request never produced a response (DNS, connect, TLS, timeout).
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body was not the JSON we expected.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// An authenticated call was attempted without a stored token.
    #[error("missing credentials: sign in first")]
    MissingCredentials,

    /// A request URL could not be built.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    /// Reading the token (or persisting a session) failed.
    #[error("{0}")]
    Storage(#[from] StorageError),
}

impl ApiError {
    /// HTTP status code, if the server answered.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Whether a request carries the stored bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Auth {
    /// Public endpoint.
    None,
    /// Requires `Authorization: Bearer <token>`.
    Bearer,
}

/// Client for the storefront REST API.
///
/// Cheaply cloneable; all clones share one connection pool.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    storage: Arc<dyn Storage>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &StorefrontConfig, storage: Arc<dyn Storage>) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client: builder.build()?,
                base_url: config.api_url.clone(),
                storage,
            }),
        })
    }

    /// Base URL every path is resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Returns true if a bearer token is stored.
    #[must_use]
    pub fn has_token(&self) -> bool {
        matches!(self.token(), Ok(Some(_)))
    }

    fn token(&self) -> Result<Option<SecretString>, StorageError> {
        Ok(self
            .inner
            .storage
            .get(keys::TOKEN)?
            .filter(|t| !t.is_empty())
            .map(SecretString::from))
    }

    /// Resolve an API path (e.g. `/favorites/12`) against the base URL.
    fn url(&self, path: &str) -> Result<Url, ApiError> {
        let base = self.inner.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}{path}"))?)
    }

    /// Build a request, attaching the bearer token when required.
    fn request(&self, method: Method, path: &str, auth: Auth) -> Result<RequestBuilder, ApiError> {
        let url = self.url(path)?;
        let builder = self.inner.client.request(method, url);

        match auth {
            Auth::None => Ok(builder),
            Auth::Bearer => {
                let token = self.token()?.ok_or(ApiError::MissingCredentials)?;
                Ok(builder.bearer_auth(token.expose_secret()))
            }
        }
    }

    /// `GET` a JSON resource.
    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        auth: Auth,
    ) -> Result<T, ApiError> {
        let builder = self.request(Method::GET, path, auth)?.query(query);
        Self::execute(builder).await
    }

    /// Send a request with an optional JSON body.
    pub(crate) async fn send<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        auth: Auth,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut builder = self.request(method, path, auth)?;
        if let Some(body) = body {
            builder = builder.json(body);
        }
        Self::execute(builder).await
    }

    /// Execute a request and decode the JSON response.
    async fn execute<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, ApiError> {
        let response = builder.send().await?;
        let status = response.status();

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            tracing::debug!(
                status = %status,
                body = %truncate(&body, LOG_BODY_LIMIT),
                "API returned non-success status"
            );
            return Err(ApiError::Http {
                status: status.as_u16(),
                message: error_message(&body)
                    .unwrap_or_else(|| format!("HTTP error {}", status.as_u16())),
            });
        }

        // Endpoints that return nothing decode as JSON null
        let body = if body.trim().is_empty() { "null" } else { body.as_str() };

        serde_json::from_str(body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %truncate(body, LOG_BODY_LIMIT),
                "Failed to parse API response"
            );
            ApiError::InvalidResponse(e.to_string())
        })
    }
}

/// Extract the human-readable message from an error body.
///
/// Accepts `{"message": ".."}`, `{"error": ".."}` and `{"errors": {"field": [".."]}}`.
fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;

    let direct = ["message", "error"]
        .iter()
        .filter_map(|key| value.get(key).and_then(serde_json::Value::as_str))
        .find(|msg| !msg.trim().is_empty());
    if let Some(msg) = direct {
        return Some(msg.to_string());
    }

    // Validation errors: first message of the first field
    value
        .get("errors")
        .and_then(serde_json::Value::as_object)
        .and_then(|fields| fields.values().next())
        .and_then(|messages| match messages {
            serde_json::Value::Array(items) => items.first().and_then(|m| m.as_str()),
            other => other.as_str(),
        })
        .map(String::from)
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_variants() {
        assert_eq!(
            error_message(r#"{"message":"Invalid credentials"}"#).as_deref(),
            Some("Invalid credentials")
        );
        assert_eq!(
            error_message(r#"{"error":"Product already in favorites"}"#).as_deref(),
            Some("Product already in favorites")
        );
        assert_eq!(
            error_message(r#"{"message":"","errors":{"email":["The email has already been taken."]}}"#)
                .as_deref(),
            Some("The email has already been taken.")
        );
    }

    #[test]
    fn test_error_message_absent() {
        assert_eq!(error_message("<html>502</html>"), None);
        assert_eq!(error_message(r#"{"status":false}"#), None);
    }

    #[test]
    fn test_api_error_display() {
        let err = ApiError::Http {
            status: 422,
            message: "The password is too short".to_string(),
        };
        assert_eq!(err.to_string(), "The password is too short");
        assert_eq!(err.status(), Some(422));
        assert_eq!(ApiError::MissingCredentials.status(), None);
    }

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate("héllo", 2), "hé");
    }
}
