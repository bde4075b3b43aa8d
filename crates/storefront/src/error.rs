//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type for front ends that drive several
//! services, plus helpers that keep the Sentry scope in step with the session.

use thiserror::Error;

use agora_core::{EmailError, ScoreError};

use crate::api::ApiError;
use crate::config::ConfigError;
use crate::state::StateError;
use crate::storage::StorageError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Remote API call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Durable storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Application state could not be built.
    #[error("Startup error: {0}")]
    Startup(#[from] StateError),

    /// Invalid email address.
    #[error(transparent)]
    Email(#[from] EmailError),

    /// Review score out of range.
    #[error(transparent)]
    Score(#[from] ScoreError),

    /// Bad input from the user.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl AppError {
    /// Whether the error points at a fault on our side or the server's,
    /// as opposed to a user or business error.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        match self {
            Self::Api(e) => matches!(
                e,
                ApiError::InvalidResponse(_) | ApiError::Url(_) | ApiError::Storage(_)
            ) || matches!(e.status(), Some(500..)),
            Self::Storage(_) | Self::Config(_) | Self::Startup(_) => true,
            Self::Email(_) | Self::Score(_) | Self::InvalidInput(_) => false,
        }
    }

    /// Capture internal errors to Sentry and log the error.
    pub fn report(&self) {
        if self.is_internal() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Operation failed"
            );
        } else {
            tracing::debug!(error = %self, "Operation rejected");
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("search", "Submitted search", Some(&[("query", "shoes")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
