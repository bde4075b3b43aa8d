//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `AGORA_API_URL` - Base URL of the storefront REST API (http or https)
//!
//! ## Optional
//! - `AGORA_LOCALE` - Locale used for category listings (default: en)
//! - `AGORA_STORAGE_PATH` - Durable local storage file (default: .agora/state.json)
//! - `AGORA_PAGE_SIZE` - Search/filter page size (default: 12)
//! - `AGORA_COMMENTS_PAGE_SIZE` - Reviews page size (default: 10)
//! - `AGORA_QUICK_SEARCH_LIMIT` - Quick search result limit (default: 5)
//! - `AGORA_QUICK_SEARCH_DEBOUNCE_MS` - Quick search debounce delay (default: 300)
//! - `AGORA_QUICK_SEARCH_MIN_CHARS` - Minimum quick search input length (default: 2)
//! - `AGORA_REQUEST_TIMEOUT_SECS` - Client-side request timeout (default: none)
//! - `AGORA_VERIFICATION_MARKERS` - Comma-separated "needs verification" error markers
//! - `AGORA_ALREADY_FAVORITED_MARKERS` - Comma-separated "already favorited" error markers
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::api::{DEFAULT_ALREADY_FAVORITED_MARKERS, DEFAULT_VERIFICATION_MARKERS, ErrorClassifier};

const DEFAULT_LOCALE: &str = "en";
const DEFAULT_STORAGE_PATH: &str = ".agora/state.json";
const DEFAULT_PAGE_SIZE: u32 = 12;
const DEFAULT_COMMENTS_PAGE_SIZE: u32 = 10;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Base URL of the storefront REST API
    pub api_url: Url,
    /// Locale for category listings
    pub locale: String,
    /// Durable local storage file
    pub storage_path: PathBuf,
    /// Search/filter page size
    pub page_size: u32,
    /// Reviews page size
    pub comments_page_size: u32,
    /// Quick search tuning
    pub quick_search: QuickSearchConfig,
    /// Client-side timeout per request (none by default)
    pub request_timeout: Option<Duration>,
    /// Error message markers for business error classification
    pub error_markers: ErrorMarkers,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Debounced quick search configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuickSearchConfig {
    /// Delay after the last keystroke before a call is issued
    pub debounce: Duration,
    /// Inputs shorter than this clear results without a call
    pub min_chars: usize,
    /// Maximum number of suggestions requested
    pub limit: u32,
}

impl Default for QuickSearchConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(300),
            min_chars: 2,
            limit: 5,
        }
    }
}

/// Substrings that identify business errors in server messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorMarkers {
    pub verification: Vec<String>,
    pub already_favorited: Vec<String>,
}

impl Default for ErrorMarkers {
    fn default() -> Self {
        Self {
            verification: DEFAULT_VERIFICATION_MARKERS
                .iter()
                .map(ToString::to_string)
                .collect(),
            already_favorited: DEFAULT_ALREADY_FAVORITED_MARKERS
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

impl ErrorMarkers {
    /// Build the classifier for these markers.
    #[must_use]
    pub fn classifier(&self) -> ErrorClassifier {
        ErrorClassifier::new(&self.verification, &self.already_favorited)
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let api_url = parse_api_url(&env.required("AGORA_API_URL")?)?;
        let locale = env.or_default("AGORA_LOCALE", DEFAULT_LOCALE);
        let storage_path = PathBuf::from(env.or_default("AGORA_STORAGE_PATH", DEFAULT_STORAGE_PATH));
        let page_size = env.positive("AGORA_PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
        let comments_page_size = env.positive("AGORA_COMMENTS_PAGE_SIZE", DEFAULT_COMMENTS_PAGE_SIZE)?;

        let defaults = QuickSearchConfig::default();
        let quick_search = QuickSearchConfig {
            debounce: env
                .parsed::<u64>("AGORA_QUICK_SEARCH_DEBOUNCE_MS")?
                .map_or(defaults.debounce, Duration::from_millis),
            min_chars: env
                .parsed::<usize>("AGORA_QUICK_SEARCH_MIN_CHARS")?
                .unwrap_or(defaults.min_chars),
            limit: env.positive("AGORA_QUICK_SEARCH_LIMIT", defaults.limit)?,
        };

        let request_timeout = env
            .parsed::<u64>("AGORA_REQUEST_TIMEOUT_SECS")?
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        let marker_defaults = ErrorMarkers::default();
        let error_markers = ErrorMarkers {
            verification: env
                .list("AGORA_VERIFICATION_MARKERS")
                .unwrap_or(marker_defaults.verification),
            already_favorited: env
                .list("AGORA_ALREADY_FAVORITED_MARKERS")
                .unwrap_or(marker_defaults.already_favorited),
        };

        Ok(Self {
            api_url,
            locale,
            storage_path,
            page_size,
            comments_page_size,
            quick_search,
            request_timeout,
            error_markers,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
        })
    }

    /// Configuration with defaults for everything but the API URL.
    #[must_use]
    pub fn new(api_url: Url) -> Self {
        Self {
            api_url,
            locale: DEFAULT_LOCALE.to_string(),
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
            page_size: DEFAULT_PAGE_SIZE,
            comments_page_size: DEFAULT_COMMENTS_PAGE_SIZE,
            quick_search: QuickSearchConfig::default(),
            request_timeout: None,
            error_markers: ErrorMarkers::default(),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable lookup with the parsing helpers used above.
struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    /// Get an optional variable, treating blank values as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse an optional variable.
    fn parsed<T>(&self, key: &str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key)
            .map(|v| {
                v.parse::<T>()
                    .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
            })
            .transpose()
    }

    /// Parse a strictly positive count with a default.
    fn positive(&self, key: &str, default: u32) -> Result<u32, ConfigError> {
        match self.parsed::<u32>(key)? {
            Some(0) => Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                "must be greater than zero".to_string(),
            )),
            Some(n) => Ok(n),
            None => Ok(default),
        }
    }

    /// Parse a comma-separated list, skipping blank entries.
    fn list(&self, key: &str) -> Option<Vec<String>> {
        self.optional(key).map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
    }
}

/// Validate that the API URL is absolute http(s).
fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidEnvVar("AGORA_API_URL".to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            "AGORA_API_URL".to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }

    Ok(url)
}
