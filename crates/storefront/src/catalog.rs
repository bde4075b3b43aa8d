//! Category listings.
//!
//! Categories change rarely, so listings are cached using `moka` (5-minute TTL).

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::{debug, instrument};

use agora_core::CategoryId;

use crate::api::{ApiClient, ApiError, Category};

/// How long a listing stays cached.
const CACHE_TTL: Duration = Duration::from_secs(300);

/// Maximum number of cached listings.
const CACHE_CAPACITY: u64 = 100;

/// Cache key for category listings.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum CacheKey {
    Main { locale: String },
    Sub { locale: String, parent: CategoryId },
}

/// Cached category listings.
#[derive(Clone)]
pub struct Catalog {
    inner: Arc<CatalogInner>,
}

struct CatalogInner {
    api: ApiClient,
    locale: String,
    cache: Cache<CacheKey, Vec<Category>>,
}

impl Catalog {
    /// Create a catalog serving `locale` by default.
    #[must_use]
    pub fn new(api: ApiClient, locale: impl Into<String>) -> Self {
        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(CACHE_TTL)
            .build();

        Self {
            inner: Arc::new(CatalogInner {
                api,
                locale: locale.into(),
                cache,
            }),
        }
    }

    /// Default locale for listings.
    #[must_use]
    pub fn locale(&self) -> &str {
        &self.inner.locale
    }

    /// Top-level categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing is not cached and the API request fails.
    #[instrument(skip(self))]
    pub async fn main_categories(&self, locale: Option<&str>) -> Result<Vec<Category>, ApiError> {
        let locale = locale.unwrap_or(&self.inner.locale);
        let key = CacheKey::Main {
            locale: locale.to_string(),
        };

        if let Some(categories) = self.inner.cache.get(&key).await {
            debug!("Cache hit for main categories");
            return Ok(categories);
        }

        let categories = self.inner.api.main_categories(locale).await?;
        self.inner.cache.insert(key, categories.clone()).await;
        Ok(categories)
    }

    /// Children of `parent`.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing is not cached and the API request fails.
    #[instrument(skip(self), fields(parent = %parent))]
    pub async fn sub_categories(
        &self,
        parent: CategoryId,
        locale: Option<&str>,
    ) -> Result<Vec<Category>, ApiError> {
        let locale = locale.unwrap_or(&self.inner.locale);
        let key = CacheKey::Sub {
            locale: locale.to_string(),
            parent,
        };

        if let Some(categories) = self.inner.cache.get(&key).await {
            debug!("Cache hit for sub categories");
            return Ok(categories);
        }

        let categories = self.inner.api.sub_categories(locale, parent).await?;
        self.inner.cache.insert(key, categories.clone()).await;
        Ok(categories)
    }

    /// Drop all cached listings.
    pub async fn invalidate_all(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }
}
