//! Product search, filtering and category endpoints.

use tracing::instrument;

use agora_core::CategoryId;

use super::types::{Category, Envelope, ProductPage};
use super::{ApiClient, ApiError, Auth};
use crate::search::{SearchFilters, SearchSort};

impl ApiClient {
    /// Full-text product search. Filters are passed as secondary constraints.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, filters), fields(query = %query))]
    pub async fn search_products(
        &self,
        query: &str,
        filters: &SearchFilters,
        sort: SearchSort,
        page: u32,
        limit: u32,
    ) -> Result<ProductPage, ApiError> {
        let mut params = vec![
            ("q", query.to_string()),
            ("page", page.to_string()),
            ("limit", limit.to_string()),
        ];
        params.extend(filters.query_pairs());
        params.extend(sort.query_pair());

        self.get("/public/products/search", &params, Auth::None).await
    }

    /// Structured product filtering without query text.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn filter_products(
        &self,
        filters: &SearchFilters,
        sort: SearchSort,
        page: u32,
        limit: u32,
    ) -> Result<ProductPage, ApiError> {
        let mut params = vec![("page", page.to_string()), ("limit", limit.to_string())];
        params.extend(filters.query_pairs());
        params.extend(sort.query_pair());

        self.get("/public/products/filter", &params, Auth::None).await
    }

    /// Top-level categories for a locale.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn main_categories(&self, locale: &str) -> Result<Vec<Category>, ApiError> {
        let categories: Envelope<Vec<Category>> = self
            .get(
                &format!("/public/home-page/main-categorical/{locale}"),
                &[],
                Auth::None,
            )
            .await?;
        Ok(categories.into_inner())
    }

    /// Children of `parent` for a locale.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(parent = %parent))]
    pub async fn sub_categories(
        &self,
        locale: &str,
        parent: CategoryId,
    ) -> Result<Vec<Category>, ApiError> {
        let categories: Envelope<Vec<Category>> = self
            .get(
                &format!("/public/home-page/sub-categorical/{locale}/{parent}"),
                &[],
                Auth::None,
            )
            .await?;
        Ok(categories.into_inner())
    }
}
