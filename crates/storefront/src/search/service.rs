//! Search orchestration: routing, paging and stale-response handling.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::instrument;

use super::recent::RecentSearches;
use super::state::{SearchAction, SearchFilters, SearchQuery, SearchRoute, SearchState};
use super::SearchSort;
use crate::api::{ApiClient, ApiError, ProductPage};
use crate::error::add_breadcrumb;
use crate::store::Store;

/// Drives [`SearchState`] from user input.
///
/// Cheap to clone; clones share the state, the request counter and the
/// search history.
#[derive(Clone)]
pub struct SearchService {
    api: ApiClient,
    store: Store<SearchState>,
    recent: Arc<RecentSearches>,
    page_size: u32,
    seq: Arc<AtomicU64>,
}

impl SearchService {
    #[must_use]
    pub fn new(api: ApiClient, recent: Arc<RecentSearches>, page_size: u32) -> Self {
        Self {
            api,
            store: Store::default(),
            recent,
            page_size: page_size.max(1),
            seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// The search state store.
    #[must_use]
    pub const fn store(&self) -> &Store<SearchState> {
        &self.store
    }

    /// Snapshot of the search state.
    #[must_use]
    pub fn state(&self) -> SearchState {
        self.store.state()
    }

    /// Search history shared with this service.
    #[must_use]
    pub fn recent(&self) -> &RecentSearches {
        &self.recent
    }

    // =========================================================================
    // Input
    // =========================================================================

    /// Submit criteria explicitly (e.g. the user pressed enter).
    ///
    /// Non-empty query text is recorded in the search history.
    ///
    /// # Errors
    ///
    /// Returns the API error of the first page request. Errors of requests
    /// superseded while in flight are dropped.
    pub async fn submit(&self, criteria: SearchQuery) -> Result<(), ApiError> {
        let query = criteria.trimmed_query();
        if !query.is_empty() {
            add_breadcrumb("search", "Submitted search", Some(&[("query", query)]));
            if let Err(e) = self.recent.record(query) {
                tracing::warn!(error = %e, "Failed to persist recent searches");
            }
        }
        self.run(criteria).await
    }

    /// Replace the query text and search again.
    ///
    /// # Errors
    ///
    /// See [`submit`](Self::submit).
    pub async fn set_query(&self, query: impl Into<String>) -> Result<(), ApiError> {
        let criteria = SearchQuery {
            query: query.into(),
            ..self.current_criteria()
        };
        self.submit(criteria).await
    }

    /// Replace the filters and search again from page 1.
    ///
    /// # Errors
    ///
    /// See [`submit`](Self::submit).
    pub async fn set_filters(&self, filters: SearchFilters) -> Result<(), ApiError> {
        let criteria = SearchQuery {
            filters,
            ..self.current_criteria()
        };
        self.run(criteria).await
    }

    /// Change the sort order and search again from page 1.
    ///
    /// # Errors
    ///
    /// See [`submit`](Self::submit).
    pub async fn set_sort(&self, sort: SearchSort) -> Result<(), ApiError> {
        let criteria = SearchQuery {
            sort,
            ..self.current_criteria()
        };
        self.run(criteria).await
    }

    /// Apply criteria from a URL query string.
    ///
    /// # Errors
    ///
    /// See [`submit`](Self::submit).
    pub async fn apply_params(&self, query_string: &str) -> Result<(), ApiError> {
        self.run(SearchQuery::from_query_string(query_string)).await
    }

    /// Fetch the next page and append it.
    ///
    /// Returns `false` without a request while a request is in flight, when
    /// there are no more pages, or before any page was loaded.
    ///
    /// # Errors
    ///
    /// Returns the API error; loaded results are kept.
    #[instrument(skip(self))]
    pub async fn load_more(&self) -> Result<bool, ApiError> {
        let (criteria, next_page) = {
            let ready = self
                .store
                .with(|s| s.can_load_more().then(|| (s.criteria.clone(), s.page + 1)));
            match ready {
                Some(ready) => ready,
                None => return Ok(false),
            }
        };

        let seq = self.next_seq();
        self.store.dispatch(SearchAction::LoadMoreStarted { seq });

        let result = self.fetch(&criteria, next_page).await;
        self.settle(seq, next_page, true, result)?;
        Ok(true)
    }

    /// Clear the error slot.
    pub fn clear_error(&self) {
        self.store.dispatch(SearchAction::ClearError);
    }

    // =========================================================================
    // Requests
    // =========================================================================

    #[instrument(skip(self, criteria), fields(query = %criteria.query))]
    async fn run(&self, criteria: SearchQuery) -> Result<(), ApiError> {
        let seq = self.next_seq();

        if criteria.route() == SearchRoute::Idle {
            tracing::debug!("Empty criteria; clearing results");
            self.store.dispatch(SearchAction::Reset { seq, criteria });
            return Ok(());
        }

        self.store.dispatch(SearchAction::Started {
            seq,
            criteria: criteria.clone(),
        });

        let result = self.fetch(&criteria, 1).await;
        self.settle(seq, 1, false, result)
    }

    async fn fetch(&self, criteria: &SearchQuery, page: u32) -> Result<ProductPage, ApiError> {
        match criteria.route() {
            SearchRoute::Search => {
                self.api
                    .search_products(
                        criteria.trimmed_query(),
                        &criteria.filters,
                        criteria.sort,
                        page,
                        self.page_size,
                    )
                    .await
            }
            SearchRoute::Filter => {
                self.api
                    .filter_products(&criteria.filters, criteria.sort, page, self.page_size)
                    .await
            }
            SearchRoute::Idle => Ok(ProductPage::default()),
        }
    }

    fn settle(
        &self,
        seq: u64,
        page: u32,
        append: bool,
        result: Result<ProductPage, ApiError>,
    ) -> Result<(), ApiError> {
        if self.seq.load(Ordering::SeqCst) != seq {
            tracing::debug!(seq, "Discarding superseded search response");
            return Ok(());
        }

        match result {
            Ok(data) => {
                let already = if append {
                    self.store.with(|s| s.results.len())
                } else {
                    0
                };
                let has_more =
                    data.has_more_after(page, already + data.items.len(), self.page_size);
                tracing::debug!(page, count = data.items.len(), has_more, "Search page loaded");

                self.store.dispatch(SearchAction::PageLoaded {
                    seq,
                    page,
                    items: data.items,
                    total: data.total,
                    has_more,
                    append,
                });
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Search request failed");
                self.store.dispatch(SearchAction::Failed {
                    seq,
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    fn current_criteria(&self) -> SearchQuery {
        self.store.with(|s| s.criteria.clone())
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::SeqCst) + 1
    }
}
