//! Search criteria and result state.

use chrono::NaiveDate;

use agora_core::{CategoryId, Price};

use super::SearchSort;
use crate::api::Product;
use crate::store::Reduce;

/// Structured constraints on a product listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilters {
    pub min_price: Option<Price>,
    pub max_price: Option<Price>,
    pub category_ids: Vec<CategoryId>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl SearchFilters {
    /// Whether no constraint is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min_price.is_none()
            && self.max_price.is_none()
            && self.category_ids.is_empty()
            && self.date_from.is_none()
            && self.date_to.is_none()
    }

    /// API query parameters for the set constraints. Categories repeat.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(min) = self.min_price {
            pairs.push(("min_price", min.to_string()));
        }
        if let Some(max) = self.max_price {
            pairs.push(("max_price", max.to_string()));
        }
        for id in &self.category_ids {
            pairs.push(("category_ids[]", id.to_string()));
        }
        if let Some(from) = self.date_from {
            pairs.push(("date_from", from.format("%Y-%m-%d").to_string()));
        }
        if let Some(to) = self.date_to {
            pairs.push(("date_to", to.format("%Y-%m-%d").to_string()));
        }
        pairs
    }
}

/// Which endpoint a set of criteria is sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchRoute {
    /// Query text present: full-text search, filters as secondary constraints.
    Search,
    /// No text but at least one filter.
    Filter,
    /// Nothing to ask for; results are cleared.
    Idle,
}

/// Everything that determines the first page of results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub query: String,
    pub filters: SearchFilters,
    pub sort: SearchSort,
}

impl SearchQuery {
    /// Criteria for a plain text search.
    #[must_use]
    pub fn text(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    /// Trimmed query text.
    #[must_use]
    pub fn trimmed_query(&self) -> &str {
        self.query.trim()
    }

    #[must_use]
    pub fn route(&self) -> SearchRoute {
        if !self.trimmed_query().is_empty() {
            SearchRoute::Search
        } else if !self.filters.is_empty() {
            SearchRoute::Filter
        } else {
            SearchRoute::Idle
        }
    }
}

/// Search results and request status.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    /// Criteria of the current result set.
    pub criteria: SearchQuery,
    pub results: Vec<Product>,
    /// Total matches reported by the server for the current criteria.
    pub total: Option<u64>,
    /// Last page loaded; 0 before the first page arrives.
    pub page: u32,
    pub loading: bool,
    pub error: Option<String>,
    pub has_more: bool,
    seq: u64,
}

impl SearchState {
    /// Sequence number of the request the state currently tracks.
    #[must_use]
    pub const fn seq(&self) -> u64 {
        self.seq
    }

    /// Whether "load more" may issue a request now.
    #[must_use]
    pub const fn can_load_more(&self) -> bool {
        !self.loading && self.has_more && self.page > 0
    }
}

/// Search transitions. Every request-related action carries the sequence
/// number of its request; actions for anything but the latest are ignored.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchAction {
    /// New criteria submitted; page 1 is being fetched.
    Started { seq: u64, criteria: SearchQuery },
    /// The next page is being fetched for the current criteria.
    LoadMoreStarted { seq: u64 },
    /// A page arrived. `append` adds to the results, otherwise they are replaced.
    PageLoaded {
        seq: u64,
        page: u32,
        items: Vec<Product>,
        total: Option<u64>,
        has_more: bool,
        append: bool,
    },
    Failed { seq: u64, message: String },
    /// Criteria with nothing to ask for: results are cleared.
    Reset { seq: u64, criteria: SearchQuery },
    ClearError,
}

impl Reduce for SearchState {
    type Action = SearchAction;

    fn reduce(mut self, action: SearchAction) -> Self {
        match action {
            // New criteria start over from an empty first page
            SearchAction::Started { seq, criteria } => Self {
                criteria,
                loading: true,
                seq,
                ..Self::default()
            },
            SearchAction::LoadMoreStarted { seq } => Self {
                loading: true,
                error: None,
                seq,
                ..self
            },
            SearchAction::PageLoaded { seq, .. } | SearchAction::Failed { seq, .. }
                if seq != self.seq =>
            {
                self
            }
            SearchAction::PageLoaded {
                page,
                mut items,
                total,
                has_more,
                append,
                ..
            } => {
                if append {
                    self.results.extend(items);
                } else {
                    if let Some(total) = total.and_then(|t| usize::try_from(t).ok()) {
                        items.truncate(total);
                    }
                    self.results = items;
                    self.total = total;
                }
                Self {
                    page,
                    has_more,
                    loading: false,
                    error: None,
                    ..self
                }
            }
            SearchAction::Failed { message, .. } => Self {
                loading: false,
                error: Some(message),
                ..self
            },
            SearchAction::Reset { seq, criteria } => Self {
                criteria,
                seq,
                ..Self::default()
            },
            SearchAction::ClearError => Self {
                error: None,
                ..self
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use agora_core::ProductId;

    use super::*;

    fn product(id: u64) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            price: Price::from_minor(1000),
            image: None,
            description: None,
            category_id: None,
        }
    }

    fn loaded(seq: u64, page: u32, ids: &[u64], total: Option<u64>, append: bool) -> SearchAction {
        SearchAction::PageLoaded {
            seq,
            page,
            items: ids.iter().copied().map(product).collect(),
            total,
            has_more: true,
            append,
        }
    }

    fn ids(state: &SearchState) -> Vec<u64> {
        state.results.iter().map(|p| p.id.as_u64()).collect()
    }

    #[test]
    fn test_route() {
        assert_eq!(SearchQuery::text("shoes").route(), SearchRoute::Search);
        assert_eq!(SearchQuery::text("   ").route(), SearchRoute::Idle);

        let filtered = SearchQuery {
            filters: SearchFilters {
                min_price: Some(Price::from_minor(1000)),
                ..SearchFilters::default()
            },
            ..SearchQuery::default()
        };
        assert_eq!(filtered.route(), SearchRoute::Filter);

        let both = SearchQuery {
            query: "shoes".to_string(),
            ..filtered
        };
        assert_eq!(both.route(), SearchRoute::Search);
    }

    #[test]
    fn test_filter_query_pairs() {
        let filters = SearchFilters {
            min_price: Some(Price::from_minor(1000)),
            max_price: None,
            category_ids: vec![CategoryId::new(4), CategoryId::new(7)],
            date_from: NaiveDate::from_ymd_opt(2024, 1, 2),
            date_to: None,
        };
        assert_eq!(
            filters.query_pairs(),
            vec![
                ("min_price", "10.00".to_string()),
                ("category_ids[]", "4".to_string()),
                ("category_ids[]", "7".to_string()),
                ("date_from", "2024-01-02".to_string()),
            ]
        );
        assert!(SearchFilters::default().query_pairs().is_empty());
    }

    #[test]
    fn test_replace_then_append() {
        let state = SearchState::default()
            .reduce(SearchAction::Started {
                seq: 1,
                criteria: SearchQuery::text("shoes"),
            })
            .reduce(loaded(1, 1, &[1, 2], Some(4), false));
        assert_eq!(ids(&state), vec![1, 2]);
        assert_eq!(state.total, Some(4));
        assert!(!state.loading);
        assert!(state.can_load_more());

        let state = state
            .reduce(SearchAction::LoadMoreStarted { seq: 2 })
            .reduce(loaded(2, 2, &[3, 4], Some(99), true));
        assert_eq!(ids(&state), vec![1, 2, 3, 4]);
        assert_eq!(state.page, 2);
        // Appending never touches the total
        assert_eq!(state.total, Some(4));
    }

    #[test]
    fn test_replace_truncates_to_total() {
        let state = SearchState::default()
            .reduce(SearchAction::Started {
                seq: 1,
                criteria: SearchQuery::text("bag"),
            })
            .reduce(loaded(1, 1, &[1, 2, 3], Some(2), false));
        assert_eq!(ids(&state), vec![1, 2]);
    }

    #[test]
    fn test_stale_responses_are_ignored() {
        let state = SearchState::default()
            .reduce(SearchAction::Started {
                seq: 1,
                criteria: SearchQuery::text("sho"),
            })
            .reduce(SearchAction::Started {
                seq: 2,
                criteria: SearchQuery::text("shoes"),
            })
            .reduce(loaded(2, 1, &[5], Some(1), false))
            .reduce(loaded(1, 1, &[9, 8], Some(2), false))
            .reduce(SearchAction::Failed {
                seq: 1,
                message: "late".to_string(),
            });

        assert_eq!(ids(&state), vec![5]);
        assert_eq!(state.criteria.query, "shoes");
        assert!(state.error.is_none());
    }

    #[test]
    fn test_failure_keeps_results() {
        let state = SearchState::default()
            .reduce(SearchAction::Started {
                seq: 1,
                criteria: SearchQuery::text("shoes"),
            })
            .reduce(loaded(1, 1, &[1], Some(3), false))
            .reduce(SearchAction::LoadMoreStarted { seq: 2 })
            .reduce(SearchAction::Failed {
                seq: 2,
                message: "HTTP error 500".to_string(),
            });

        assert_eq!(ids(&state), vec![1]);
        assert!(!state.loading);
        assert_eq!(state.error.as_deref(), Some("HTTP error 500"));

        let state = state.reduce(SearchAction::ClearError);
        assert!(state.error.is_none());
    }

    #[test]
    fn test_new_criteria_drop_previous_pages() {
        let state = SearchState::default()
            .reduce(SearchAction::Started {
                seq: 1,
                criteria: SearchQuery::text("phone"),
            })
            .reduce(loaded(1, 1, &[1, 2], Some(6), false))
            .reduce(SearchAction::Started {
                seq: 2,
                criteria: SearchQuery::text("shoes"),
            });

        assert!(state.results.is_empty());
        assert_eq!(state.total, None);
        assert_eq!(state.page, 0);
        assert!(!state.has_more);

        // A failed first page leaves nothing to continue from
        let state = state.reduce(SearchAction::Failed {
            seq: 2,
            message: "HTTP error 500".to_string(),
        });
        assert!(state.results.is_empty());
        assert!(!state.can_load_more());
        assert_eq!(state.criteria.query, "shoes");
    }

    #[test]
    fn test_reset_clears_results() {
        let state = SearchState::default()
            .reduce(SearchAction::Started {
                seq: 1,
                criteria: SearchQuery::text("shoes"),
            })
            .reduce(loaded(1, 1, &[1], Some(1), false))
            .reduce(SearchAction::Reset {
                seq: 2,
                criteria: SearchQuery::default(),
            });

        assert!(state.results.is_empty());
        assert_eq!(state.page, 0);
        assert!(!state.has_more);
        assert_eq!(state.seq(), 2);
    }
}
