//! Product search: full search, structured filtering, quick search and history.
//!
//! Two input channels feed one [`SearchState`]:
//! - query text submitted by the user (routed to the search endpoint)
//! - structured filters with no text (routed to the filter endpoint)
//!
//! Any change of query, filters or sort restarts at page 1 and replaces the
//! results; "load more" appends the next page. Each request is tagged with a
//! sequence number and responses for superseded requests are dropped.
//!
//! Quick search is a separate debounced channel for suggestions, and recent
//! searches are a small persisted history of submitted queries.

mod params;
mod quick;
mod recent;
mod service;
mod state;

pub use quick::{QuickSearch, QuickSearchAction, QuickSearchState};
pub use recent::{MAX_RECENT_SEARCHES, RecentSearches, push_recent};
pub use service::SearchService;
pub use state::{SearchAction, SearchFilters, SearchQuery, SearchRoute, SearchState};

/// Sort options for search results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SearchSort {
    #[default]
    Relevance,
    PriceAsc,
    PriceDesc,
    Newest,
}

impl SearchSort {
    /// Parse from URL parameter value.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "price-ascending" | "price_asc" => Self::PriceAsc,
            "price-descending" | "price_desc" => Self::PriceDesc,
            "newest" | "latest" => Self::Newest,
            _ => Self::Relevance,
        }
    }

    /// Convert to URL parameter value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Relevance => "relevance",
            Self::PriceAsc => "price-ascending",
            Self::PriceDesc => "price-descending",
            Self::Newest => "newest",
        }
    }

    /// The `sort` parameter sent to the API. Relevance is the server default.
    #[must_use]
    pub fn query_pair(self) -> Option<(&'static str, String)> {
        let value = match self {
            Self::Relevance => return None,
            Self::PriceAsc => "price_asc",
            Self::PriceDesc => "price_desc",
            Self::Newest => "newest",
        };
        Some(("sort", value.to_string()))
    }
}
