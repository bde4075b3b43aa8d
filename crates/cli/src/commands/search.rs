//! Search, quick search and search history commands.

use clap::Args;
use chrono::NaiveDate;

use agora_core::{CategoryId, Price};
use agora_storefront::error::Result;
use agora_storefront::search::{SearchFilters, SearchQuery, SearchSort};
use agora_storefront::state::AppState;

use crate::output;

#[derive(Args)]
pub struct SearchArgs {
    /// Query text; omit to filter only
    query: Option<String>,

    /// Criteria as a URL query string (e.g. `q=phone&min_price=10`); other
    /// criteria flags are ignored
    #[arg(long, conflicts_with = "query")]
    params: Option<String>,

    #[arg(long)]
    min_price: Option<Price>,

    #[arg(long)]
    max_price: Option<Price>,

    /// Category id (repeatable)
    #[arg(long = "category")]
    categories: Vec<u64>,

    /// Earliest listing date (YYYY-MM-DD)
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Latest listing date (YYYY-MM-DD)
    #[arg(long)]
    to: Option<NaiveDate>,

    /// relevance, price-ascending, price-descending or newest
    #[arg(long, default_value = "relevance")]
    sort: String,

    /// Number of pages to load
    #[arg(long, default_value_t = 1)]
    pages: u32,
}

impl SearchArgs {
    fn criteria(&self) -> SearchQuery {
        SearchQuery {
            query: self.query.clone().unwrap_or_default(),
            filters: SearchFilters {
                min_price: self.min_price,
                max_price: self.max_price,
                category_ids: self.categories.iter().copied().map(CategoryId::new).collect(),
                date_from: self.from,
                date_to: self.to,
            },
            sort: SearchSort::parse(&self.sort),
        }
    }
}

pub async fn search(state: &AppState, args: SearchArgs) -> Result<()> {
    let search = state.search();

    match &args.params {
        Some(params) => search.apply_params(params).await?,
        None => search.submit(args.criteria()).await?,
    }

    for _ in 1..args.pages {
        if !search.load_more().await? {
            break;
        }
    }

    let result = search.state();
    output::products(&result.results);
    match result.total {
        Some(total) => output::line(format!(
            "{} of {total} shown (page {})",
            result.results.len(),
            result.page
        )),
        None => output::line(format!("{} shown (page {})", result.results.len(), result.page)),
    }
    if result.has_more {
        output::line("More results available; pass --pages to load them.");
    }
    if !result.criteria.query.is_empty() || !result.criteria.filters.is_empty() {
        output::line(format!("Link: ?{}", result.criteria.to_query_string()));
    }
    Ok(())
}

pub async fn suggest(state: &AppState, text: &str) -> Result<()> {
    let quick = state.quick_search();
    let mut rx = quick.store().subscribe();

    quick.input(text);

    let settled = rx
        .wait_for(|s| s.is_settled())
        .await
        .map(|s| s.clone())
        .unwrap_or_else(|_| quick.state());

    match settled.error {
        Some(message) => output::line(format!("Suggestions unavailable: {message}")),
        None => output::products(&settled.results),
    }
    Ok(())
}

pub fn recent(state: &AppState, clear: bool) -> Result<()> {
    let recent = state.search().recent();

    if clear {
        recent.clear()?;
        output::line("Search history cleared.");
        return Ok(());
    }

    let entries = recent.entries();
    if entries.is_empty() {
        output::line("No recent searches.");
    }
    for entry in entries {
        output::line(entry);
    }
    Ok(())
}
