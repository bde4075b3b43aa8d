//! Search criteria as URL query strings.
//!
//! Lets a front end keep the search page addressable (`?q=shoes&sort=newest`)
//! and restore criteria from an incoming link.

use chrono::NaiveDate;
use url::form_urlencoded;

use super::{SearchFilters, SearchQuery, SearchSort};

impl SearchQuery {
    /// Parse criteria from a query string, with or without the leading `?`.
    ///
    /// Unknown keys and unparseable values are ignored.
    #[must_use]
    pub fn from_query_string(qs: &str) -> Self {
        let mut criteria = Self::default();

        for (key, value) in form_urlencoded::parse(qs.trim_start_matches('?').as_bytes()) {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match &*key {
                "q" => criteria.query = value.to_string(),
                "min_price" => criteria.filters.min_price = value.parse().ok(),
                "max_price" => criteria.filters.max_price = value.parse().ok(),
                "categories" => {
                    criteria.filters.category_ids = value
                        .split(',')
                        .filter_map(|id| id.trim().parse().ok())
                        .collect();
                }
                "date_from" => criteria.filters.date_from = parse_date(value),
                "date_to" => criteria.filters.date_to = parse_date(value),
                "sort" => criteria.sort = SearchSort::parse(value),
                _ => {}
            }
        }

        criteria
    }

    /// Render criteria as a query string (without the leading `?`).
    /// Unset criteria are omitted.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        let mut out = form_urlencoded::Serializer::new(String::new());
        let SearchFilters {
            min_price,
            max_price,
            category_ids,
            date_from,
            date_to,
        } = &self.filters;

        let query = self.trimmed_query();
        if !query.is_empty() {
            out.append_pair("q", query);
        }
        if let Some(min) = min_price {
            out.append_pair("min_price", &min.to_string());
        }
        if let Some(max) = max_price {
            out.append_pair("max_price", &max.to_string());
        }
        if !category_ids.is_empty() {
            let ids: Vec<String> = category_ids.iter().map(ToString::to_string).collect();
            out.append_pair("categories", &ids.join(","));
        }
        if let Some(from) = date_from {
            out.append_pair("date_from", &from.format("%Y-%m-%d").to_string());
        }
        if let Some(to) = date_to {
            out.append_pair("date_to", &to.format("%Y-%m-%d").to_string());
        }
        if self.sort != SearchSort::Relevance {
            out.append_pair("sort", self.sort.as_str());
        }

        out.finish()
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}
