//! Debounced search-as-you-type suggestions.
//!
//! Every keystroke cancels the pending timer and starts a new one. When a
//! timer fires, its request is detached from cancellation: a later keystroke
//! cannot abort an HTTP call already issued, it only makes the late response
//! stale. Stale responses are dropped by sequence number.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;

use super::{SearchFilters, SearchSort};
use crate::api::{ApiClient, Product};
use crate::config::QuickSearchConfig;
use crate::store::{Reduce, Store};

/// Suggestions for the text currently typed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuickSearchState {
    /// Text the current (or pending) results belong to.
    pub query: String,
    pub results: Vec<Product>,
    /// A debounce timer is waiting; no request issued yet.
    pub scheduled: bool,
    pub loading: bool,
    pub error: Option<String>,
    seq: u64,
}

impl QuickSearchState {
    /// Nothing is scheduled or in flight.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        !self.scheduled && !self.loading
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum QuickSearchAction {
    /// Input too short or cancelled: no results, nothing pending.
    Cleared { seq: u64 },
    /// A timer is waiting for input to settle.
    Scheduled { seq: u64, query: String },
    /// The timer fired and the request was issued.
    Started { seq: u64 },
    Loaded { seq: u64, results: Vec<Product> },
    Failed { seq: u64, message: String },
}

impl Reduce for QuickSearchState {
    type Action = QuickSearchAction;

    fn reduce(self, action: QuickSearchAction) -> Self {
        match action {
            QuickSearchAction::Cleared { seq } => Self {
                seq,
                ..Self::default()
            },
            QuickSearchAction::Scheduled { seq, query } => Self {
                query,
                scheduled: true,
                loading: false,
                error: None,
                seq,
                ..self
            },
            QuickSearchAction::Started { seq }
            | QuickSearchAction::Loaded { seq, .. }
            | QuickSearchAction::Failed { seq, .. }
                if seq != self.seq =>
            {
                self
            }
            QuickSearchAction::Started { .. } => Self {
                scheduled: false,
                loading: true,
                ..self
            },
            QuickSearchAction::Loaded { results, .. } => Self {
                results,
                loading: false,
                error: None,
                ..self
            },
            QuickSearchAction::Failed { message, .. } => Self {
                results: Vec::new(),
                loading: false,
                error: Some(message),
                ..self
            },
        }
    }
}

/// Debounced quick search channel.
#[derive(Clone)]
pub struct QuickSearch {
    inner: Arc<QuickSearchInner>,
}

struct QuickSearchInner {
    api: ApiClient,
    store: Store<QuickSearchState>,
    config: QuickSearchConfig,
    seq: AtomicU64,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl QuickSearch {
    #[must_use]
    pub fn new(api: ApiClient, config: QuickSearchConfig) -> Self {
        Self {
            inner: Arc::new(QuickSearchInner {
                api,
                store: Store::default(),
                config,
                seq: AtomicU64::new(0),
                timer: Mutex::new(None),
            }),
        }
    }

    /// The quick search state store.
    #[must_use]
    pub fn store(&self) -> &Store<QuickSearchState> {
        &self.inner.store
    }

    /// Snapshot of the quick search state.
    #[must_use]
    pub fn state(&self) -> QuickSearchState {
        self.inner.store.state()
    }

    /// Feed the current input text.
    ///
    /// Input shorter than the configured minimum clears the suggestions
    /// immediately without a request. Otherwise a request for the trimmed
    /// text is issued once no further input arrives within the debounce
    /// delay. Must be called within a Tokio runtime.
    pub fn input(&self, text: &str) {
        let query = text.trim().to_string();
        let mut timer = self.lock_timer();
        if let Some(pending) = timer.take() {
            pending.abort();
        }
        let seq = self.inner.seq.fetch_add(1, Ordering::SeqCst) + 1;

        if query.chars().count() < self.inner.config.min_chars {
            self.inner.store.dispatch(QuickSearchAction::Cleared { seq });
            return;
        }

        self.inner.store.dispatch(QuickSearchAction::Scheduled {
            seq,
            query: query.clone(),
        });

        let this = self.clone();
        let delay = self.inner.config.debounce;
        *timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if !this.detach(seq) {
                return;
            }
            this.fetch(seq, &query).await;
        }));
    }

    /// Cancel any pending timer and clear the suggestions.
    pub fn clear(&self) {
        let mut timer = self.lock_timer();
        if let Some(pending) = timer.take() {
            pending.abort();
        }
        let seq = self.inner.seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.store.dispatch(QuickSearchAction::Cleared { seq });
    }

    /// Give up the timer slot once the delay elapsed, so no later input can
    /// abort the request. Returns `false` if `seq` was superseded meanwhile.
    fn detach(&self, seq: u64) -> bool {
        let mut timer = self.lock_timer();
        if self.inner.seq.load(Ordering::SeqCst) != seq {
            return false;
        }
        timer.take();
        true
    }

    async fn fetch(&self, seq: u64, query: &str) {
        let inner = &self.inner;
        inner.store.dispatch(QuickSearchAction::Started { seq });
        tracing::debug!(seq, query, "Quick search request issued");

        let result = inner
            .api
            .search_products(
                query,
                &SearchFilters::default(),
                SearchSort::Relevance,
                1,
                inner.config.limit,
            )
            .await;

        match result {
            Ok(page) => {
                let mut results = page.items;
                results.truncate(inner.config.limit as usize);
                inner
                    .store
                    .dispatch(QuickSearchAction::Loaded { seq, results });
            }
            Err(e) => {
                tracing::warn!(error = %e, "Quick search failed");
                inner.store.dispatch(QuickSearchAction::Failed {
                    seq,
                    message: e.to_string(),
                });
            }
        }
    }

    fn lock_timer(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.inner
            .timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
