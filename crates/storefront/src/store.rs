//! Reducer-driven state containers.
//!
//! Every piece of view state (session, search, favorites, ...) is a plain
//! value type with a pure transition function. A [`Store`] owns the current
//! value, applies actions in dispatch order and publishes each new snapshot
//! to subscribers over a `tokio::sync::watch` channel.
//!
//! ```rust,ignore
//! let store = Store::new(SessionState::default());
//! let mut rx = store.subscribe();
//! store.dispatch(SessionAction::RequestStarted);
//! rx.changed().await?;
//! assert!(rx.borrow().loading);
//! ```

use std::sync::Arc;

use tokio::sync::watch;

/// A state value with a pure transition function.
pub trait Reduce: Clone + Send + Sync + 'static {
    /// Events this state reacts to.
    type Action;

    /// Produce the state that follows `self` after `action`.
    #[must_use]
    fn reduce(self, action: Self::Action) -> Self;
}

/// Shared handle to a reducer-managed state value.
///
/// Cloning is cheap; all clones observe and mutate the same state.
pub struct Store<S> {
    tx: Arc<watch::Sender<S>>,
}

impl<S> Clone for Store<S> {
    fn clone(&self) -> Self {
        Self {
            tx: Arc::clone(&self.tx),
        }
    }
}

impl<S: Reduce> Store<S> {
    /// Create a store holding `initial`.
    #[must_use]
    pub fn new(initial: S) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    /// Apply `action` to the current state and notify subscribers.
    pub fn dispatch(&self, action: S::Action) {
        self.tx.send_modify(|state| {
            let current = state.clone();
            *state = current.reduce(action);
        });
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> S {
        self.tx.borrow().clone()
    }

    /// Read the current state without cloning it.
    ///
    /// The state stays locked while `f` runs. `f` must not call
    /// [`dispatch`](Self::dispatch) on this store or it deadlocks; copy what
    /// you need out of `f` and dispatch afterwards.
    pub fn with<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.tx.borrow())
    }

    /// Subscribe to state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<S> {
        self.tx.subscribe()
    }
}

impl<S: Reduce + Default> Default for Store<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}
