//! Favorites with optimistic toggling.
//!
//! The state keeps the last server-confirmed list and, separately, the
//! changes still waiting for the server. The visible list is the confirmed
//! list with the pending changes applied, so a toggle shows immediately
//! and a failure reverts by simply dropping its pending change.

use tracing::instrument;
use uuid::Uuid;

use agora_core::{FavoriteId, ProductId};

use crate::api::{ApiClient, ApiError, ErrorClassifier, ErrorKind, Favorite, Product};
use crate::store::{Reduce, Store};

/// A confirmed favorite.
#[derive(Debug, Clone, PartialEq)]
pub struct FavoriteEntry {
    /// Server id, unknown when an add was confirmed without one.
    pub id: Option<FavoriteId>,
    pub product: Product,
}

impl From<Favorite> for FavoriteEntry {
    fn from(favorite: Favorite) -> Self {
        Self {
            id: Some(favorite.id),
            product: favorite.product,
        }
    }
}

/// A tentative change.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingOp {
    Add(Product),
    Remove(ProductId),
}

impl PendingOp {
    #[must_use]
    pub const fn product_id(&self) -> ProductId {
        match self {
            Self::Add(product) => product.id,
            Self::Remove(id) => *id,
        }
    }
}

/// A tentative change tagged with its operation id.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingChange {
    pub op_id: Uuid,
    pub op: PendingOp,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FavoritesState {
    confirmed: Vec<FavoriteEntry>,
    pending: Vec<PendingChange>,
    pub loading: bool,
    pub error: Option<String>,
}

impl FavoritesState {
    /// Last list confirmed by the server.
    #[must_use]
    pub fn confirmed(&self) -> &[FavoriteEntry] {
        &self.confirmed
    }

    /// Changes waiting for the server.
    #[must_use]
    pub fn pending(&self) -> &[PendingChange] {
        &self.pending
    }

    /// The visible favorites: confirmed entries with pending changes applied.
    #[must_use]
    pub fn items(&self) -> Vec<Product> {
        let mut items: Vec<Product> = self
            .confirmed
            .iter()
            .filter(|entry| !self.pending_removal(entry.product.id))
            .map(|entry| entry.product.clone())
            .collect();

        for change in &self.pending {
            if let PendingOp::Add(product) = &change.op
                && !items.iter().any(|p| p.id == product.id)
            {
                items.push(product.clone());
            }
        }
        items
    }

    /// Whether `product_id` is a favorite in the visible list.
    #[must_use]
    pub fn is_favorite(&self, product_id: ProductId) -> bool {
        match self.pending_for(product_id) {
            Some(PendingOp::Add(_)) => true,
            Some(PendingOp::Remove(_)) => false,
            None => self.confirmed.iter().any(|e| e.product.id == product_id),
        }
    }

    /// Whether a change for `product_id` is waiting for the server.
    #[must_use]
    pub fn is_pending(&self, product_id: ProductId) -> bool {
        self.pending_for(product_id).is_some()
    }

    fn pending_for(&self, product_id: ProductId) -> Option<&PendingOp> {
        self.pending
            .iter()
            .find(|c| c.op.product_id() == product_id)
            .map(|c| &c.op)
    }

    fn pending_removal(&self, product_id: ProductId) -> bool {
        matches!(self.pending_for(product_id), Some(PendingOp::Remove(_)))
    }

    fn take_pending(&mut self, op_id: Uuid) -> Option<PendingOp> {
        let index = self.pending.iter().position(|c| c.op_id == op_id)?;
        Some(self.pending.remove(index).op)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FavoritesAction {
    LoadStarted,
    /// A full reload; replaces the confirmed list.
    Loaded { favorites: Vec<Favorite> },
    LoadFailed { message: String },
    /// Record a change before the server confirms it. Ignored when a change
    /// for the same product is already pending.
    Tentative(PendingChange),
    /// The server accepted the change.
    Committed {
        op_id: Uuid,
        favorite_id: Option<FavoriteId>,
    },
    /// The server rejected the change.
    Reverted { op_id: Uuid, message: String },
    ClearError,
    /// Forget everything (sign-out).
    Reset,
}

impl Reduce for FavoritesState {
    type Action = FavoritesAction;

    fn reduce(mut self, action: FavoritesAction) -> Self {
        match action {
            FavoritesAction::LoadStarted => Self {
                loading: true,
                error: None,
                ..self
            },
            FavoritesAction::Loaded { favorites } => Self {
                confirmed: favorites.into_iter().map(FavoriteEntry::from).collect(),
                loading: false,
                error: None,
                ..self
            },
            FavoritesAction::LoadFailed { message } => Self {
                loading: false,
                error: Some(message),
                ..self
            },
            FavoritesAction::Tentative(change) => {
                if !self.is_pending(change.op.product_id()) {
                    self.pending.push(change);
                }
                self
            }
            FavoritesAction::Committed { op_id, favorite_id } => {
                match self.take_pending(op_id) {
                    Some(PendingOp::Add(product)) => {
                        if !self.confirmed.iter().any(|e| e.product.id == product.id) {
                            self.confirmed.push(FavoriteEntry {
                                id: favorite_id,
                                product,
                            });
                        }
                    }
                    Some(PendingOp::Remove(product_id)) => {
                        self.confirmed.retain(|e| e.product.id != product_id);
                    }
                    None => return self,
                }
                Self {
                    error: None,
                    ..self
                }
            }
            FavoritesAction::Reverted { op_id, message } => {
                if self.take_pending(op_id).is_none() {
                    return self;
                }
                Self {
                    error: Some(message),
                    ..self
                }
            }
            FavoritesAction::ClearError => Self {
                error: None,
                ..self
            },
            FavoritesAction::Reset => Self::default(),
        }
    }
}

/// Result of [`FavoritesService::toggle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added,
    Removed,
    /// A change for the product was already pending; nothing was sent.
    Ignored,
}

/// Favorites operations for the signed-in user.
#[derive(Clone)]
pub struct FavoritesService {
    api: ApiClient,
    store: Store<FavoritesState>,
    classifier: ErrorClassifier,
}

impl FavoritesService {
    #[must_use]
    pub fn new(api: ApiClient, classifier: ErrorClassifier) -> Self {
        Self {
            api,
            store: Store::default(),
            classifier,
        }
    }

    #[must_use]
    pub const fn store(&self) -> &Store<FavoritesState> {
        &self.store
    }

    #[must_use]
    pub fn state(&self) -> FavoritesState {
        self.store.state()
    }

    /// Reload the confirmed list from the server.
    ///
    /// # Errors
    ///
    /// Returns the API error, which is also recorded in the state.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<(), ApiError> {
        self.store.dispatch(FavoritesAction::LoadStarted);
        match self.api.favorites().await {
            Ok(favorites) => {
                tracing::debug!(count = favorites.len(), "Favorites loaded");
                self.store.dispatch(FavoritesAction::Loaded { favorites });
                Ok(())
            }
            Err(e) => {
                self.store.dispatch(FavoritesAction::LoadFailed {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Add `product` if it is not a favorite, remove it otherwise.
    ///
    /// The visible list changes before the request is sent. On failure the
    /// change is dropped again and the error recorded. An add the server
    /// rejects because the product is already a favorite counts as success.
    ///
    /// # Errors
    ///
    /// Returns the API error after reverting.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn toggle(&self, product: Product) -> Result<ToggleOutcome, ApiError> {
        let product_id = product.id;
        let adding = !self.store.with(|s| s.is_favorite(product_id));
        let op_id = Uuid::new_v4();
        let op = if adding {
            PendingOp::Add(product)
        } else {
            PendingOp::Remove(product_id)
        };

        self.store
            .dispatch(FavoritesAction::Tentative(PendingChange { op_id, op }));
        if !self
            .store
            .with(|s| s.pending.iter().any(|c| c.op_id == op_id))
        {
            tracing::debug!("Change already pending; ignoring toggle");
            return Ok(ToggleOutcome::Ignored);
        }

        let result = if adding {
            self.api.add_favorite(product_id).await
        } else {
            self.api.remove_favorite(product_id).await.map(|()| None)
        };

        match result {
            Ok(favorite_id) => {
                self.store
                    .dispatch(FavoritesAction::Committed { op_id, favorite_id });
            }
            Err(e) if adding && self.classifier.classify(&e) == ErrorKind::AlreadyFavorited => {
                tracing::info!("Product already a favorite on the server");
                self.store.dispatch(FavoritesAction::Committed {
                    op_id,
                    favorite_id: None,
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, "Favorite change rejected; reverting");
                self.store.dispatch(FavoritesAction::Reverted {
                    op_id,
                    message: e.to_string(),
                });
                return Err(e);
            }
        }

        Ok(if adding {
            ToggleOutcome::Added
        } else {
            ToggleOutcome::Removed
        })
    }

    pub fn clear_error(&self) {
        self.store.dispatch(FavoritesAction::ClearError);
    }

    /// Forget all favorites locally (sign-out).
    pub fn reset(&self) {
        self.store.dispatch(FavoritesAction::Reset);
    }
}
