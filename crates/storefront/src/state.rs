//! Application state shared across front-end handlers.

use std::sync::Arc;

use crate::api::{ApiClient, ApiError};
use crate::cart::Cart;
use crate::catalog::Catalog;
use crate::comments::CommentsService;
use crate::config::StorefrontConfig;
use crate::favorites::FavoritesService;
use crate::search::{QuickSearch, RecentSearches, SearchService};
use crate::services::{AccountService, AuthService};
use crate::session::{SessionState, SessionStore};
use crate::storage::{FileStorage, Storage, StorageError};

/// Error creating the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("failed to open local storage: {0}")]
    Storage(#[from] StorageError),
    #[error("failed to build API client: {0}")]
    Api(#[from] ApiError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and wires every service to
/// one API client, one storage backend and one session store.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    storage: Arc<dyn Storage>,
    api: ApiClient,
    auth: AuthService,
    account: AccountService,
    search: SearchService,
    quick_search: QuickSearch,
    favorites: FavoritesService,
    comments: CommentsService,
    catalog: Catalog,
    cart: Cart,
}

impl AppState {
    /// Create a new application state over `storage`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: StorefrontConfig, storage: Arc<dyn Storage>) -> Result<Self, StateError> {
        let api = ApiClient::new(&config, Arc::clone(&storage))?;
        let classifier = config.error_markers.classifier();
        let session = SessionStore::default();

        let auth = AuthService::new(
            api.clone(),
            Arc::clone(&storage),
            session.clone(),
            classifier.clone(),
        );
        let account = AccountService::new(api.clone(), Arc::clone(&storage), session);
        let recent = Arc::new(RecentSearches::load(Arc::clone(&storage)));
        let search = SearchService::new(api.clone(), recent, config.page_size);
        let quick_search = QuickSearch::new(api.clone(), config.quick_search);
        let favorites = FavoritesService::new(api.clone(), classifier);
        let comments = CommentsService::new(api.clone(), config.comments_page_size);
        let catalog = Catalog::new(api.clone(), config.locale.clone());
        let cart = Cart::load(Arc::clone(&storage));

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                storage,
                api,
                auth,
                account,
                search,
                quick_search,
                favorites,
                comments,
                catalog,
                cart,
            }),
        })
    }

    /// Create the state over the JSON file named by `config.storage_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage file cannot be opened or the HTTP
    /// client cannot be built.
    pub fn from_config(config: StorefrontConfig) -> Result<Self, StateError> {
        let storage = Arc::new(FileStorage::open(&config.storage_path)?);
        Self::new(config, storage)
    }

    /// Restore the session from storage. See [`AuthService::restore`].
    pub fn start(&self) -> SessionState {
        self.inner.auth.restore()
    }

    /// Sign out and drop the signed-in user's favorites.
    pub async fn logout(&self) {
        self.inner.auth.logout().await;
        self.inner.favorites.reset();
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.inner.storage
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    #[must_use]
    pub fn session(&self) -> &SessionStore {
        self.inner.auth.session()
    }

    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }

    #[must_use]
    pub fn account(&self) -> &AccountService {
        &self.inner.account
    }

    #[must_use]
    pub fn search(&self) -> &SearchService {
        &self.inner.search
    }

    #[must_use]
    pub fn quick_search(&self) -> &QuickSearch {
        &self.inner.quick_search
    }

    #[must_use]
    pub fn favorites(&self) -> &FavoritesService {
        &self.inner.favorites
    }

    #[must_use]
    pub fn comments(&self) -> &CommentsService {
        &self.inner.comments
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    #[must_use]
    pub fn cart(&self) -> &Cart {
        &self.inner.cart
    }
}
