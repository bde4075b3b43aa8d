//! Account management for the signed-in user.

use std::sync::Arc;

use tracing::instrument;

use agora_core::OrderId;

use crate::api::{ApiClient, ApiError, Order, PasswordChange, ProfileUpdate, User};
use crate::session::{SessionAction, SessionStore};
use crate::storage::{self, Storage, keys};

/// Profile, password and order history operations.
///
/// Every call needs a stored token; without one the call fails with
/// `ApiError::MissingCredentials` before reaching the network.
#[derive(Clone)]
pub struct AccountService {
    api: ApiClient,
    storage: Arc<dyn Storage>,
    session: SessionStore,
}

impl AccountService {
    #[must_use]
    pub const fn new(api: ApiClient, storage: Arc<dyn Storage>, session: SessionStore) -> Self {
        Self {
            api,
            storage,
            session,
        }
    }

    /// Fetch the profile and refresh the stored copy and the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the profile cannot be stored.
    #[instrument(skip(self))]
    pub async fn profile(&self) -> Result<User, ApiError> {
        let user = self.api.profile().await?;
        self.remember(&user)?;
        Ok(user)
    }

    /// Update profile fields and return the resulting profile.
    ///
    /// When the server does not echo the updated profile it is re-fetched.
    ///
    /// # Errors
    ///
    /// Returns an error if the update or the follow-up fetch fails.
    #[instrument(skip(self))]
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, ApiError> {
        match self.api.update_profile(update).await? {
            Some(user) => {
                self.remember(&user)?;
                Ok(user)
            }
            None => self.profile().await,
        }
    }

    /// Change the password of the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the change.
    pub async fn change_password(&self, form: &PasswordChange) -> Result<(), ApiError> {
        self.api.change_password(form).await
    }

    /// List orders, newest first as the server returns them.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn orders(&self) -> Result<Vec<Order>, ApiError> {
        self.api.orders().await
    }

    /// Fetch one order.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn order(&self, id: OrderId) -> Result<Order, ApiError> {
        self.api.order(id).await
    }

    fn remember(&self, user: &User) -> Result<(), ApiError> {
        storage::write_json(self.storage.as_ref(), keys::USER, user)?;
        self.session
            .dispatch(SessionAction::ProfileUpdated { user: user.clone() });
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::StorefrontConfig;
    use crate::storage::MemoryStorage;

    #[tokio::test]
    async fn test_missing_token_fails_fast() {
        // Unroutable base URL: reaching the network would not produce MissingCredentials
        let config = StorefrontConfig::new("http://127.0.0.1:9".parse().unwrap());
        let storage = Arc::new(MemoryStorage::new());
        let api = ApiClient::new(&config, storage.clone()).unwrap();
        let account = AccountService::new(api, storage, SessionStore::default());

        assert!(matches!(
            account.profile().await,
            Err(ApiError::MissingCredentials)
        ));
        assert!(matches!(
            account.orders().await,
            Err(ApiError::MissingCredentials)
        ));
        assert!(matches!(
            account.order(OrderId::new(1)).await,
            Err(ApiError::MissingCredentials)
        ));
    }
}
