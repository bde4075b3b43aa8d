//! Favorite endpoints.

use reqwest::Method;
use serde::Serialize;
use tracing::instrument;

use agora_core::{FavoriteId, ProductId};

use super::types::{AddedFavorite, Envelope, Favorite};
use super::{ApiClient, ApiError, Auth};

#[derive(Serialize)]
struct AddFavoriteBody {
    product_id: ProductId,
}

impl ApiClient {
    /// List the signed-in user's favorites.
    ///
    /// # Errors
    ///
    /// Returns an error if no token is stored or the API request fails.
    #[instrument(skip(self))]
    pub async fn favorites(&self) -> Result<Vec<Favorite>, ApiError> {
        let favorites: Envelope<Vec<Favorite>> = self.get("/favorites", &[], Auth::Bearer).await?;
        Ok(favorites.into_inner())
    }

    /// Add a product to the favorites.
    ///
    /// Returns the new favorite id when the server reports one.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the addition, including when the
    /// product is already a favorite.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_favorite(&self, product_id: ProductId) -> Result<Option<FavoriteId>, ApiError> {
        let body = AddFavoriteBody { product_id };
        let added: Option<Envelope<AddedFavorite>> = self
            .send(Method::POST, "/favorites", Some(&body), Auth::Bearer)
            .await?;
        Ok(added.and_then(|a| a.into_inner().id))
    }

    /// Remove a product from the favorites.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_favorite(&self, product_id: ProductId) -> Result<(), ApiError> {
        self.send::<(), serde_json::Value>(
            Method::DELETE,
            &format!("/favorites/{product_id}"),
            None,
            Auth::Bearer,
        )
        .await?;
        Ok(())
    }
}
