//! Product review endpoints.

use reqwest::Method;
use serde::Serialize;
use tracing::instrument;

use agora_core::{ProductId, RatingId, Score};

use super::types::CommentPage;
use super::{ApiClient, ApiError, Auth};

/// Contents of a review submission or edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentDraft {
    /// Star rating, sent as a string.
    #[serde(rename = "rating")]
    pub score: Score,
    /// Optional free text.
    #[serde(rename = "comment", skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl CommentDraft {
    /// Create a draft, dropping blank text.
    #[must_use]
    pub fn new(score: Score, body: Option<String>) -> Self {
        Self {
            score,
            body: body
                .map(|b| b.trim().to_string())
                .filter(|b| !b.is_empty()),
        }
    }
}

impl ApiClient {
    /// Page through a product's reviews.
    ///
    /// With `auth == Auth::Bearer` the authenticated endpoint is used, which
    /// marks the caller's own reviews but may omit pagination fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn comments(
        &self,
        product_id: ProductId,
        limit: u32,
        offset: u64,
        auth: Auth,
    ) -> Result<CommentPage, ApiError> {
        let path = match auth {
            Auth::None => format!("/public/products/{product_id}/comments"),
            Auth::Bearer => format!("/products/{product_id}/comments"),
        };
        let params = [("limit", limit.to_string()), ("offset", offset.to_string())];
        self.get(&path, &params, auth).await
    }

    /// Submit a review for a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the review.
    #[instrument(skip(self, draft), fields(product_id = %product_id))]
    pub async fn add_comment(
        &self,
        product_id: ProductId,
        draft: &CommentDraft,
    ) -> Result<(), ApiError> {
        self.send::<_, serde_json::Value>(
            Method::POST,
            &format!("/ratings/add/product/{product_id}"),
            Some(draft),
            Auth::Bearer,
        )
        .await?;
        Ok(())
    }

    /// Edit one of the caller's reviews.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the edit.
    #[instrument(skip(self, draft), fields(rating_id = %rating_id))]
    pub async fn update_comment(
        &self,
        rating_id: RatingId,
        draft: &CommentDraft,
    ) -> Result<(), ApiError> {
        self.send::<_, serde_json::Value>(
            Method::PUT,
            &format!("/ratings/update/{rating_id}"),
            Some(draft),
            Auth::Bearer,
        )
        .await?;
        Ok(())
    }

    /// Delete one of the caller's reviews.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(rating_id = %rating_id))]
    pub async fn delete_comment(&self, rating_id: RatingId) -> Result<(), ApiError> {
        self.send::<(), serde_json::Value>(
            Method::DELETE,
            &format!("/ratings/delete/{rating_id}"),
            None,
            Auth::Bearer,
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_wire_form() {
        let draft = CommentDraft::new(Score::new(4).unwrap(), Some("  Solid  ".to_string()));
        assert_eq!(
            serde_json::to_value(&draft).unwrap(),
            serde_json::json!({"rating": "4", "comment": "Solid"})
        );

        let blank = CommentDraft::new(Score::new(2).unwrap(), Some("   ".to_string()));
        assert_eq!(
            serde_json::to_value(&blank).unwrap(),
            serde_json::json!({"rating": "2"})
        );
    }
}
