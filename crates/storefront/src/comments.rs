//! Product reviews: paging and the caller's own add/edit/delete.
//!
//! Adding waits for the server and then reloads the first page. Edits and
//! deletions patch the loaded list only after the server accepted them.

use tracing::instrument;

use agora_core::{ProductId, RatingId};

use crate::api::{ApiClient, ApiError, Auth, Comment, CommentDraft, CommentPage};
use crate::store::{Reduce, Store};

/// Loaded reviews of one product.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentsState {
    /// Product the list belongs to.
    pub product_id: Option<ProductId>,
    pub comments: Vec<Comment>,
    pub has_more: bool,
    /// Offset of the next page as reported by the server.
    pub next_offset: Option<u64>,
    pub loading: bool,
    pub error: Option<String>,
}

impl CommentsState {
    /// Offset to request for the next page.
    #[must_use]
    pub fn offset_for_more(&self) -> u64 {
        self.next_offset
            .unwrap_or_else(|| u64::try_from(self.comments.len()).unwrap_or(u64::MAX))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentsAction {
    /// A request for `product_id` was issued.
    Started { product_id: ProductId },
    /// A page arrived. The first page replaces the list, later pages append.
    PageLoaded {
        product_id: ProductId,
        page: CommentPage,
        append: bool,
    },
    /// A request for `product_id` failed.
    Failed {
        product_id: ProductId,
        message: String,
    },
    /// A request ended without changing the list and without an error.
    Settled,
    Updated { id: RatingId, draft: CommentDraft },
    Deleted { id: RatingId },
    ClearError,
    Reset,
}

impl Reduce for CommentsState {
    type Action = CommentsAction;

    fn reduce(mut self, action: CommentsAction) -> Self {
        match action {
            CommentsAction::Started { product_id } => {
                if self.product_id != Some(product_id) {
                    self = Self {
                        product_id: Some(product_id),
                        ..Self::default()
                    };
                }
                Self {
                    loading: true,
                    error: None,
                    ..self
                }
            }
            CommentsAction::PageLoaded { product_id, .. }
                if self.product_id != Some(product_id) =>
            {
                self
            }
            CommentsAction::PageLoaded { page, append, .. } => {
                if append {
                    self.comments.extend(page.comments);
                } else {
                    self.comments = page.comments;
                }
                Self {
                    has_more: page.has_more,
                    next_offset: page.next_offset,
                    loading: false,
                    error: None,
                    ..self
                }
            }
            CommentsAction::Failed { product_id, .. }
                if self.product_id != Some(product_id) =>
            {
                self
            }
            CommentsAction::Failed { message, .. } => Self {
                loading: false,
                error: Some(message),
                ..self
            },
            CommentsAction::Settled => Self {
                loading: false,
                ..self
            },
            CommentsAction::Updated { id, draft } => {
                if let Some(comment) = self.comments.iter_mut().find(|c| c.id == id) {
                    comment.score = draft.score;
                    comment.body = draft.body;
                }
                Self {
                    loading: false,
                    error: None,
                    ..self
                }
            }
            CommentsAction::Deleted { id } => {
                self.comments.retain(|c| c.id != id);
                Self {
                    loading: false,
                    error: None,
                    ..self
                }
            }
            CommentsAction::ClearError => Self {
                error: None,
                ..self
            },
            CommentsAction::Reset => Self::default(),
        }
    }
}

/// Review operations.
#[derive(Clone)]
pub struct CommentsService {
    api: ApiClient,
    store: Store<CommentsState>,
    page_size: u32,
}

impl CommentsService {
    #[must_use]
    pub fn new(api: ApiClient, page_size: u32) -> Self {
        Self {
            api,
            store: Store::default(),
            page_size: page_size.max(1),
        }
    }

    #[must_use]
    pub const fn store(&self) -> &Store<CommentsState> {
        &self.store
    }

    #[must_use]
    pub fn state(&self) -> CommentsState {
        self.store.state()
    }

    /// Load the first page of reviews for `product_id`.
    ///
    /// Signed-in callers get the authenticated listing, which marks their
    /// own reviews.
    ///
    /// # Errors
    ///
    /// Returns the API error, which is also recorded in the state.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn load(&self, product_id: ProductId) -> Result<(), ApiError> {
        self.store.dispatch(CommentsAction::Started { product_id });
        let result = self.fetch(product_id, 0).await;
        self.settle(product_id, false, result)
    }

    /// Load the next page and append it.
    ///
    /// Returns `false` without a request when nothing is loaded, a request
    /// is in flight or the server reported no more pages.
    ///
    /// # Errors
    ///
    /// Returns the API error; loaded reviews are kept.
    #[instrument(skip(self))]
    pub async fn load_more(&self) -> Result<bool, ApiError> {
        let ready = self.store.with(|s| match s.product_id {
            Some(product_id) if !s.loading && s.has_more => {
                Some((product_id, s.offset_for_more()))
            }
            _ => None,
        });
        let Some((product_id, offset)) = ready else {
            return Ok(false);
        };

        self.store.dispatch(CommentsAction::Started { product_id });
        let result = self.fetch(product_id, offset).await;
        self.settle(product_id, true, result)?;
        Ok(true)
    }

    /// Submit a review, then reload the first page.
    ///
    /// A failed reload is logged and otherwise ignored.
    ///
    /// # Errors
    ///
    /// Returns the API error of the submission.
    #[instrument(skip(self, draft), fields(product_id = %product_id))]
    pub async fn add(&self, product_id: ProductId, draft: &CommentDraft) -> Result<(), ApiError> {
        self.store.dispatch(CommentsAction::Started { product_id });

        if let Err(e) = self.api.add_comment(product_id, draft).await {
            return Err(self.fail(Some(product_id), e));
        }
        tracing::info!("Review submitted");

        match self.fetch(product_id, 0).await {
            Ok(page) => self.store.dispatch(CommentsAction::PageLoaded {
                product_id,
                page,
                append: false,
            }),
            Err(e) => {
                tracing::warn!(error = %e, "Reloading reviews after submission failed");
                self.store.dispatch(CommentsAction::Settled);
            }
        }
        Ok(())
    }

    /// Edit one of the caller's reviews. The list changes only on success.
    ///
    /// # Errors
    ///
    /// Returns the API error, which is also recorded in the state.
    #[instrument(skip(self, draft), fields(rating_id = %id))]
    pub async fn update(&self, id: RatingId, draft: CommentDraft) -> Result<(), ApiError> {
        let product_id = self.begin_mutation();
        match self.api.update_comment(id, &draft).await {
            Ok(()) => {
                self.store.dispatch(CommentsAction::Updated { id, draft });
                Ok(())
            }
            Err(e) => Err(self.fail(product_id, e)),
        }
    }

    /// Delete one of the caller's reviews. The list changes only on success.
    ///
    /// # Errors
    ///
    /// Returns the API error, which is also recorded in the state.
    #[instrument(skip(self), fields(rating_id = %id))]
    pub async fn delete(&self, id: RatingId) -> Result<(), ApiError> {
        let product_id = self.begin_mutation();
        match self.api.delete_comment(id).await {
            Ok(()) => {
                self.store.dispatch(CommentsAction::Deleted { id });
                Ok(())
            }
            Err(e) => Err(self.fail(product_id, e)),
        }
    }

    pub fn clear_error(&self) {
        self.store.dispatch(CommentsAction::ClearError);
    }

    async fn fetch(&self, product_id: ProductId, offset: u64) -> Result<CommentPage, ApiError> {
        let auth = if self.api.has_token() {
            Auth::Bearer
        } else {
            Auth::None
        };
        self.api
            .comments(product_id, self.page_size, offset, auth)
            .await
    }

    fn settle(
        &self,
        product_id: ProductId,
        append: bool,
        result: Result<CommentPage, ApiError>,
    ) -> Result<(), ApiError> {
        match result {
            Ok(page) => {
                self.store.dispatch(CommentsAction::PageLoaded {
                    product_id,
                    page,
                    append,
                });
                Ok(())
            }
            Err(e) => Err(self.fail(Some(product_id), e)),
        }
    }

    /// Mark the loaded product busy and return it.
    fn begin_mutation(&self) -> Option<ProductId> {
        let product_id = self.store.with(|s| s.product_id)?;
        self.store.dispatch(CommentsAction::Started { product_id });
        Some(product_id)
    }

    /// Record `error` against `product_id` and hand it back. Without a
    /// product there is no list to attach it to.
    fn fail(&self, product_id: Option<ProductId>, error: ApiError) -> ApiError {
        if let Some(product_id) = product_id {
            self.store.dispatch(CommentsAction::Failed {
                product_id,
                message: error.to_string(),
            });
        }
        error
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use agora_core::Score;

    use super::*;

    fn comment(id: u64, own: bool) -> Comment {
        Comment {
            id: RatingId::new(id),
            author: "Ana".to_string(),
            body: Some(format!("Review {id}")),
            score: Score::new(4).unwrap(),
            is_own: own,
        }
    }

    fn page(ids: &[u64], has_more: bool, next_offset: Option<u64>) -> CommentPage {
        CommentPage {
            comments: ids.iter().map(|&id| comment(id, id == 2)).collect(),
            has_more,
            next_offset,
        }
    }

    fn loaded(ids: &[u64]) -> CommentsState {
        let product_id = ProductId::new(7);
        CommentsState::default()
            .reduce(CommentsAction::Started { product_id })
            .reduce(CommentsAction::PageLoaded {
                product_id,
                page: page(ids, false, None),
                append: false,
            })
    }

    fn ids(state: &CommentsState) -> Vec<u64> {
        state.comments.iter().map(|c| c.id.as_u64()).collect()
    }

    #[test]
    fn test_delete_removes_only_that_comment() {
        let state = loaded(&[1, 2, 3]).reduce(CommentsAction::Deleted {
            id: RatingId::new(2),
        });
        assert_eq!(ids(&state), vec![1, 3]);
    }

    #[test]
    fn test_failure_leaves_list_untouched() {
        let state = loaded(&[1, 2, 3]).reduce(CommentsAction::Failed {
            product_id: ProductId::new(7),
            message: "HTTP error 403".to_string(),
        });
        assert_eq!(ids(&state), vec![1, 2, 3]);
        assert_eq!(state.error.as_deref(), Some("HTTP error 403"));
    }

    #[test]
    fn test_failure_for_other_product_is_ignored() {
        let state = loaded(&[1, 2])
            .reduce(CommentsAction::Started {
                product_id: ProductId::new(8),
            })
            .reduce(CommentsAction::Failed {
                product_id: ProductId::new(7),
                message: "HTTP error 500".to_string(),
            });
        assert_eq!(state.product_id, Some(ProductId::new(8)));
        assert!(state.error.is_none());
        assert!(state.loading);
    }

    #[test]
    fn test_update_patches_in_place() {
        let draft = CommentDraft::new(Score::new(1).unwrap(), None);
        let state = loaded(&[1, 2]).reduce(CommentsAction::Updated {
            id: RatingId::new(2),
            draft,
        });
        assert_eq!(state.comments[1].score.get(), 1);
        assert_eq!(state.comments[1].body, None);
        assert_eq!(state.comments[0].body.as_deref(), Some("Review 1"));
    }

    #[test]
    fn test_paging_appends_and_tracks_offset() {
        let product_id = ProductId::new(7);
        let state = CommentsState::default()
            .reduce(CommentsAction::Started { product_id })
            .reduce(CommentsAction::PageLoaded {
                product_id,
                page: page(&[1, 2], true, Some(2)),
                append: false,
            });
        assert!(state.has_more);
        assert_eq!(state.offset_for_more(), 2);

        let state = state
            .reduce(CommentsAction::Started { product_id })
            .reduce(CommentsAction::PageLoaded {
                product_id,
                page: page(&[3], false, None),
                append: true,
            });
        assert_eq!(ids(&state), vec![1, 2, 3]);
        assert!(!state.has_more);
    }

    #[test]
    fn test_switching_product_drops_old_list_and_late_pages() {
        let state = loaded(&[1, 2]).reduce(CommentsAction::Started {
            product_id: ProductId::new(8),
        });
        assert!(state.comments.is_empty());

        let state = state.reduce(CommentsAction::PageLoaded {
            product_id: ProductId::new(7),
            page: page(&[9], false, None),
            append: false,
        });
        assert!(state.comments.is_empty());
        assert!(state.loading);
    }
}
