//! Domain types exchanged with the storefront API.
//!
//! The backend is not consistent about envelopes: some endpoints wrap the
//! payload in `data`, some return it bare, and paginated lists come in more
//! than one shape. The types here absorb those differences so the rest of
//! the crate sees one representation.

use agora_core::{CategoryId, Email, FavoriteId, OrderId, Price, ProductId, RatingId, Score, UserId};
use serde::{Deserialize, Serialize};

// =============================================================================
// Envelope
// =============================================================================

/// A payload that may or may not be wrapped in `{"data": ...}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    pub(crate) fn into_inner(self) -> T {
        match self {
            Self::Wrapped { data } | Self::Bare(data) => data,
        }
    }
}

// =============================================================================
// User Types
// =============================================================================

/// Profile of a storefront customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

// =============================================================================
// Product Types
// =============================================================================

/// A product as listed in search results, favorites and carts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    #[serde(alias = "title")]
    pub name: String,
    pub price: Price,
    #[serde(default, alias = "image_url", skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
}

/// One page of search or filter results.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "RawProductPage")]
pub struct ProductPage {
    /// Products on this page, in server order.
    pub items: Vec<Product>,
    /// Total number of matches across all pages, when reported.
    pub total: Option<u64>,
    /// Number of the last page, when reported.
    pub last_page: Option<u32>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawProductPage {
    Nested { data: FlatProductPage },
    Flat(FlatProductPage),
    List(Vec<Product>),
}

#[derive(Deserialize)]
struct FlatProductPage {
    #[serde(alias = "data", alias = "products")]
    items: Vec<Product>,
    #[serde(default)]
    total: Option<u64>,
    #[serde(default)]
    last_page: Option<u32>,
}

impl From<RawProductPage> for ProductPage {
    fn from(raw: RawProductPage) -> Self {
        match raw {
            RawProductPage::Nested { data: page } | RawProductPage::Flat(page) => Self {
                items: page.items,
                total: page.total,
                last_page: page.last_page,
            },
            RawProductPage::List(items) => Self {
                items,
                total: None,
                last_page: None,
            },
        }
    }
}

impl ProductPage {
    /// Whether another page exists after `page`, given `loaded` items so far
    /// and the requested `page_size`.
    ///
    /// Prefers `last_page`, then `total`; without either, a full page means
    /// there may be more.
    #[must_use]
    pub fn has_more_after(&self, page: u32, loaded: usize, page_size: u32) -> bool {
        if let Some(last) = self.last_page {
            return page < last;
        }
        if let Some(total) = self.total {
            return (loaded as u64) < total;
        }
        !self.items.is_empty() && self.items.len() >= page_size as usize
    }
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    #[serde(alias = "title")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<CategoryId>,
}

// =============================================================================
// Favorite Types
// =============================================================================

/// A user-scoped bookmark referencing a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Favorite {
    pub id: FavoriteId,
    pub product: Product,
}

/// Response to adding a favorite. Only the id is of interest, and it may be absent.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct AddedFavorite {
    #[serde(default)]
    pub id: Option<FavoriteId>,
}

// =============================================================================
// Comment Types
// =============================================================================

/// A product review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(alias = "rating_id")]
    pub id: RatingId,
    #[serde(default, alias = "user_name", alias = "author_name")]
    pub author: String,
    #[serde(default, alias = "comment")]
    pub body: Option<String>,
    #[serde(alias = "rating")]
    pub score: Score,
    /// Whether the current session wrote this review.
    #[serde(default, alias = "is_owner", alias = "owner")]
    pub is_own: bool,
}

/// One page of reviews.
///
/// Absent pagination fields mean there are no more pages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "RawCommentPage")]
pub struct CommentPage {
    pub comments: Vec<Comment>,
    pub has_more: bool,
    pub next_offset: Option<u64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCommentPage {
    Flat(PagedComments),
    Nested { data: PagedComments },
    List(Vec<Comment>),
}

#[derive(Deserialize)]
struct PagedComments {
    #[serde(alias = "data", alias = "ratings")]
    comments: Vec<Comment>,
    #[serde(default)]
    has_more: Option<bool>,
    #[serde(default)]
    next_offset: Option<u64>,
}

impl From<RawCommentPage> for CommentPage {
    fn from(raw: RawCommentPage) -> Self {
        match raw {
            RawCommentPage::Flat(page) | RawCommentPage::Nested { data: page } => Self {
                comments: page.comments,
                has_more: page.has_more.unwrap_or(false),
                next_offset: page.next_offset,
            },
            RawCommentPage::List(comments) => Self {
                comments,
                has_more: false,
                next_offset: None,
            },
        }
    }
}

// =============================================================================
// Order Types
// =============================================================================

/// A placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    #[serde(default)]
    pub status: String,
    #[serde(alias = "total_price")]
    pub total: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, alias = "products")]
    pub items: Vec<OrderItem>,
}

/// A line of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,
    #[serde(alias = "product_name")]
    pub name: String,
    pub quantity: u32,
    pub price: Price,
}
