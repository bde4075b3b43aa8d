//! Local shopping cart.
//!
//! The cart lives entirely on this device under the `cart` key and is
//! written through after every change.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use agora_core::{Price, ProductId};

use crate::api::Product;
use crate::storage::{self, Storage, StorageError, keys};

/// A cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub name: String,
    /// Unit price at the time the product was added.
    pub price: Price,
    pub quantity: u32,
    #[serde(default)]
    pub image: Option<String>,
}

impl CartItem {
    /// Price of the whole line.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price * self.quantity
    }
}

/// Durable cart contents.
pub struct Cart {
    storage: Arc<dyn Storage>,
    items: Mutex<Vec<CartItem>>,
}

impl Cart {
    /// Load the stored cart. An unreadable cart starts empty.
    #[must_use]
    pub fn load(storage: Arc<dyn Storage>) -> Self {
        let items: Vec<CartItem> = storage::read_json(storage.as_ref(), keys::CART)
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Ignoring unreadable cart");
                None
            })
            .unwrap_or_default();

        Self {
            storage,
            items: Mutex::new(items),
        }
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn items(&self) -> Vec<CartItem> {
        self.lock().clone()
    }

    /// Sum of all line totals.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.lock().iter().map(CartItem::line_total).sum()
    }

    /// Number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lock()
            .iter()
            .map(|item| item.quantity)
            .fold(0, u32::saturating_add)
    }

    /// Add `quantity` units of `product`. An existing line is incremented.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted.
    pub fn add(&self, product: &Product, quantity: u32) -> Result<Vec<CartItem>, StorageError> {
        if quantity == 0 {
            return Ok(self.items());
        }

        self.update(|items| {
            if let Some(line) = items.iter_mut().find(|i| i.product_id == product.id) {
                line.quantity = line.quantity.saturating_add(quantity);
            } else {
                items.push(CartItem {
                    product_id: product.id,
                    name: product.name.clone(),
                    price: product.price,
                    quantity,
                    image: product.image.clone(),
                });
            }
        })
    }

    /// Set the quantity of a line. Zero removes it; unknown products are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted.
    pub fn set_quantity(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Vec<CartItem>, StorageError> {
        self.update(|items| {
            if quantity == 0 {
                items.retain(|i| i.product_id != product_id);
            } else if let Some(line) = items.iter_mut().find(|i| i.product_id == product_id) {
                line.quantity = quantity;
            }
        })
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted.
    pub fn remove(&self, product_id: ProductId) -> Result<Vec<CartItem>, StorageError> {
        self.set_quantity(product_id, 0)
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored cart cannot be removed.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.lock().clear();
        self.storage.remove(keys::CART)
    }

    fn update(
        &self,
        change: impl FnOnce(&mut Vec<CartItem>),
    ) -> Result<Vec<CartItem>, StorageError> {
        let mut items = self.lock();
        change(&mut items);
        storage::write_json(self.storage.as_ref(), keys::CART, &*items)?;
        Ok(items.clone())
    }

    fn lock(&self) -> MutexGuard<'_, Vec<CartItem>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn product(id: u64, minor: i64) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            price: Price::from_minor(minor),
            image: None,
            description: None,
            category_id: None,
        }
    }

    #[test]
    fn test_add_merges_lines() {
        let cart = Cart::load(Arc::new(MemoryStorage::new()));
        cart.add(&product(1, 1000), 1).unwrap();
        cart.add(&product(2, 250), 2).unwrap();
        let items = cart.add(&product(1, 1000), 2).unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].quantity, 3);
        assert_eq!(cart.item_count(), 5);
        assert_eq!(cart.subtotal(), Price::from_minor(3500));
    }

    #[test]
    fn test_item_count_saturates() {
        let cart = Cart::load(Arc::new(MemoryStorage::new()));
        cart.add(&product(1, 100), u32::MAX - 1).unwrap();
        cart.add(&product(2, 100), 5).unwrap();

        assert_eq!(cart.item_count(), u32::MAX);
    }

    #[test]
    fn test_zero_quantity_removes_line() {
        let cart = Cart::load(Arc::new(MemoryStorage::new()));
        cart.add(&product(1, 1000), 1).unwrap();
        cart.add(&product(2, 250), 1).unwrap();

        let items = cart.set_quantity(ProductId::new(1), 0).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product_id, ProductId::new(2));

        let items = cart.set_quantity(ProductId::new(2), 4).unwrap();
        assert_eq!(items[0].quantity, 4);

        assert!(cart.remove(ProductId::new(2)).unwrap().is_empty());
        assert_eq!(cart.subtotal(), Price::ZERO);
    }

    #[test]
    fn test_cart_persists_across_loads() {
        let storage = Arc::new(MemoryStorage::new());
        let cart = Cart::load(storage.clone());
        cart.add(&product(1, 1999), 2).unwrap();

        let reloaded = Cart::load(storage.clone());
        assert_eq!(reloaded.items(), cart.items());

        reloaded.clear().unwrap();
        assert!(Cart::load(storage).items().is_empty());
    }
}
