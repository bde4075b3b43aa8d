//! Favorites commands.

use clap::Subcommand;

use agora_core::{Price, ProductId};
use agora_storefront::api::Product;
use agora_storefront::error::Result;
use agora_storefront::favorites::ToggleOutcome;
use agora_storefront::state::AppState;

use crate::output;

#[derive(Subcommand)]
pub enum FavoritesAction {
    /// List favorite products
    List,
    /// Add a product to the favorites, or remove it if already there
    Toggle {
        /// Product id
        id: u64,
    },
}

pub async fn run(state: &AppState, action: FavoritesAction) -> Result<()> {
    let favorites = state.favorites();
    favorites.load().await?;

    match action {
        FavoritesAction::List => output::products(&favorites.state().items()),
        FavoritesAction::Toggle { id } => {
            let product_id = ProductId::new(id);
            // Only the id is sent; a known favorite keeps its listing details
            let product = favorites
                .state()
                .confirmed()
                .iter()
                .find(|entry| entry.product.id == product_id)
                .map_or_else(
                    || Product {
                        id: product_id,
                        name: format!("Product {id}"),
                        price: Price::ZERO,
                        image: None,
                        description: None,
                        category_id: None,
                    },
                    |entry| entry.product.clone(),
                );

            match favorites.toggle(product).await? {
                ToggleOutcome::Added => output::line(format!("Added product {id} to favorites.")),
                ToggleOutcome::Removed => {
                    output::line(format!("Removed product {id} from favorites."));
                }
                ToggleOutcome::Ignored => output::line("A change for this product is pending."),
            }
        }
    }

    Ok(())
}
