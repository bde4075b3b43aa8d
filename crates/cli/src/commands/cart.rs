//! Local cart commands.

use clap::Subcommand;

use agora_core::{Price, ProductId};
use agora_storefront::api::Product;
use agora_storefront::error::Result;
use agora_storefront::state::AppState;

use crate::output;

#[derive(Subcommand)]
pub enum CartAction {
    /// Show the cart
    List,
    /// Add units of a product
    Add {
        /// Product id
        id: u64,

        #[arg(short, long)]
        name: String,

        /// Unit price
        #[arg(short, long)]
        price: Price,

        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set the quantity of a line (0 removes it)
    Set { id: u64, quantity: u32 },
    /// Remove a line
    Remove { id: u64 },
    /// Empty the cart
    Clear,
}

pub fn run(state: &AppState, action: CartAction) -> Result<()> {
    let cart = state.cart();

    match action {
        CartAction::List => {}
        CartAction::Add {
            id,
            name,
            price,
            quantity,
        } => {
            let product = Product {
                id: ProductId::new(id),
                name,
                price,
                image: None,
                description: None,
                category_id: None,
            };
            cart.add(&product, quantity)?;
        }
        CartAction::Set { id, quantity } => {
            cart.set_quantity(ProductId::new(id), quantity)?;
        }
        CartAction::Remove { id } => {
            cart.remove(ProductId::new(id))?;
        }
        CartAction::Clear => cart.clear()?,
    }

    output::cart(&cart.items(), cart.subtotal());
    Ok(())
}
