//! Category listing command.

use clap::Args;

use agora_core::CategoryId;
use agora_storefront::error::Result;
use agora_storefront::state::AppState;

use crate::output;

#[derive(Args)]
pub struct CategoriesArgs {
    /// List the children of this category instead of the top level
    #[arg(long)]
    parent: Option<u64>,

    /// Locale (defaults to `AGORA_LOCALE`)
    #[arg(long)]
    locale: Option<String>,
}

pub async fn categories(state: &AppState, args: CategoriesArgs) -> Result<()> {
    let catalog = state.catalog();
    let locale = args.locale.as_deref();

    let categories = match args.parent {
        Some(parent) => catalog.sub_categories(CategoryId::new(parent), locale).await?,
        None => catalog.main_categories(locale).await?,
    };

    output::categories(&categories);
    Ok(())
}
