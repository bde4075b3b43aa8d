//! Review commands.

use clap::Subcommand;

use agora_core::{ProductId, RatingId, Score};
use agora_storefront::api::CommentDraft;
use agora_storefront::error::Result;
use agora_storefront::state::AppState;

use crate::output;

#[derive(Subcommand)]
pub enum CommentsAction {
    /// List reviews of a product
    List {
        /// Product id
        product: u64,

        /// Number of pages to load
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Review a product
    Add {
        /// Product id
        product: u64,

        /// Stars, 1 to 5
        #[arg(short, long)]
        score: i64,

        #[arg(short, long)]
        text: Option<String>,
    },
    /// Edit one of your reviews
    Update {
        /// Review id
        id: u64,

        /// Stars, 1 to 5
        #[arg(short, long)]
        score: i64,

        #[arg(short, long)]
        text: Option<String>,
    },
    /// Delete one of your reviews
    Delete {
        /// Review id
        id: u64,
    },
}

pub async fn run(state: &AppState, action: CommentsAction) -> Result<()> {
    let comments = state.comments();

    match action {
        CommentsAction::List { product, pages } => {
            comments.load(ProductId::new(product)).await?;
            for _ in 1..pages {
                if !comments.load_more().await? {
                    break;
                }
            }
            let loaded = comments.state();
            output::comments(&loaded.comments);
            if loaded.has_more {
                output::line("More reviews available; pass --pages to load them.");
            }
        }
        CommentsAction::Add {
            product,
            score,
            text,
        } => {
            let draft = CommentDraft::new(Score::new(score)?, text);
            comments.add(ProductId::new(product), &draft).await?;
            output::line("Review submitted.");
            output::comments(&comments.state().comments);
        }
        CommentsAction::Update { id, score, text } => {
            let draft = CommentDraft::new(Score::new(score)?, text);
            comments.update(RatingId::new(id), draft).await?;
            output::line(format!("Review #{id} updated."));
        }
        CommentsAction::Delete { id } => {
            comments.delete(RatingId::new(id)).await?;
            output::line(format!("Review #{id} deleted."));
        }
    }

    Ok(())
}
