//! Account commands for the signed-in user.

use clap::Subcommand;
use secrecy::SecretString;

use agora_core::OrderId;
use agora_storefront::api::{PasswordChange, ProfileUpdate};
use agora_storefront::error::{AppError, Result};
use agora_storefront::state::AppState;

use crate::output;

#[derive(Subcommand)]
pub enum AccountAction {
    /// Show the profile
    Profile,
    /// Change profile fields
    Update {
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        mobile: Option<String>,

        /// Birth date (YYYY-MM-DD)
        #[arg(long)]
        birth_date: Option<String>,

        #[arg(long)]
        gender: Option<String>,

        #[arg(long)]
        address: Option<String>,
    },
    /// Change the password
    Password {
        #[arg(long, env = "AGORA_PASSWORD", hide_env_values = true)]
        current: String,

        #[arg(long, env = "AGORA_NEW_PASSWORD", hide_env_values = true)]
        new: String,
    },
    /// List orders
    Orders,
    /// Show one order
    Order { id: u64 },
}

pub async fn run(state: &AppState, action: AccountAction) -> Result<()> {
    let account = state.account();

    match action {
        AccountAction::Profile => output::user(&account.profile().await?),
        AccountAction::Update {
            name,
            mobile,
            birth_date,
            gender,
            address,
        } => {
            let update = ProfileUpdate {
                name,
                mobile,
                birth_date,
                gender,
                address,
            };
            if update.is_empty() {
                return Err(AppError::InvalidInput(
                    "nothing to update; pass at least one field".to_string(),
                ));
            }
            output::user(&account.update_profile(&update).await?);
        }
        AccountAction::Password { current, new } => {
            let form = PasswordChange {
                current_password: SecretString::from(current),
                password: SecretString::from(new.clone()),
                password_confirmation: SecretString::from(new),
            };
            account.change_password(&form).await?;
            output::line("Password changed.");
        }
        AccountAction::Orders => output::orders(&account.orders().await?),
        AccountAction::Order { id } => output::order(&account.order(OrderId::new(id)).await?),
    }

    Ok(())
}
