//! Authentication commands.
//!
//! # Usage
//!
//! ```bash
//! agora auth register -n "Ana" -e ana@example.com --mobile 0700 --birth-date 1990-04-01 \
//!     --gender female --address "Main St 1"
//! agora auth verify -e ana@example.com -c 123456
//! agora auth login -e ana@example.com
//! agora auth forgot -e ana@example.com
//! agora auth reset -e ana@example.com -c 123456
//! agora auth logout
//! ```
//!
//! # Environment Variables
//!
//! - `AGORA_PASSWORD` - Password for `register` and `login`
//! - `AGORA_NEW_PASSWORD` - New password for `reset`

use chrono::NaiveDate;
use clap::Subcommand;
use secrecy::SecretString;

use agora_core::Email;
use agora_storefront::api::{PasswordReset, Registration};
use agora_storefront::error::Result;
use agora_storefront::services::LoginOutcome;
use agora_storefront::session::SessionStatus;
use agora_storefront::state::AppState;

use crate::output;

#[derive(Subcommand)]
pub enum AuthAction {
    /// Create an account; a verification code is emailed
    Register {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: Email,

        #[arg(long)]
        mobile: String,

        /// Birth date (YYYY-MM-DD)
        #[arg(long)]
        birth_date: NaiveDate,

        #[arg(long)]
        gender: String,

        #[arg(long)]
        address: String,

        #[arg(long, env = "AGORA_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Verify an account with the emailed code and sign in
    Verify {
        #[arg(short, long)]
        email: Email,

        #[arg(short, long)]
        code: String,
    },
    /// Sign in
    Login {
        #[arg(short, long)]
        email: Email,

        #[arg(long, env = "AGORA_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Email a password recovery code
    Forgot {
        #[arg(short, long)]
        email: Email,
    },
    /// Set a new password with a recovery code
    Reset {
        #[arg(short, long)]
        email: Email,

        #[arg(short, long)]
        code: String,

        #[arg(long, env = "AGORA_NEW_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign out and forget the local session
    Logout,
    /// Show the current session
    Status,
}

pub async fn run(state: &AppState, action: AuthAction) -> Result<()> {
    let auth = state.auth();

    match action {
        AuthAction::Register {
            name,
            email,
            mobile,
            birth_date,
            gender,
            address,
            password,
        } => {
            let form = Registration {
                name,
                mobile,
                birth_date,
                email,
                password: SecretString::from(password.clone()),
                password_confirmation: SecretString::from(password),
                gender,
                address,
            };
            auth.register(&form).await?;
            output::line(format!(
                "Registered. Check {} for the verification code.",
                form.email
            ));
        }
        AuthAction::Verify { email, code } => {
            let user = auth.verify(&email, &code).await?;
            output::line(format!("Verified and signed in as {}.", user.name));
        }
        AuthAction::Login { email, password } => {
            match auth.login(&email, &SecretString::from(password)).await? {
                LoginOutcome::Authenticated(user) => {
                    output::line(format!("Signed in as {}.", user.name));
                }
                LoginOutcome::VerificationRequired { email } => {
                    output::line(format!(
                        "Account not verified yet. Run `agora auth verify -e {email} -c <code>`."
                    ));
                }
            }
        }
        AuthAction::Forgot { email } => {
            auth.forgot_password(&email).await?;
            output::line(format!("Recovery code sent to {email}."));
        }
        AuthAction::Reset {
            email,
            code,
            password,
        } => {
            let form = PasswordReset {
                email,
                recovery_code: code,
                password: SecretString::from(password.clone()),
                confirm_password: SecretString::from(password),
            };
            auth.reset_password(&form).await?;
            output::line("Password updated. You can sign in now.");
        }
        AuthAction::Logout => {
            state.logout().await;
            output::line("Signed out.");
        }
        AuthAction::Status => match state.session().state().status {
            SessionStatus::Authenticated { user } => output::user(&user),
            SessionStatus::VerificationPending { email } => {
                output::line(format!("Waiting for verification of {email}."));
            }
            SessionStatus::Anonymous | SessionStatus::Uninitialized => {
                output::line("Not signed in.");
            }
        },
    }

    Ok(())
}
