//! Agora CLI - Drive the storefront client from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (password read from AGORA_PASSWORD if not given)
//! agora auth login -e ana@example.com
//!
//! # Search with filters, loading two pages
//! agora search phone --min-price 10 --category 4 --pages 2
//!
//! # Filter only, from a URL query string
//! agora search --params "min_price=10&sort=price-ascending"
//!
//! # Quick search suggestions
//! agora suggest pho
//!
//! # Toggle a favorite and list reviews
//! agora favorites toggle 12
//! agora comments list 12
//! ```
//!
//! Session, recent searches and cart persist in the state file
//! (`AGORA_STORAGE_PATH`, default `.agora/state.json`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agora_storefront::config::StorefrontConfig;
use agora_storefront::error::{AppError, Result};
use agora_storefront::state::AppState;

mod commands;
mod output;

#[derive(Parser)]
#[command(name = "agora")]
#[command(author, version, about = "Agora storefront client")]
struct Cli {
    /// Local state file (overrides `AGORA_STORAGE_PATH`)
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register, verify, sign in and out, recover passwords
    Auth {
        #[command(subcommand)]
        action: commands::auth::AuthAction,
    },
    /// Profile, password and orders of the signed-in user
    Account {
        #[command(subcommand)]
        action: commands::account::AccountAction,
    },
    /// Search or filter products
    Search(commands::search::SearchArgs),
    /// Quick-search suggestions for partial input
    Suggest {
        /// Text as typed so far
        text: String,
    },
    /// Recently submitted searches
    Recent {
        /// Forget the history
        #[arg(long)]
        clear: bool,
    },
    /// Favorite products
    Favorites {
        #[command(subcommand)]
        action: commands::favorites::FavoritesAction,
    },
    /// Product reviews
    Comments {
        #[command(subcommand)]
        action: commands::comments::CommentsAction,
    },
    /// Product categories
    Categories(commands::catalog::CategoriesArgs),
    /// Local shopping cart
    Cart {
        #[command(subcommand)]
        action: commands::cart::CartAction,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Loaded before tracing so Sentry can be initialized first
    let config = StorefrontConfig::from_env();
    let _sentry_guard = config.as_ref().ok().and_then(init_sentry);

    // Logs go to stderr so command output stays pipeable
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "agora_storefront=info,agora=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let result = match config {
        Ok(config) => run(cli, config).await,
        Err(e) => Err(AppError::from(e)),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            e.report();
            output::failure(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, mut config: StorefrontConfig) -> Result<()> {
    if let Some(path) = cli.state {
        config.storage_path = path;
    }

    let state = AppState::from_config(config)?;
    state.start();

    match cli.command {
        Commands::Auth { action } => commands::auth::run(&state, action).await,
        Commands::Account { action } => commands::account::run(&state, action).await,
        Commands::Search(args) => commands::search::search(&state, args).await,
        Commands::Suggest { text } => commands::search::suggest(&state, &text).await,
        Commands::Recent { clear } => commands::search::recent(&state, clear),
        Commands::Favorites { action } => commands::favorites::run(&state, action).await,
        Commands::Comments { action } => commands::comments::run(&state, action).await,
        Commands::Categories(args) => commands::catalog::categories(&state, args).await,
        Commands::Cart { action } => commands::cart::run(&state, action),
    }
}
