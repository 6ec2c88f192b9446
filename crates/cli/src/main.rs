//! Shopfront CLI - Cart and wishlist from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (password from SHOPFRONT_PASSWORD or -p)
//! shop login -e ada@example.com
//!
//! # Cart
//! shop cart add 64f1c0ffee -q 2
//! shop cart update 64f1c0ffee 1
//! shop cart remove 64f1c0ffee
//! shop cart show
//!
//! # Wishlist
//! shop wishlist add 64f1c0ffee
//! shop wishlist show
//!
//! # Sign out (clears cart and wishlist)
//! shop logout
//! ```
//!
//! # Commands
//!
//! - `login` / `logout` - Manage the signed-in session
//! - `cart` - Show and change the cart
//! - `wishlist` - Show and change the wishlist
//!
//! Session state lives in `SHOPFRONT_SESSION_DIR`; see
//! [`StorefrontConfig`] for the full list of environment variables.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use secrecy::SecretString;
use sentry::integrations::tracing as sentry_tracing;
use shopfront_core::ProductId;
use shopfront_storefront::{FileStorage, ShopSession, StorefrontConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "shop")]
#[command(author, version, about = "Shopfront cart and wishlist")]
struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true, env = "SHOPFRONT_LOG_JSON")]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in to the backend
    Login {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long, env = "SHOPFRONT_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign out and clear the cart and wishlist
    Logout,
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage the wishlist
    Wishlist {
        #[command(subcommand)]
        action: WishlistAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show cart lines and totals
    Show,
    /// Add a product
    Add {
        /// Product ID
        id: String,

        /// Quantity to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set the quantity of a product
    Update {
        /// Product ID
        id: String,

        /// New quantity
        quantity: u32,
    },
    /// Remove a product
    Remove {
        /// Product ID
        id: String,
    },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum WishlistAction {
    /// Show saved products
    Show,
    /// Save a product
    Add {
        /// Product ID
        id: String,
    },
    /// Remove a saved product
    Remove {
        /// Product ID
        id: String,
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

    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR => sentry_tracing::EventFilter::Event,
        tracing::Level::WARN | tracing::Level::INFO => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

/// Initialize tracing with `EnvFilter`, plain or JSON output, and Sentry.
fn init_tracing(json: bool) {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "shopfront_cli=info,shopfront_storefront=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing(cli.json);
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(2);
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);
    init_tracing(cli.json);

    if let Err(e) = run(cli.command, &config).await {
        sentry::capture_error(&e);
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: &StorefrontConfig) -> shopfront_storefront::Result<()> {
    let storage = FileStorage::new(&config.session_dir);
    let mut shop = ShopSession::open(config, storage)?;

    match command {
        Commands::Login { email, password } => {
            commands::auth::login(&mut shop, &email, &SecretString::from(password)).await?;
        }
        Commands::Logout => commands::auth::logout(&mut shop),
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&shop),
            CartAction::Add { id, quantity } => {
                commands::cart::add(&mut shop, &ProductId::new(id), quantity).await?;
            }
            CartAction::Update { id, quantity } => {
                commands::cart::update(&mut shop, &ProductId::new(id), quantity).await?;
            }
            CartAction::Remove { id } => {
                commands::cart::remove(&mut shop, &ProductId::new(id)).await?;
            }
            CartAction::Clear => commands::cart::clear(&mut shop),
        },
        Commands::Wishlist { action } => match action {
            WishlistAction::Show => commands::wishlist::show(&mut shop).await?,
            WishlistAction::Add { id } => {
                commands::wishlist::add(&mut shop, &ProductId::new(id)).await?;
            }
            WishlistAction::Remove { id } => {
                commands::wishlist::remove(&mut shop, &ProductId::new(id)).await?;
            }
        },
    }
    Ok(())
}
