//! Crowns & Collars CLI - inspect and edit a cart from the terminal.
//!
//! Every command loads the cart and wishlist for the session token, runs one
//! operation through the same store the storefront page uses, and logs the
//! outcome.
//!
//! # Usage
//!
//! ```bash
//! # Show the cart and wishlist
//! cc-cli show
//!
//! # Add one unit of product 42
//! cc-cli add 42
//!
//! # Change a line's quantity
//! cc-cli increment 42
//! cc-cli decrement 42
//!
//! # Save or unsave a product
//! cc-cli wishlist 42
//!
//! # Use a different session token
//! cc-cli --token "$TOKEN" show
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_API_BASE_URL` - Cart service base URL (required)
//! - `STOREFRONT_AUTH_TOKEN` - Session token, unless `--token` is given
//! - `STOREFRONT_REQUEST_TIMEOUT_SECS` - Per-request timeout (default 10)
//! - `SENTRY_DSN` / `SENTRY_ENVIRONMENT` - Error tracking

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use crowns_collars_core::{ProductId, QuantityChange};
use crowns_collars_storefront::StorefrontConfig;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::Session;

#[derive(Parser)]
#[command(name = "cc-cli")]
#[command(author, version, about = "Crowns & Collars cart tools")]
struct Cli {
    /// Session token (overrides `STOREFRONT_AUTH_TOKEN`)
    #[arg(long, global = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the cart and wishlist
    Show,
    /// Add one unit of a product to the cart
    Add {
        /// Product ID
        product_id: ProductId,
    },
    /// Increase a cart line by one
    Increment {
        /// Product ID
        product_id: ProductId,
    },
    /// Decrease a cart line by one, removing it at zero
    Decrement {
        /// Product ID
        product_id: ProductId,
    },
    /// Save a product to the wishlist, or remove it if already saved
    Wishlist {
        /// Product ID
        product_id: ProductId,
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

fn init_tracing() {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "crowns_collars_storefront=info,cc_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
#[allow(clippy::print_stderr)] // tracing is not up until config loads
async fn main() {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(2);
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);
    init_tracing();

    if let Err(e) = run(cli, &config).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &StorefrontConfig) -> Result<(), commands::CliError> {
    let session = Session::open(config, cli.token.as_deref()).await?;

    match cli.command {
        Commands::Show => commands::cart::show(&session),
        Commands::Add { product_id } => commands::cart::add(&session, product_id).await?,
        Commands::Increment { product_id } => {
            commands::cart::change(&session, product_id, QuantityChange::Increment).await?;
        }
        Commands::Decrement { product_id } => {
            commands::cart::change(&session, product_id, QuantityChange::Decrement).await?;
        }
        Commands::Wishlist { product_id } => {
            commands::wishlist::toggle(&session, product_id).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_product_id_and_token() {
        let cli = Cli::try_parse_from(["cc-cli", "decrement", "42", "--token", "abc"])
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(cli.token.as_deref(), Some("abc"));
        assert!(matches!(
            cli.command,
            Commands::Decrement { product_id } if product_id == ProductId::new(42)
        ));
    }

    #[test]
    fn test_rejects_non_numeric_product_id() {
        assert!(Cli::try_parse_from(["cc-cli", "add", "collar"]).is_err());
    }
}
