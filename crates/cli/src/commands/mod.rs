//! Command implementations.

pub mod cart;
pub mod wishlist;

use crowns_collars_core::{BearerToken, CredentialError};
use crowns_collars_storefront::{
    CartWishlistStore, HttpCartService, LoadOutcome, RemoteError, StoreError, StorefrontConfig,
};
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// The `--token` value is not a usable bearer token.
    #[error("Invalid token: {0}")]
    Credential(#[from] CredentialError),

    /// The HTTP client could not be built.
    #[error("Client error: {0}")]
    Client(#[from] RemoteError),

    /// The cart service did not apply the operation.
    #[error("{0}")]
    Store(#[from] StoreError),
}

/// A loaded store plus the credential to act with.
pub struct Session {
    pub store: CartWishlistStore<HttpCartService>,
    pub token: Option<BearerToken>,
}

impl Session {
    /// Build the store and load the cart and wishlist.
    ///
    /// `token_override` wins over the configured token.
    ///
    /// # Errors
    ///
    /// Returns error if the token is malformed or the client fails to build.
    /// Load failures are logged, not returned.
    pub async fn open(
        config: &StorefrontConfig,
        token_override: Option<&str>,
    ) -> Result<Self, CliError> {
        let token = match token_override {
            Some(raw) => Some(BearerToken::parse(raw)?),
            None => BearerToken::from_session(config.auth_token()),
        };

        if token.is_none() {
            tracing::warn!("No session token; cart operations will be refused");
        }

        let service = HttpCartService::new(config)?;
        let store = CartWishlistStore::new(service, config.request_timeout);

        let report = store.load(token.as_ref()).await;
        log_outcome("cart", &report.cart);
        log_outcome("wishlist", &report.wishlist);

        Ok(Self { store, token })
    }
}

fn log_outcome(collection: &str, outcome: &LoadOutcome) {
    match outcome {
        LoadOutcome::Skipped => tracing::debug!(collection, "Not loaded (signed out)"),
        LoadOutcome::Loaded { count } => tracing::debug!(collection, count, "Loaded"),
        LoadOutcome::Failed(e) => tracing::warn!(collection, error = %e, "Failed to load"),
    }
}
