//! Remote cart service boundary.
//!
//! # Architecture
//!
//! - The remote service is the source of truth for cart and wishlist contents
//! - [`RemoteCartService`] abstracts the transport so the store can be driven
//!   by an in-memory double in tests
//! - [`HttpCartService`] talks to the storefront's JSON API with `reqwest`
//! - Every response is decoded into a validated envelope; anything that does
//!   not match the contract is a [`RemoteError::Malformed`]
//!
//! # Endpoints
//!
//! | operation | request |
//! |-----------|---------|
//! | fetch cart | `GET api/cart` |
//! | fetch wishlist | `GET api/wishlist` |
//! | add to cart | `POST api/cart/add { product_id, quantity }` |
//! | remove line | `POST api/cart/remove { product_id }` |
//! | change quantity | `POST api/cart/update { product_id, change }` |
//! | wishlist | `POST api/wishlist/{add,remove} { product_id }` |

mod envelope;
mod http;

pub use envelope::{ActionEnvelope, ItemsEnvelope};
pub use http::HttpCartService;

use std::time::Duration;

use async_trait::async_trait;
use crowns_collars_core::{BearerToken, Cart, ProductId, Quantity, QuantityChange, Wishlist};
use thiserror::Error;

/// Errors that can occur when calling the remote cart service.
#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    /// The service answered with `success: false`.
    #[error("Rejected by cart service: {}", .message.as_deref().unwrap_or("(no message)"))]
    Rejected {
        /// Human-readable reason, when the service supplied one.
        message: Option<String>,
    },

    /// Request failed before a response was obtained.
    #[error("HTTP error: {0}")]
    Transport(String),

    /// The call did not finish within the configured timeout.
    #[error("Request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// Non-success status without a readable envelope.
    #[error("Unexpected HTTP status {0}")]
    UnexpectedStatus(u16),

    /// Rate limited by the service.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// The body did not match the endpoint's response contract.
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl RemoteError {
    /// Whether the request never produced a usable envelope.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Timeout(_) | Self::UnexpectedStatus(_) | Self::RateLimited(_)
        )
    }

    /// Message supplied by the service for a rejected request.
    #[must_use]
    pub fn remote_message(&self) -> Option<&str> {
        match self {
            Self::Rejected { message } => message.as_deref(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Which side of the wishlist endpoint pair to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WishlistAction {
    Add,
    Remove,
}

impl WishlistAction {
    /// Action that flips the current membership.
    #[must_use]
    pub const fn toggling(currently_wishlisted: bool) -> Self {
        if currently_wishlisted {
            Self::Remove
        } else {
            Self::Add
        }
    }

    /// API path for this action.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Add => "api/wishlist/add",
            Self::Remove => "api/wishlist/remove",
        }
    }
}

/// Operations offered by the remote cart service.
///
/// Every call is authorized by the caller's bearer token. Implementations
/// report `success: false` as [`RemoteError::Rejected`] regardless of the
/// transport status.
#[async_trait]
pub trait RemoteCartService: Send + Sync {
    /// Fetch the full cart snapshot.
    async fn fetch_cart(&self, token: &BearerToken) -> Result<Cart, RemoteError>;

    /// Fetch the full wishlist snapshot.
    async fn fetch_wishlist(&self, token: &BearerToken) -> Result<Wishlist, RemoteError>;

    /// Add `quantity` units of a product; the service merges additively.
    async fn add_to_cart(
        &self,
        token: &BearerToken,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<(), RemoteError>;

    /// Remove a product's line entirely.
    async fn remove_from_cart(
        &self,
        token: &BearerToken,
        product_id: ProductId,
    ) -> Result<(), RemoteError>;

    /// Adjust a line's quantity by one unit.
    async fn update_cart(
        &self,
        token: &BearerToken,
        product_id: ProductId,
        change: QuantityChange,
    ) -> Result<(), RemoteError>;

    /// Add or remove a wishlist entry.
    async fn update_wishlist(
        &self,
        token: &BearerToken,
        product_id: ProductId,
        action: WishlistAction,
    ) -> Result<(), RemoteError>;
}
