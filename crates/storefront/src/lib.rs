//! Crowns & Collars Storefront - cart and wishlist reconciliation engine.
//!
//! The storefront page keeps an in-memory view of the visitor's cart and
//! wishlist. This crate owns that view and keeps it consistent with the remote
//! cart service across asynchronous, possibly failing calls.
//!
//! # Architecture
//!
//! - [`store::CartWishlistStore`] holds the local mirror and exposes the
//!   cart/wishlist operations the page calls.
//! - [`remote::RemoteCartService`] is the network boundary;
//!   [`remote::HttpCartService`] implements it over HTTP with `reqwest`.
//! - Local state changes only after the remote confirms success, and
//!   mutations for the same product are serialized.
//! - Every outcome is published as a [`notify::StoreEvent`] so the page can
//!   show a toast and refresh the cart badge.
//!
//! # Example
//!
//! ```rust,ignore
//! use crowns_collars_core::{BearerToken, ProductId};
//! use crowns_collars_storefront::{CartWishlistStore, HttpCartService, StorefrontConfig};
//!
//! let config = StorefrontConfig::from_env()?;
//! let service = HttpCartService::new(&config)?;
//! let store = CartWishlistStore::new(service, config.request_timeout);
//!
//! let token = BearerToken::from_session(session_token.as_deref());
//! store.load(token.as_ref()).await;
//! store.add_to_cart(ProductId::new(42), token.as_ref()).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod notify;
pub mod remote;
pub mod store;
pub mod views;

#[cfg(test)]
pub mod testing;

pub use config::StorefrontConfig;
pub use error::{ErrorKind, StoreError};
pub use notify::{Notification, NotificationLevel, Operation, StoreEvent};
pub use remote::{HttpCartService, RemoteCartService, RemoteError, WishlistAction};
pub use store::{CartWishlistStore, LoadOutcome, LoadReport};
pub use views::{CartLineView, CartSummary, ProductCardView};
