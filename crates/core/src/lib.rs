//! Crowns & Collars Core - Shared cart and wishlist types.
//!
//! This crate provides the domain types used by the storefront engine and
//! its tools:
//! - `storefront` - Cart/wishlist reconciliation engine and remote client
//! - `cli` - Command-line driver for a signed-in session
//!
//! # Architecture
//!
//! The core crate contains only types and pure state transitions - no I/O,
//! no HTTP clients. Every invariant of the local cart mirror (one line per
//! product, quantities strictly positive, wishlist as a set) is enforced here
//! so that the engine cannot construct an invalid state.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, quantities, cart, wishlist, products, prices and credentials

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
