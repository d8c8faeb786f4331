//! Core types for Crowns & Collars.
//!
//! This module provides type-safe wrappers for cart and wishlist concepts.

pub mod cart;
pub mod credential;
pub mod id;
pub mod price;
pub mod product;
pub mod wishlist;

pub use cart::{Cart, CartLine, Quantity, QuantityChange, QuantityError};
pub use credential::{BearerToken, CredentialError};
pub use id::*;
pub use price::{CurrencyCode, Price};
pub use product::Product;
pub use wishlist::{Wishlist, WishlistEntry};
